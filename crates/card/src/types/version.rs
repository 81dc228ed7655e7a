use std::str::FromStr;

use derive_more::Display;

use crate::error::Error;

/// Card firmware version (major.minor).
///
/// The wire form is a UTF-8 string such as `2.33`, possibly with a trailing
/// revision suffix (`2.33d`) which does not participate in ordering.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[display("{major}.{minor}")]
pub struct FirmwareVersion {
    /// Major version number.
    pub major: u8,
    /// Minor version number.
    pub minor: u8,
}

impl FirmwareVersion {
    /// Create a version from its parts.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Whether this firmware implements the given capability.
    ///
    /// Gating lives in one capability table so serialization code never
    /// compares raw version numbers.
    pub fn supports(&self, capability: CardCapability) -> bool {
        *self >= capability.available_since()
    }
}

impl FromStr for FirmwareVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedFirmwareVersion(s.to_owned());

        let (major, rest) = s.split_once('.').ok_or_else(malformed)?;
        let minor_digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if minor_digits.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            major: major.parse().map_err(|_| malformed())?,
            minor: minor_digits.parse().map_err(|_| malformed())?,
        })
    }
}

/// Firmware-gated protocol capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardCapability {
    /// The card can additionally sign its own attestation of wallet
    /// ownership (`PublicKeyChallenge` handling).
    WalletOwnershipConfirmation,
    /// The card reports a per-wallet command execution counter.
    ExecutionCounter,
}

impl CardCapability {
    /// First firmware version implementing this capability.
    pub const fn available_since(self) -> FirmwareVersion {
        match self {
            Self::WalletOwnershipConfirmation => FirmwareVersion::new(2, 1),
            Self::ExecutionCounter => FirmwareVersion::new(2, 19),
        }
    }
}
