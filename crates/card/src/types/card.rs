use std::fmt;

use bytes::Bytes;

use crate::error::Error;

use super::{EllipticCurve, FirmwareVersion};

/// Card identifier, raw bytes rendered as upper-case hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardId(Bytes);

impl CardId {
    /// Wrap raw identifier bytes as received from the card.
    pub const fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Raw identifier bytes as sent on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(&self.0))
    }
}

/// Lifecycle status of a wallet slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WalletStatus {
    /// Slot exists but holds no key.
    Empty = 1,
    /// Slot holds a usable key.
    Loaded = 2,
    /// Key was destroyed; the slot cannot be reused.
    Purged = 3,
}

impl WalletStatus {
    /// Wire code, also used inside card-signed messages.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WalletStatus {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Empty),
            2 => Ok(Self::Loaded),
            3 => Ok(Self::Purged),
            _ => Err(Error::CardError("unknown wallet status code")),
        }
    }
}

/// One key slot on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardWallet {
    /// Public key of the slot; unique within a card.
    pub public_key: Bytes,
    /// Curve the key lives on.
    pub curve: EllipticCurve,
    /// Slot index.
    pub index: u8,
    /// Slot lifecycle status.
    pub status: WalletStatus,
}

/// Public snapshot of an authenticated card.
///
/// Populated once by the preflight read and treated as immutable for the
/// rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Card identifier.
    pub card_id: CardId,
    /// Firmware version reported by the card.
    pub firmware_version: FirmwareVersion,
    /// Card's own public key (secp256k1, SEC1 uncompressed).
    pub card_public_key: Bytes,
    /// Production batch identifier, when the firmware reports one.
    pub batch_id: Option<String>,
    /// Wallet slots present on the card.
    pub wallets: Vec<CardWallet>,
}

impl Card {
    /// Look up a wallet slot by its public key.
    pub fn wallet_by_public_key(&self, public_key: &[u8]) -> Option<&CardWallet> {
        self.wallets
            .iter()
            .find(|w| w.public_key.as_ref() == public_key)
    }
}
