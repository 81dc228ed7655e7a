//! The wire tag registry.
//!
//! Every field that crosses the card boundary is a TLV entry whose tag comes
//! from this fixed registry. The tag alone determines how the value bytes are
//! interpreted, so decode rules live here rather than at call sites.

use std::fmt;

/// Wire representation of a TLV value, as fixed by the tag registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Raw byte string (keys, signatures, salts, hashes).
    Bytes,
    /// UTF-8 string.
    Utf8,
    /// Big-endian unsigned integer, 1 to 8 bytes.
    Uint,
    /// Nested TLV stream.
    Nested,
}

/// Registry of TLV tags understood by the card protocol.
///
/// Raw tag values not present here are still carried through decoding
/// untouched; typed lookups simply never match them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TlvTag {
    /// Card identifier, raw bytes rendered as an upper-case hex string.
    CardId = 0x01,
    /// Card's own public key (secp256k1, SEC1 uncompressed).
    CardPublicKey = 0x03,
    /// Signature made with the card key.
    CardSignature = 0x04,
    /// Elliptic curve name as UTF-8 (`secp256k1`, `ed25519`).
    CurveId = 0x05,
    /// SHA-256 of the user access code.
    AccessCode = 0x10,
    /// Host-chosen nonce for challenge/response exchanges.
    Challenge = 0x16,
    /// Card-chosen salt mixed into signed messages.
    Salt = 0x17,
    /// Request for an additional card-side ownership confirmation.
    PublicKeyChallenge = 0x1A,
    /// Salt bound to the ownership confirmation.
    PublicKeySalt = 0x1B,
    /// Public key of a wallet slot.
    WalletPublicKey = 0x60,
    /// Signature made with a wallet key.
    WalletSignature = 0x61,
    /// Command execution counter for a wallet.
    CheckWalletCounter = 0x64,
    /// Index of a wallet slot on the card.
    WalletIndex = 0x65,
    /// Wallet slot lifecycle status.
    WalletStatus = 0x66,
    /// Firmware version as UTF-8 (`major.minor`, optional revision suffix).
    FirmwareVersion = 0x80,
    /// Production batch identifier as UTF-8.
    BatchId = 0x81,
    /// Wallet descriptor template; value is a nested TLV stream.
    WalletTemplate = 0xA1,
}

impl TlvTag {
    /// Decode rule for values carried under this tag.
    pub const fn value_kind(self) -> ValueKind {
        match self {
            Self::CardId
            | Self::CardPublicKey
            | Self::CardSignature
            | Self::AccessCode
            | Self::Challenge
            | Self::Salt
            | Self::PublicKeyChallenge
            | Self::PublicKeySalt
            | Self::WalletPublicKey
            | Self::WalletSignature => ValueKind::Bytes,
            Self::CurveId | Self::FirmwareVersion | Self::BatchId => ValueKind::Utf8,
            Self::CheckWalletCounter | Self::WalletIndex | Self::WalletStatus => ValueKind::Uint,
            Self::WalletTemplate => ValueKind::Nested,
        }
    }

    /// Raw tag byte as it appears on the wire.
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TlvTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}(0x{:02X})", self.raw())
    }
}

impl From<TlvTag> for u8 {
    fn from(tag: TlvTag) -> Self {
        tag.raw()
    }
}
