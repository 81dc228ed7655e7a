use std::str::FromStr;

use derive_more::Display;

use crate::error::Error;

/// Elliptic curve a wallet key lives on.
///
/// The curve is metadata carried by the card's wallet descriptors, never
/// assumed by the host.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum EllipticCurve {
    /// secp256k1 with ECDSA over SHA-256 digests.
    #[display("secp256k1")]
    Secp256k1,
    /// Ed25519 over the raw message.
    #[display("ed25519")]
    Ed25519,
}

impl FromStr for EllipticCurve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secp256k1" => Ok(Self::Secp256k1),
            "ed25519" => Ok(Self::Ed25519),
            other => Err(Error::UnknownCurve(other.to_owned())),
        }
    }
}
