//! Curve-parameterized signature verification and random byte generation.
//!
//! These primitives are pure and synchronous; the curve is metadata obtained
//! from the wallet or card descriptors, never hardcoded by callers.

use k256::ecdsa::signature::Verifier;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::types::EllipticCurve;

/// Verify `signature` over `message` under `public_key` on `curve`.
///
/// An invalid signature is a normal `false`, never a fault; malformed keys
/// and signatures also verify as `false`. secp256k1 signatures are taken
/// over the SHA-256 digest of the message, Ed25519 over the raw message.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8], curve: EllipticCurve) -> bool {
    match curve {
        EllipticCurve::Secp256k1 => {
            let Ok(key) = k256::ecdsa::VerifyingKey::from_sec1_bytes(public_key) else {
                return false;
            };
            let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
                return false;
            };
            key.verify(message, &signature).is_ok()
        }
        EllipticCurve::Ed25519 => {
            let Ok(key_bytes) = <&[u8; 32]>::try_from(public_key) else {
                return false;
            };
            let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(key_bytes) else {
                return false;
            };
            let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
                return false;
            };
            key.verify_strict(message, &signature).is_ok()
        }
    }
}

/// Generate `N` cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::rng().fill_bytes(&mut out);
    out
}

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}
