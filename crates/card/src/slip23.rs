//! SLIP-23 (Ikarus variant) master key derivation.
//!
//! Reproduces the card's hierarchical master-key derivation on the host so
//! tests and tooling can check card-held keys against a known mnemonic. The
//! derivation is deterministic and pure: 96 bytes of PBKDF2-HMAC-SHA512 over
//! the BIP-39 entropy, followed by the Ikarus bit normalization of kL.

use std::fmt;

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// PBKDF2 iteration count fixed by the SLIP-23/Ikarus scheme.
pub const PBKDF2_ITERATIONS: u32 = 4096;

/// Master extended private key: a 64-byte private key (kL ‖ kR) plus a
/// 32-byte chain code.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedPrivateKey {
    private_key: [u8; 64],
    chain_code: [u8; 32],
}

impl ExtendedPrivateKey {
    /// Full 64-byte private key, kL followed by kR.
    pub const fn private_key(&self) -> &[u8; 64] {
        &self.private_key
    }

    /// Left key half (the Ed25519 scalar).
    pub fn key_l(&self) -> &[u8] {
        &self.private_key[..32]
    }

    /// Right key half (the nonce seed).
    pub fn key_r(&self) -> &[u8] {
        &self.private_key[32..]
    }

    /// Chain code for child-key derivation.
    pub const fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Ed25519 public key: base-point multiplication by kL.
    ///
    /// kL is used as the scalar directly, without the hashing step of plain
    /// Ed25519 key generation.
    pub fn public_key(&self) -> [u8; 32] {
        let mut kl = [0u8; 32];
        kl.copy_from_slice(self.key_l());
        let point = EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(kl));
        kl.zeroize();
        point.compress().to_bytes()
    }
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("private_key", &"<redacted>")
            .field("chain_code", &"<redacted>")
            .finish()
    }
}

/// Derive the Ikarus master key from BIP-39 entropy and a passphrase.
///
/// The entropy must have a valid BIP-39 length (16, 20, 24, 28 or 32 bytes).
/// The passphrase is NFKD-normalized before use. Identical inputs always
/// yield identical output.
///
/// The kL bit normalization below is the security-critical step of the
/// scheme; it is validated against the published Ikarus test vectors, not
/// derived from general BIP-32 conventions.
pub fn make_ikarus_master_key(entropy: &[u8], passphrase: &str) -> Result<ExtendedPrivateKey> {
    if !matches!(entropy.len(), 16 | 20 | 24 | 28 | 32) {
        return Err(Error::InvalidEntropy(entropy.len()));
    }

    let passphrase: String = passphrase.nfkd().collect();

    let mut seed = [0u8; 96];
    pbkdf2_hmac::<Sha512>(passphrase.as_bytes(), entropy, PBKDF2_ITERATIONS, &mut seed);

    // Ikarus normalization of kL: clear the three low bits of the first
    // byte, clear the three high bits of the last byte, then set its bit 6.
    seed[0] &= 0xF8;
    seed[31] = (seed[31] & 0x1F) | 0x40;

    let mut private_key = [0u8; 64];
    private_key.copy_from_slice(&seed[..64]);
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&seed[64..]);
    seed.zeroize();

    Ok(ExtendedPrivateKey {
        private_key,
        chain_code,
    })
}
