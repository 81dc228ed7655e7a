//! Wallet attestation command.
//!
//! Proves that a card-held wallet's private key matches a known public key
//! via challenge/response, without the private key ever leaving the card.
//! The transport exchange succeeding is not enough: the command only reports
//! success once the wallet signature (and the card signature, when present)
//! verifies on the host.

use bytes::{BufMut, Bytes, BytesMut};
use tapcard_apdu::{CLA_CARD, CommandApdu, ResponseApdu, TlvTag, TlvWriter};
use tracing::warn;

use crate::crypto;
use crate::error::{Error, Result};
use crate::session::SessionEnvironment;
use crate::types::{CardCapability, EllipticCurve, WalletStatus};

use super::{CardCommand, Instruction, require_card, success_payload};

/// Challenge length fixed by the protocol.
pub const CHALLENGE_LEN: usize = 16;

/// Execution counter values above this suggest replay probing of the wallet.
pub const SUSPICIOUS_COUNTER_THRESHOLD: u64 = 100_000;

/// Policy for the card's additional self-attestation of wallet ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationMode {
    /// No ownership confirmation requested.
    #[default]
    None,
    /// Confirmation bound to the wallet key only.
    Static,
    /// Confirmation bound to this exchange's challenge.
    Dynamic,
}

/// ATTEST WALLET command parameters.
#[derive(Debug, Clone)]
pub struct AttestWalletCommand {
    public_key: Bytes,
    challenge: [u8; CHALLENGE_LEN],
    confirmation_mode: ConfirmationMode,
}

impl AttestWalletCommand {
    /// Attest the wallet holding `public_key`, with a fresh random challenge.
    pub fn new<T: Into<Bytes>>(public_key: T, confirmation_mode: ConfirmationMode) -> Self {
        Self::with_challenge(public_key, crypto::random_bytes(), confirmation_mode)
    }

    /// Attest with a caller-chosen challenge.
    pub fn with_challenge<T: Into<Bytes>>(
        public_key: T,
        challenge: [u8; CHALLENGE_LEN],
        confirmation_mode: ConfirmationMode,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            challenge,
            confirmation_mode,
        }
    }

    /// The challenge this command sends.
    pub const fn challenge(&self) -> &[u8; CHALLENGE_LEN] {
        &self.challenge
    }
}

/// Parsed ATTEST WALLET response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestWalletResponse {
    /// Card-chosen salt mixed into the wallet signature.
    pub salt: Bytes,
    /// Wallet signature over challenge ‖ salt.
    pub wallet_signature: Bytes,
    /// Challenge echoed by the card.
    pub challenge: Bytes,
    /// Card self-attestation signature, when ownership confirmation ran.
    pub card_signature: Option<Bytes>,
    /// Salt bound to the ownership confirmation.
    pub public_key_salt: Option<Bytes>,
    /// Wallet slot status, when the firmware reports it.
    pub wallet_status: Option<WalletStatus>,
    /// Command execution counter, when the firmware reports it.
    pub counter: Option<u64>,
}

impl AttestWalletResponse {
    /// Advisory signal: a very large execution counter suggests replay
    /// probing. Never a failure by itself.
    pub fn counter_suspicious(&self) -> bool {
        self.counter
            .is_some_and(|c| c > SUSPICIOUS_COUNTER_THRESHOLD)
    }
}

impl CardCommand for AttestWalletCommand {
    type Response = AttestWalletResponse;

    fn serialize(&self, environment: &SessionEnvironment) -> Result<CommandApdu> {
        let card = require_card(environment)?;
        let wallet = card
            .wallet_by_public_key(&self.public_key)
            .ok_or(Error::WalletNotFound)?;

        let mut tlv = TlvWriter::new();
        tlv.write(TlvTag::AccessCode, environment.access_code.as_bytes())
            .write(TlvTag::CardId, card.card_id.as_bytes())
            .write(TlvTag::Challenge, &self.challenge)
            .write_u8(TlvTag::WalletIndex, wallet.index);

        // Older firmware does not know the tag; omitting it is intentional
        // backward compatibility, not an error.
        if card
            .firmware_version
            .supports(CardCapability::WalletOwnershipConfirmation)
        {
            match self.confirmation_mode {
                ConfirmationMode::None => {}
                ConfirmationMode::Static => {
                    tlv.write(TlvTag::PublicKeyChallenge, &[]);
                }
                ConfirmationMode::Dynamic => {
                    tlv.write(TlvTag::PublicKeyChallenge, &self.challenge);
                }
            }
        }

        Ok(
            CommandApdu::new(CLA_CARD, Instruction::AttestWallet.ins(), 0x00, 0x00)
                .with_data(tlv.finish()),
        )
    }

    fn deserialize(
        &self,
        _environment: &SessionEnvironment,
        response: &ResponseApdu,
    ) -> Result<AttestWalletResponse> {
        let tlv = success_payload(response)?;

        let wallet_status = tlv
            .uint_optional(TlvTag::WalletStatus)?
            .map(|code| {
                u8::try_from(code)
                    .map_err(|_| Error::CardError("wallet status code out of range"))
                    .and_then(WalletStatus::try_from)
            })
            .transpose()?;

        Ok(AttestWalletResponse {
            salt: tlv.bytes(TlvTag::Salt)?,
            wallet_signature: tlv.bytes(TlvTag::WalletSignature)?,
            challenge: tlv.bytes(TlvTag::Challenge)?,
            card_signature: tlv.bytes_optional(TlvTag::CardSignature)?,
            public_key_salt: tlv.bytes_optional(TlvTag::PublicKeySalt)?,
            wallet_status,
            counter: tlv.uint_optional(TlvTag::CheckWalletCounter)?,
        })
    }

    fn verify(
        &self,
        environment: &SessionEnvironment,
        response: &AttestWalletResponse,
    ) -> Result<()> {
        let card = require_card(environment)?;
        let wallet = card
            .wallet_by_public_key(&self.public_key)
            .ok_or(Error::CardError("attested wallet vanished from card state"))?;

        // The wallet must have signed the challenge we sent, not the echo.
        let mut message = BytesMut::with_capacity(CHALLENGE_LEN + response.salt.len());
        message.put_slice(&self.challenge);
        message.put_slice(&response.salt);
        if !crypto::verify(
            &self.public_key,
            &message,
            &response.wallet_signature,
            wallet.curve,
        ) {
            return Err(Error::CardVerificationFailed);
        }

        // Absent card signature means no ownership confirmation was
        // requested; that is vacuously valid.
        if let Some(card_signature) = &response.card_signature {
            let mut message = BytesMut::new();
            message.put_slice(&self.public_key);
            if let Some(public_key_salt) = &response.public_key_salt {
                message.put_slice(&response.challenge);
                message.put_slice(public_key_salt);
            }
            if let Some(status) = response.wallet_status {
                message.put_u8(status.code());
            }
            if !crypto::verify(
                &card.card_public_key,
                &message,
                card_signature,
                EllipticCurve::Secp256k1,
            ) {
                return Err(Error::CardVerificationFailed);
            }
        }

        if response.counter_suspicious() {
            warn!(
                card_id = %card.card_id,
                counter = response.counter,
                "wallet execution counter unusually high; possible replay probing"
            );
        }

        Ok(())
    }
}
