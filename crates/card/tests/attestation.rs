//! End-to-end command pipeline tests over a scripted transport.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use k256::ecdsa::signature::Signer as _;
use tapcard::apdu::transport::async_trait;
use tapcard::apdu::{
    CardTransport, CommandApdu, ResponseApdu, TlvTag, TlvWriter, TransportError, status,
};
use tapcard::{
    AttestWalletCommand, CardSession, ConfirmationMode, Error, ReadCommand,
};

/// Transport that replays a scripted list of responses and records every
/// frame it was asked to send.
struct ScriptedTransport {
    responses: VecDeque<Result<ResponseApdu, TransportError>>,
    sent: Vec<CommandApdu>,
    max_frame_len: usize,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<ResponseApdu, TransportError>>) -> Self {
        Self {
            responses: responses.into(),
            sent: Vec::new(),
            max_frame_len: 1024,
        }
    }
}

#[async_trait]
impl CardTransport for ScriptedTransport {
    async fn transmit(&mut self, command: &CommandApdu) -> Result<ResponseApdu, TransportError> {
        self.sent.push(command.clone());
        self.responses
            .pop_front()
            .unwrap_or(Err(TransportError::TagLost))
    }

    fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

/// Transport whose exchange never completes, for cancellation tests.
struct StalledTransport;

#[async_trait]
impl CardTransport for StalledTransport {
    async fn transmit(&mut self, _command: &CommandApdu) -> Result<ResponseApdu, TransportError> {
        std::future::pending().await
    }
}

struct CardFixture {
    wallet_key: k256::ecdsa::SigningKey,
    wallet_public_key: Bytes,
    card_key: k256::ecdsa::SigningKey,
}

impl CardFixture {
    fn new() -> Self {
        let wallet_key = k256::ecdsa::SigningKey::random(&mut rand_v8::thread_rng());
        let wallet_public_key = Bytes::copy_from_slice(
            wallet_key
                .verifying_key()
                .to_encoded_point(false)
                .as_bytes(),
        );
        Self {
            wallet_key,
            wallet_public_key,
            card_key: k256::ecdsa::SigningKey::random(&mut rand_v8::thread_rng()),
        }
    }

    fn read_response(&self) -> ResponseApdu {
        let card_public_key = self
            .card_key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();

        let mut wallet = TlvWriter::new();
        wallet
            .write(TlvTag::WalletPublicKey, &self.wallet_public_key)
            .write_str(TlvTag::CurveId, "secp256k1")
            .write_u8(TlvTag::WalletIndex, 0)
            .write_u8(TlvTag::WalletStatus, 2);

        let mut tlv = TlvWriter::new();
        tlv.write(TlvTag::CardId, &[0xCB, 0x22, 0x00, 0x0A])
            .write_str(TlvTag::FirmwareVersion, "2.33")
            .write(TlvTag::CardPublicKey, &card_public_key)
            .write(TlvTag::WalletTemplate, &wallet.finish());
        ResponseApdu::new(status::SW_NO_ERROR, tlv.finish())
    }

    /// Attestation response with a valid wallet signature and, optionally,
    /// a valid card self-attestation signature.
    fn attest_response(&self, challenge: &[u8], with_card_signature: bool) -> ResponseApdu {
        let salt = [0x5A; 12];
        let mut message = Vec::new();
        message.extend_from_slice(challenge);
        message.extend_from_slice(&salt);
        let wallet_signature: k256::ecdsa::Signature = self.wallet_key.sign(&message);

        let mut tlv = TlvWriter::new();
        tlv.write(TlvTag::Salt, &salt)
            .write(TlvTag::WalletSignature, &wallet_signature.to_bytes())
            .write(TlvTag::Challenge, challenge);

        if with_card_signature {
            let public_key_salt = [0x3C; 16];
            let mut card_message = Vec::new();
            card_message.extend_from_slice(&self.wallet_public_key);
            card_message.extend_from_slice(challenge);
            card_message.extend_from_slice(&public_key_salt);
            let card_signature: k256::ecdsa::Signature = self.card_key.sign(&card_message);

            tlv.write(TlvTag::CardSignature, &card_signature.to_bytes())
                .write(TlvTag::PublicKeySalt, &public_key_salt);
        }

        ResponseApdu::new(status::SW_NO_ERROR, tlv.finish())
    }
}

#[tokio::test]
async fn attestation_happy_path() {
    let fixture = CardFixture::new();
    let command = AttestWalletCommand::new(fixture.wallet_public_key.clone(), ConfirmationMode::None);

    let transport = ScriptedTransport::new(vec![
        Ok(fixture.read_response()),
        Ok(fixture.attest_response(command.challenge(), false)),
    ]);
    let mut session = CardSession::new(transport);

    session.preflight_read().await.unwrap();
    let response = session.execute(&command).await.unwrap();

    assert_eq!(response.challenge.as_ref(), command.challenge());
    assert!(response.card_signature.is_none());
    assert!(!response.counter_suspicious());
}

#[tokio::test]
async fn attestation_with_card_signature() {
    let fixture = CardFixture::new();
    let command =
        AttestWalletCommand::new(fixture.wallet_public_key.clone(), ConfirmationMode::Dynamic);

    let transport = ScriptedTransport::new(vec![
        Ok(fixture.read_response()),
        Ok(fixture.attest_response(command.challenge(), true)),
    ]);
    let mut session = CardSession::new(transport);

    session.preflight_read().await.unwrap();
    let response = session.execute(&command).await.unwrap();
    assert!(response.card_signature.is_some());
}

#[tokio::test]
async fn tampered_wallet_signature_fails_despite_transport_success() {
    let fixture = CardFixture::new();
    let command = AttestWalletCommand::new(fixture.wallet_public_key.clone(), ConfirmationMode::None);

    // Corrupt one signature byte inside the TLV payload.
    let good = fixture.attest_response(command.challenge(), false);
    let mut payload = good.payload.to_vec();
    let tampered_at = payload.len() / 2;
    payload[tampered_at] ^= 0x01;
    let tampered = ResponseApdu::new(status::SW_NO_ERROR, payload.into());

    let transport = ScriptedTransport::new(vec![Ok(fixture.read_response()), Ok(tampered)]);
    let mut session = CardSession::new(transport);

    session.preflight_read().await.unwrap();
    let result = session.execute(&command).await;
    assert!(matches!(result, Err(Error::CardVerificationFailed)));
}

#[tokio::test]
async fn missing_preflight_read_fails_before_any_transport_call() {
    let fixture = CardFixture::new();
    let command = AttestWalletCommand::new(fixture.wallet_public_key, ConfirmationMode::None);

    let mut session = CardSession::new(ScriptedTransport::new(vec![]));
    let result = session.execute(&command).await;
    assert!(matches!(result, Err(Error::MissingPreflightRead)));

    let transport = session.close();
    assert!(transport.sent.is_empty());
}

#[tokio::test]
async fn card_error_status_is_surfaced() {
    let response = ResponseApdu::new(status::SW_INVALID_PARAMS, Bytes::new());
    let mut session = CardSession::new(ScriptedTransport::new(vec![Ok(response)]));

    let result = session.execute(&ReadCommand).await;
    assert!(matches!(result, Err(Error::CardStatus(sw)) if sw == status::SW_INVALID_PARAMS));
}

#[tokio::test]
async fn tag_lost_passes_through() {
    let mut session =
        CardSession::new(ScriptedTransport::new(vec![Err(TransportError::TagLost)]));

    let result = session.execute(&ReadCommand).await;
    assert!(matches!(
        result,
        Err(Error::Transport(TransportError::TagLost))
    ));
}

#[tokio::test]
async fn oversized_frame_is_refused_before_submission() {
    let mut transport = ScriptedTransport::new(vec![]);
    transport.max_frame_len = 8;
    let mut session = CardSession::new(transport);

    let result = session.execute(&ReadCommand).await;
    assert!(matches!(
        result,
        Err(Error::Transport(TransportError::FrameTooLarge(_)))
    ));
    assert!(session.close().sent.is_empty());
}

#[tokio::test]
async fn cancellation_mid_flight_yields_exactly_one_outcome() {
    let mut session = CardSession::new(StalledTransport);
    let handle = session.cancellation_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
    });

    let result = session.execute(&ReadCommand).await;
    assert!(matches!(result, Err(Error::SessionCancelled)));

    // The session stays cancelled for subsequent submissions.
    let result = session.execute(&ReadCommand).await;
    assert!(matches!(result, Err(Error::SessionCancelled)));
}
