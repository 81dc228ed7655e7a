//! Preflight READ command.
//!
//! Fetches the card's public state and is expected to run before any other
//! command of a session; its result populates
//! [`SessionEnvironment::card`](crate::session::SessionEnvironment).

use tapcard_apdu::{CLA_CARD, CommandApdu, ResponseApdu, TlvMap, TlvTag, TlvWriter};

use crate::error::Result;
use crate::session::SessionEnvironment;
use crate::types::{Card, CardId, CardWallet, FirmwareVersion, WalletStatus};

use super::{CardCommand, Instruction, success_payload};

/// READ command: fetch card id, firmware version, card public key and the
/// wallet list.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadCommand;

impl CardCommand for ReadCommand {
    type Response = Card;

    fn serialize(&self, environment: &SessionEnvironment) -> Result<CommandApdu> {
        let mut tlv = TlvWriter::new();
        tlv.write(TlvTag::AccessCode, environment.access_code.as_bytes());

        Ok(CommandApdu::new(CLA_CARD, Instruction::Read.ins(), 0x00, 0x00).with_data(tlv.finish()))
    }

    fn deserialize(
        &self,
        _environment: &SessionEnvironment,
        response: &ResponseApdu,
    ) -> Result<Card> {
        let tlv = success_payload(response)?;

        let firmware_version: FirmwareVersion = tlv.str(TlvTag::FirmwareVersion)?.parse()?;
        let wallets = tlv
            .nested_all(TlvTag::WalletTemplate)?
            .iter()
            .map(parse_wallet)
            .collect::<Result<Vec<_>>>()?;

        Ok(Card {
            card_id: CardId::new(tlv.bytes(TlvTag::CardId)?),
            firmware_version,
            card_public_key: tlv.bytes(TlvTag::CardPublicKey)?,
            batch_id: tlv.str_optional(TlvTag::BatchId)?,
            wallets,
        })
    }
}

fn parse_wallet(tlv: &TlvMap) -> Result<CardWallet> {
    Ok(CardWallet {
        public_key: tlv.bytes(TlvTag::WalletPublicKey)?,
        curve: tlv.str(TlvTag::CurveId)?.parse()?,
        index: tlv.u8(TlvTag::WalletIndex)?,
        status: WalletStatus::try_from(tlv.u8(TlvTag::WalletStatus)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tapcard_apdu::status;

    use crate::error::Error;
    use crate::types::EllipticCurve;

    fn wallet_template(index: u8, public_key: &[u8], curve: &str, status: u8) -> Bytes {
        let mut tlv = TlvWriter::new();
        tlv.write(TlvTag::WalletPublicKey, public_key)
            .write_str(TlvTag::CurveId, curve)
            .write_u8(TlvTag::WalletIndex, index)
            .write_u8(TlvTag::WalletStatus, status);
        tlv.finish()
    }

    fn read_response() -> ResponseApdu {
        let mut tlv = TlvWriter::new();
        tlv.write(TlvTag::CardId, &[0xCB, 0x22, 0x00, 0x0A])
            .write_str(TlvTag::FirmwareVersion, "2.33d")
            .write(TlvTag::CardPublicKey, &[0x04; 65])
            .write_str(TlvTag::BatchId, "0042")
            .write(TlvTag::WalletTemplate, &wallet_template(0, &[0x02; 33], "secp256k1", 2))
            .write(TlvTag::WalletTemplate, &wallet_template(1, &[0x07; 32], "ed25519", 1));
        ResponseApdu::new(status::SW_NO_ERROR, tlv.finish())
    }

    #[test]
    fn serializes_access_code_only() {
        let environment = SessionEnvironment::default();
        let apdu = ReadCommand.serialize(&environment).unwrap();
        assert_eq!(apdu.ins, Instruction::Read.ins());

        let tlv = TlvMap::from_bytes(&apdu.data).unwrap();
        assert_eq!(tlv.entries().len(), 1);
        assert_eq!(
            tlv.bytes(TlvTag::AccessCode).unwrap().as_ref(),
            environment.access_code.as_bytes()
        );
    }

    #[test]
    fn deserializes_card_snapshot() {
        let environment = SessionEnvironment::default();
        let card = ReadCommand
            .deserialize(&environment, &read_response())
            .unwrap();

        assert_eq!(card.card_id.to_string(), "CB22000A");
        assert_eq!(card.firmware_version, FirmwareVersion::new(2, 33));
        assert_eq!(card.batch_id.as_deref(), Some("0042"));
        assert_eq!(card.wallets.len(), 2);
        assert_eq!(card.wallets[0].curve, EllipticCurve::Secp256k1);
        assert_eq!(card.wallets[0].status, WalletStatus::Loaded);
        assert_eq!(card.wallets[1].curve, EllipticCurve::Ed25519);
        assert_eq!(card.wallets[1].index, 1);
    }

    #[test]
    fn incomplete_payload_fails_deserialization() {
        let mut tlv = TlvWriter::new();
        tlv.write(TlvTag::CardId, &[0xCB]);
        let response = ResponseApdu::new(status::SW_NO_ERROR, tlv.finish());

        let result = ReadCommand.deserialize(&SessionEnvironment::default(), &response);
        assert!(matches!(result, Err(Error::DeserializeApduFailed(_))));
    }

    #[test]
    fn non_success_status_maps_to_error() {
        let response = ResponseApdu::new(status::SW_INVALID_STATE, Bytes::new());
        let result = ReadCommand.deserialize(&SessionEnvironment::default(), &response);
        assert!(matches!(result, Err(Error::CardStatus(_))));
    }
}
