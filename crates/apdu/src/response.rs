//! Inbound APDU frame and status words.

use std::fmt;

use bytes::Bytes;

use crate::error::Error;
use crate::tlv::TlvMap;

/// Two-byte status word trailing every response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// First status byte.
    pub sw1: u8,
    /// Second status byte.
    pub sw2: u8,
}

impl StatusWord {
    /// Create a status word from its two bytes.
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Combined 16-bit form.
    pub const fn to_u16(self) -> u16 {
        (self.sw1 as u16) << 8 | self.sw2 as u16
    }

    /// Whether this status signals successful processing.
    pub const fn is_success(self) -> bool {
        self.to_u16() == status::SW_NO_ERROR.to_u16()
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
    }
}

impl From<u16> for StatusWord {
    fn from(value: u16) -> Self {
        Self::new((value >> 8) as u8, value as u8)
    }
}

/// Status words defined by the card protocol.
pub mod status {
    use super::StatusWord;

    /// Command processed successfully.
    pub const SW_NO_ERROR: StatusWord = StatusWord::new(0x90, 0x00);
    /// Command parameters failed card-side validation.
    pub const SW_INVALID_PARAMS: StatusWord = StatusWord::new(0x6A, 0x86);
    /// Command not allowed in the card's current state.
    pub const SW_INVALID_STATE: StatusWord = StatusWord::new(0x69, 0x86);
    /// Instruction byte not recognised by this firmware.
    pub const SW_INS_NOT_SUPPORTED: StatusWord = StatusWord::new(0x6D, 0x00);
    /// Card-side processing fault.
    pub const SW_ERROR_PROCESSING: StatusWord = StatusWord::new(0x6F, 0x00);
    /// Card is enforcing a security delay and asks the host to wait.
    pub const SW_NEED_PAUSE: StatusWord = StatusWord::new(0x97, 0x89);
}

/// Inbound response frame: optional TLV payload plus a trailing status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApdu {
    /// Status word from the last two frame bytes.
    pub status: StatusWord,
    /// Payload bytes preceding the status word. May be empty.
    pub payload: Bytes,
}

impl ResponseApdu {
    /// Create a response from its parts. Used by tests and card-side tooling.
    pub const fn new(status: StatusWord, payload: Bytes) -> Self {
        Self { status, payload }
    }

    /// Parse a raw response frame. The frame must carry at least the status word.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 2 {
            return Err(Error::InvalidFrame(data.len()));
        }
        let (payload, trailer) = data.split_at(data.len() - 2);
        Ok(Self {
            status: StatusWord::new(trailer[0], trailer[1]),
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// Serialize back to raw frame bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = Vec::with_capacity(self.payload.len() + 2);
        buf.extend_from_slice(&self.payload);
        buf.push(self.status.sw1);
        buf.push(self.status.sw2);
        buf.into()
    }

    /// Whether the card reported success.
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the TLV payload.
    ///
    /// Returns `None` for non-success status words: a failed command carries
    /// no payload worth parsing, and callers must check the status first.
    pub fn tlv_data(&self) -> Result<Option<TlvMap>, Error> {
        if !self.is_success() {
            return Ok(None);
        }
        TlvMap::from_bytes(&self.payload).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::{TlvTag, TlvWriter};

    #[test]
    fn parse_success_with_payload() {
        let mut writer = TlvWriter::new();
        writer.write(TlvTag::Salt, &[0x01, 0x02]);
        let mut frame = writer.finish().to_vec();
        frame.extend_from_slice(&[0x90, 0x00]);

        let response = ResponseApdu::from_bytes(&frame).unwrap();
        assert!(response.is_success());
        let tlv = response.tlv_data().unwrap().unwrap();
        assert_eq!(tlv.bytes(TlvTag::Salt).unwrap().as_ref(), &[0x01, 0x02]);
    }

    #[test]
    fn non_success_yields_no_payload() {
        let response = ResponseApdu::from_bytes(&[0xAA, 0xBB, 0x6A, 0x86]).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.status, status::SW_INVALID_PARAMS);
        assert!(response.tlv_data().unwrap().is_none());
    }

    #[test]
    fn bare_status_word() {
        let response = ResponseApdu::from_bytes(&[0x6F, 0x00]).unwrap();
        assert_eq!(response.status, status::SW_ERROR_PROCESSING);
        assert!(response.payload.is_empty());
    }

    #[test]
    fn too_short_frame_is_rejected() {
        assert!(matches!(
            ResponseApdu::from_bytes(&[0x90]),
            Err(Error::InvalidFrame(1))
        ));
    }

    #[test]
    fn roundtrip() {
        let response = ResponseApdu::new(status::SW_NO_ERROR, Bytes::from_static(&[1, 2, 3]));
        let parsed = ResponseApdu::from_bytes(&response.to_bytes()).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn malformed_payload_on_success_fails() {
        // Truncated TLV under a success status word.
        let response = ResponseApdu::from_bytes(&[0x17, 0x05, 0x01, 0x90, 0x00]).unwrap();
        assert!(response.tlv_data().is_err());
    }
}
