//! Outbound APDU frame.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Error;

/// Class byte used for all card protocol commands.
pub const CLA_CARD: u8 = 0x00;

/// Outbound command frame: ISO 7816-4 header plus a serialized TLV payload.
///
/// The framing layer never chunks oversized payloads; the transport's frame
/// limit is checked by the session before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandApdu {
    /// Command class byte.
    pub cla: u8,
    /// Instruction byte.
    pub ins: u8,
    /// First parameter.
    pub p1: u8,
    /// Second parameter.
    pub p2: u8,
    /// Serialized TLV payload. May be empty.
    pub data: Bytes,
}

impl CommandApdu {
    /// Create a command with an empty payload.
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Bytes::new(),
        }
    }

    /// Attach a payload.
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = data.into();
        self
    }

    /// Serialize to raw frame bytes.
    ///
    /// Payloads up to 255 bytes use the short `Lc` form; longer payloads use
    /// the extended form (`0x00` marker followed by a big-endian `u16`),
    /// which caps the payload at `u16::MAX` bytes.
    pub fn to_bytes(&self) -> Bytes {
        debug_assert!(
            self.data.len() <= u16::MAX as usize,
            "payload of {} bytes exceeds the extended Lc form",
            self.data.len()
        );
        let mut buffer = BytesMut::with_capacity(7 + self.data.len());

        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        if !self.data.is_empty() {
            if self.data.len() <= 0xFF {
                buffer.put_u8(self.data.len() as u8);
            } else {
                buffer.put_u8(0x00);
                buffer.put_u16(self.data.len() as u16);
            }
            buffer.put_slice(&self.data);
        }

        buffer.freeze()
    }

    /// Parse a command frame, accepting both `Lc` forms.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 4 {
            return Err(Error::InvalidFrame(data.len()));
        }

        let mut command = Self::new(data[0], data[1], data[2], data[3]);
        let body = &data[4..];
        if body.is_empty() {
            return Ok(command);
        }

        let (lc, header) = if body[0] != 0x00 {
            (body[0] as usize, 1)
        } else {
            if body.len() < 3 {
                return Err(Error::InvalidFrame(data.len()));
            }
            (u16::from_be_bytes([body[1], body[2]]) as usize, 3)
        };

        if body.len() != header + lc {
            return Err(Error::InvalidFrame(data.len()));
        }
        command.data = Bytes::copy_from_slice(&body[header..]);

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_with_payload() {
        let cmd = CommandApdu::new(CLA_CARD, 0xF2, 0x00, 0x00)
            .with_data(Bytes::from_static(&[0x10, 0x02, 0xAA, 0xBB]));
        let bytes = cmd.to_bytes();

        assert_eq!(bytes[0], 0x00); // CLA
        assert_eq!(bytes[1], 0xF2); // INS
        assert_eq!(bytes[2], 0x00); // P1
        assert_eq!(bytes[3], 0x00); // P2
        assert_eq!(bytes[4], 0x04); // Lc
        assert_eq!(&bytes[5..], &[0x10, 0x02, 0xAA, 0xBB]);
    }

    #[test]
    fn serialize_without_payload() {
        let cmd = CommandApdu::new(CLA_CARD, 0xF2, 0x01, 0x02);
        assert_eq!(cmd.to_bytes().as_ref(), &[0x00, 0xF2, 0x01, 0x02]);
    }

    #[test]
    fn roundtrip_short_form() {
        let cmd = CommandApdu::new(CLA_CARD, 0xF9, 0x00, 0x00)
            .with_data(Bytes::from(vec![0x55; 255]));
        let parsed = CommandApdu::from_bytes(&cmd.to_bytes()).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn roundtrip_extended_form() {
        let cmd = CommandApdu::new(CLA_CARD, 0xF9, 0x00, 0x00)
            .with_data(Bytes::from(vec![0x55; 300]));
        let bytes = cmd.to_bytes();
        assert_eq!(bytes[4], 0x00);
        assert_eq!(u16::from_be_bytes([bytes[5], bytes[6]]), 300);

        let parsed = CommandApdu::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    #[should_panic(expected = "exceeds the extended Lc form")]
    fn payload_longer_than_u16_is_refused() {
        let cmd = CommandApdu::new(CLA_CARD, 0xF9, 0x00, 0x00)
            .with_data(Bytes::from(vec![0u8; u16::MAX as usize + 1]));
        let _ = cmd.to_bytes();
    }

    #[test]
    fn short_frame_is_rejected() {
        assert!(matches!(
            CommandApdu::from_bytes(&[0x00, 0xF2]),
            Err(Error::InvalidFrame(2))
        ));
    }

    #[test]
    fn inconsistent_length_is_rejected() {
        // Lc says 4 bytes, only 2 follow.
        assert!(CommandApdu::from_bytes(&[0x00, 0xF2, 0x00, 0x00, 0x04, 0xAA, 0xBB]).is_err());
    }
}
