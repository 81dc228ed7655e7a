//! Decoding errors for TLV streams and APDU frames.

use crate::tlv::TlvTag;

/// Error raised while decoding a TLV stream or an APDU frame.
///
/// Every variant means the received bytes do not match the wire format the
/// card firmware defines; none of them is recoverable by retrying the parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Frame shorter than the fixed header or with an inconsistent length field.
    #[error("invalid APDU frame of {0} bytes")]
    InvalidFrame(usize),

    /// A TLV length field runs past the end of the buffer.
    #[error("truncated TLV stream")]
    TruncatedTlv,

    /// A required tag is absent from the stream.
    #[error("missing required TLV tag {0}")]
    MissingTag(TlvTag),

    /// A tag is present but its value does not match the registered shape.
    #[error("invalid value for TLV tag {tag}: {reason}")]
    InvalidValue {
        /// Tag whose value failed to decode.
        tag: TlvTag,
        /// What was wrong with the value.
        reason: &'static str,
    },
}
