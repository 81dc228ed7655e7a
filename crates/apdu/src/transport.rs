//! Transport seam between the host and the physical reader.
//!
//! The core never touches the physical link. A transport moves one command
//! frame to the card and returns one response frame; retry policy against a
//! flaky link lives behind this trait, not in the core.

pub use async_trait::async_trait;

use crate::command::CommandApdu;
use crate::response::ResponseApdu;

/// Errors originating in the physical transport.
///
/// These pass through the core unreinterpreted so the session owner can
/// distinguish a lost card from a protocol fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The card left the field before the exchange completed.
    #[error("tag lost")]
    TagLost,

    /// The frame exceeds the transport's maximum packet size.
    #[error("frame of {0} bytes exceeds the transport limit")]
    FrameTooLarge(usize),

    /// Reader or link level failure.
    #[error("transport link error: {0}")]
    Link(String),
}

/// Byte-oriented card transport.
///
/// Implementations must complete each `transmit` with exactly one result;
/// the session layer guarantees at most one outstanding call per session by
/// holding the transport exclusively.
#[async_trait]
pub trait CardTransport: Send {
    /// Send one command frame and await the card's response frame.
    async fn transmit(&mut self, command: &CommandApdu) -> Result<ResponseApdu, TransportError>;

    /// Largest raw frame this transport can move in one packet.
    ///
    /// The session refuses to submit commands whose serialized frame exceeds
    /// this; the framing layer itself never chunks.
    fn max_frame_len(&self) -> usize {
        1024
    }
}
