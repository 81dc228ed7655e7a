//! TLV codec, APDU framing and transport traits for tapcard secure-element cards.
//!
//! This crate is the wire layer of the tapcard SDK:
//!
//! - [`tlv`] — the tag-length-value vocabulary every command speaks,
//! - [`CommandApdu`] / [`ResponseApdu`] — the command and response frames,
//! - [`CardTransport`] — the async seam to the physical reader.
//!
//! Higher layers (session handling, command execution, attestation) live in
//! the `tapcard` crate.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod error;
pub mod response;
pub mod tlv;
pub mod transport;

pub use command::{CLA_CARD, CommandApdu};
pub use error::Error;
pub use response::{ResponseApdu, StatusWord, status};
pub use tlv::{TlvEntry, TlvMap, TlvTag, TlvWriter};
pub use transport::{CardTransport, TransportError};

/// Commonly used types and traits.
pub mod prelude {
    pub use crate::command::{CLA_CARD, CommandApdu};
    pub use crate::error::Error;
    pub use crate::response::{ResponseApdu, StatusWord, status};
    pub use crate::tlv::{TlvEntry, TlvMap, TlvTag, TlvWriter, ValueKind};
    pub use crate::transport::{CardTransport, TransportError};
    pub use crate::{Bytes, BytesMut};
}
