//! Command execution framework.
//!
//! Every card operation implements [`CardCommand`]: build a request frame
//! from session state, let the session move it over the transport, parse the
//! response frame, and optionally chain post-transport verification. The
//! session guarantees exactly one terminal outcome per invocation.

pub mod attest_wallet;
pub use attest_wallet::*;
pub mod read;
pub use read::*;

use tapcard_apdu::{CommandApdu, ResponseApdu, TlvMap};

use crate::error::{Error, Result};
use crate::session::SessionEnvironment;
use crate::types::Card;

/// Instruction codes of the card protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    /// Preflight read of the card's public state.
    Read = 0xF2,
    /// Challenge/response attestation of a wallet key.
    AttestWallet = 0xF9,
}

impl Instruction {
    /// Instruction byte as sent on the wire.
    pub const fn ins(self) -> u8 {
        self as u8
    }
}

/// One card operation: request serialization, response deserialization and
/// optional post-transport verification.
///
/// `serialize` and `deserialize` are pure functions of the session state and
/// the command's own parameters; transport I/O happens only inside
/// [`CardSession::execute`](crate::session::CardSession::execute).
pub trait CardCommand: Send + Sync {
    /// Parsed response type.
    type Response: Send;

    /// Build the request frame from session state.
    ///
    /// Fails with [`Error::MissingPreflightRead`] when the command requires
    /// card state that has not been loaded, or [`Error::WalletNotFound`]
    /// when a referenced wallet is absent from the card.
    fn serialize(&self, environment: &SessionEnvironment) -> Result<CommandApdu>;

    /// Parse the response frame.
    ///
    /// Fails with [`Error::DeserializeApduFailed`] on malformed or
    /// incomplete TLV data.
    fn deserialize(
        &self,
        environment: &SessionEnvironment,
        response: &ResponseApdu,
    ) -> Result<Self::Response>;

    /// Post-transport verification hook.
    ///
    /// Runs after a successful exchange and deserialization; a failure here
    /// turns the otherwise-successful exchange into an error. The default
    /// accepts everything.
    fn verify(
        &self,
        _environment: &SessionEnvironment,
        _response: &Self::Response,
    ) -> Result<()> {
        Ok(())
    }
}

/// Card state required by most commands; absent until the preflight read.
pub(crate) fn require_card(environment: &SessionEnvironment) -> Result<&Card> {
    environment.card.as_ref().ok_or(Error::MissingPreflightRead)
}

/// TLV payload of a successful response; a non-success status word maps to
/// its error kind instead.
pub(crate) fn success_payload(response: &ResponseApdu) -> Result<TlvMap> {
    match response.tlv_data()? {
        Some(tlv) => Ok(tlv),
        None => Err(Error::from_status(response.status)),
    }
}
