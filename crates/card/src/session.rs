//! Interactive card session.
//!
//! A [`CardSession`] owns the transport and the session-scoped card state
//! for the duration of one interactive exchange with a card. Holding the
//! transport by `&mut` makes the single-flight discipline a compile-time
//! property: no second command can be submitted while one is awaiting its
//! response.

use std::fmt;

use tapcard_apdu::{CardTransport, TransportError};
use tokio::sync::watch;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::commands::{CardCommand, ReadCommand};
use crate::crypto;
use crate::error::{Error, Result};
use crate::types::Card;

/// SHA-256 of the NFKD-normalized user access code.
///
/// Only the hash ever crosses the wire or lives in memory; it is wiped
/// when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessCode([u8; 32]);

/// Factory access code of cards that were never personalized.
const FACTORY_ACCESS_CODE: &str = "000000";

impl AccessCode {
    /// Hash a plain user code.
    pub fn from_plain(code: &str) -> Self {
        use unicode_normalization::UnicodeNormalization;
        let normalized: String = code.nfkd().collect();
        Self(crypto::sha256(normalized.as_bytes()))
    }

    /// Hash bytes as sent on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for AccessCode {
    fn default() -> Self {
        Self::from_plain(FACTORY_ACCESS_CODE)
    }
}

// Access codes authenticate the holder; keep them out of logs.
impl fmt::Debug for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessCode(<redacted>)")
    }
}

/// Session-scoped context supplied to every command.
///
/// Mutated only by the session owner between commands; commands receive it
/// read-only during their run and must not retain it beyond the call.
#[derive(Debug, Clone, Default)]
pub struct SessionEnvironment {
    /// Snapshot of the authenticated card, populated by the preflight read.
    pub card: Option<Card>,
    /// Access code presented with every command.
    pub access_code: AccessCode,
}

impl SessionEnvironment {
    /// Create an environment with the given access code and no card state.
    pub fn new(access_code: AccessCode) -> Self {
        Self {
            card: None,
            access_code,
        }
    }
}

/// Cancels a session's in-flight and future commands.
///
/// Clonable and usable from outside the session task; after `cancel`, every
/// pending or subsequent `execute` resolves to [`Error::SessionCancelled`]
/// exactly once per invocation.
#[derive(Debug, Clone)]
pub struct CancellationHandle(watch::Sender<bool>);

impl CancellationHandle {
    /// Cancel the session.
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// An open session with one card over one transport.
pub struct CardSession<T: CardTransport> {
    transport: T,
    environment: SessionEnvironment,
    cancel: watch::Sender<bool>,
}

impl<T: CardTransport> fmt::Debug for CardSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardSession")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl<T: CardTransport> CardSession<T> {
    /// Open a session with the factory access code.
    pub fn new(transport: T) -> Self {
        Self::with_environment(transport, SessionEnvironment::default())
    }

    /// Open a session with prepared environment state.
    pub fn with_environment(transport: T, environment: SessionEnvironment) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            transport,
            environment,
            cancel,
        }
    }

    /// Current session environment.
    pub const fn environment(&self) -> &SessionEnvironment {
        &self.environment
    }

    /// Mutable session environment, for the session owner between commands.
    pub const fn environment_mut(&mut self) -> &mut SessionEnvironment {
        &mut self.environment
    }

    /// Handle for cancelling this session from elsewhere.
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle(self.cancel.clone())
    }

    /// Run one command to its single terminal outcome.
    ///
    /// Pipeline: serialize → frame-size check → transport exchange (raced
    /// against cancellation) → status check → deserialize → the command's
    /// verification hook. Serialization failures never reach the transport.
    pub async fn execute<C: CardCommand>(&mut self, command: &C) -> Result<C::Response> {
        let apdu = command.serialize(&self.environment)?;

        let frame_len = apdu.to_bytes().len();
        if frame_len > self.transport.max_frame_len() {
            return Err(TransportError::FrameTooLarge(frame_len).into());
        }

        let mut cancelled = self.cancel.subscribe();
        if *cancelled.borrow() {
            return Err(Error::SessionCancelled);
        }

        debug!(ins = apdu.ins, frame_len, "submitting command");
        let response = tokio::select! {
            biased;
            _ = cancelled.wait_for(|c| *c) => return Err(Error::SessionCancelled),
            result = self.transport.transmit(&apdu) => result?,
        };

        if !response.is_success() {
            warn!(status = %response.status, "card rejected command");
            return Err(Error::from_status(response.status));
        }

        let parsed = command.deserialize(&self.environment, &response)?;
        command.verify(&self.environment, &parsed)?;
        Ok(parsed)
    }

    /// Run the preflight read and store the card snapshot in the
    /// environment. Commands that need card state require this to have run.
    pub async fn preflight_read(&mut self) -> Result<&Card> {
        let card = self.execute(&ReadCommand).await?;
        debug!(card_id = %card.card_id, firmware = %card.firmware_version, "preflight read complete");
        Ok(self.environment.card.insert(card))
    }

    /// Close the session, returning the transport.
    ///
    /// Any outstanding cancellation handles become inert.
    pub fn close(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_code_is_a_sha256_of_the_nfkd_code() {
        assert_eq!(
            hex::encode(AccessCode::from_plain("000000").as_bytes()),
            "91b4d142823f7d20c5f08df69122de43f35f057a988d9619f6d3138485c9a203"
        );
        assert_eq!(AccessCode::default(), AccessCode::from_plain("000000"));
    }

    #[test]
    fn access_code_debug_is_redacted() {
        let code = AccessCode::from_plain("123456");
        assert_eq!(format!("{code:?}"), "AccessCode(<redacted>)");
    }

    #[test]
    fn access_code_zeroizes() {
        let mut code = AccessCode::from_plain("123456");
        code.zeroize();
        assert_eq!(code.as_bytes(), &[0u8; 32]);
    }
}
