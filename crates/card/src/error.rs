use tapcard_apdu::{StatusWord, TransportError, status};

/// Result type for card operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for card operations.
///
/// Every failure a caller can observe maps to exactly one of these kinds so
/// UI layers can render distinct messages. Transport-originated errors pass
/// through untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The card reported a non-success status word.
    #[error("card returned error status {0}")]
    CardStatus(StatusWord),

    /// Card-side state could not be resolved (e.g. wallet or curve unknown).
    #[error("card error: {0}")]
    CardError(&'static str),

    /// The card is enforcing a security delay; retry after the pause.
    #[error("card requested a security delay pause")]
    NeedPause,

    /// A signature check failed after a successful transport exchange.
    ///
    /// This is a trust failure, not a transport failure.
    #[error("card verification failed")]
    CardVerificationFailed,

    /// The command requires card state that has not been loaded yet.
    #[error("command requires card state; run the preflight read first")]
    MissingPreflightRead,

    /// The referenced wallet public key is not present on the card.
    #[error("wallet not found on card")]
    WalletNotFound,

    /// The response payload was malformed or incomplete.
    #[error("failed to deserialize response: {0}")]
    DeserializeApduFailed(#[from] tapcard_apdu::Error),

    /// Key derivation input has an unsupported entropy length.
    #[error("invalid entropy length: {0} bytes")]
    InvalidEntropy(usize),

    /// The curve identifier received from the card is not supported.
    #[error("unknown elliptic curve id: {0}")]
    UnknownCurve(String),

    /// The firmware version string received from the card is malformed.
    #[error("malformed firmware version: {0}")]
    MalformedFirmwareVersion(String),

    /// The session was cancelled before the command reached a terminal state.
    #[error("session cancelled")]
    SessionCancelled,

    /// Transport-level failure, passed through unreinterpreted.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Map a non-success status word to its error kind.
    pub fn from_status(sw: StatusWord) -> Self {
        match sw {
            status::SW_NEED_PAUSE => Self::NeedPause,
            other => Self::CardStatus(other),
        }
    }
}
