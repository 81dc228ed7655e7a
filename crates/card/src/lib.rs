//! Host SDK for authenticating and operating tapcard secure-element cards.
//!
//! The SDK is layered the way the protocol is:
//!
//! - the wire layer (TLV codec, APDU framing, transport trait) lives in
//!   [`tapcard_apdu`] and is re-exported here as [`apdu`],
//! - [`commands`] defines the command execution framework and the built-in
//!   commands (preflight READ, wallet attestation),
//! - [`session`] runs commands against a transport with single-flight and
//!   cancellation guarantees,
//! - [`crypto`] and [`slip23`] hold the pure primitives: curve-parameterized
//!   signature verification and Ikarus master-key derivation.
//!
//! A typical exchange: open a [`CardSession`], run
//! [`preflight_read`](CardSession::preflight_read) to load the card
//! snapshot, then execute commands such as [`AttestWalletCommand`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub use tapcard_apdu as apdu;

pub mod commands;
pub mod crypto;
mod error;
pub mod session;
pub mod slip23;
mod types;

pub use commands::{
    AttestWalletCommand, AttestWalletResponse, CardCommand, ConfirmationMode, Instruction,
    ReadCommand,
};
pub use error::{Error, Result};
pub use session::{AccessCode, CancellationHandle, CardSession, SessionEnvironment};
pub use slip23::{ExtendedPrivateKey, make_ikarus_master_key};
pub use types::{
    Card, CardCapability, CardId, CardWallet, EllipticCurve, FirmwareVersion, WalletStatus,
};
