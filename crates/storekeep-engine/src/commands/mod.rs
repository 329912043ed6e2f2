//! Inbound command handling: envelope decoding and dispatch

pub mod dispatcher;
pub mod envelope;

pub use dispatcher::{CommandResult, DispatchOutcome, Dispatcher};
pub use envelope::{decode, Action, Command, CommandEnvelope, Decoded, Envelope};
