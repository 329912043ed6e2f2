//! Delivery settlement policy
//!
//! A delivery is settled only after dispatch returns. Conflicts are the only
//! failures worth another attempt; input and domain errors would fail the same
//! way again, so they are acknowledged and dropped.

use crate::commands::DispatchOutcome;
use storekeep_core::errors::ExErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    Requeue,
    Reject,
}

/// Settlement for a failure of `kind` on a delivery already requeued
/// `redelivered` times
pub fn settle_error(kind: ExErrorKind, redelivered: u32, max_redeliveries: u32) -> Settlement {
    match kind {
        ExErrorKind::Conflict if redelivered < max_redeliveries => Settlement::Requeue,
        ExErrorKind::Decode
        | ExErrorKind::InvalidInput
        | ExErrorKind::NotFound
        | ExErrorKind::InvalidOperation => Settlement::Ack,
        ExErrorKind::Conflict
        | ExErrorKind::Persistence
        | ExErrorKind::Config
        | ExErrorKind::Io
        | ExErrorKind::Serialization
        | ExErrorKind::Internal => Settlement::Reject,
    }
}

pub fn settle(outcome: &DispatchOutcome, redelivered: u32, max_redeliveries: u32) -> Settlement {
    match outcome {
        DispatchOutcome::Completed { .. } | DispatchOutcome::Ignored { .. } => Settlement::Ack,
        DispatchOutcome::Failed { error, .. } => {
            settle_error(error.kind(), redelivered, max_redeliveries)
        }
    }
}
