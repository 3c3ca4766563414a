//! Results of applying inbound messages.

use edgesync_core::EntityRef;
use std::fmt;

/// Why an inbound message was skipped without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An entity the message references does not exist locally.
    ReferenceMissing(EntityRef),
    /// The alarm originator named in the message does not exist locally.
    OriginatorMissing {
        /// Originator type as sent.
        originator_type: String,
        /// Originator name as sent.
        originator_name: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ReferenceMissing(entity) => write!(f, "referenced {entity} not found"),
            SkipReason::OriginatorMissing {
                originator_type,
                originator_name,
            } => write!(f, "originator {originator_type} {originator_name:?} not found"),
        }
    }
}

/// Outcome of applying one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new local record was created.
    Created,
    /// An existing local record was updated.
    Updated,
    /// A local record was deleted.
    Deleted,
    /// Nothing to do (e.g. deleting an absent record).
    NoOp,
    /// The message was ignored.
    Skipped(SkipReason),
    /// A request message queued this many outbound events.
    Enqueued(usize),
}

impl ApplyOutcome {
    /// Returns `Created` or `Updated`.
    pub fn upserted(created: bool) -> Self {
        if created {
            ApplyOutcome::Created
        } else {
            ApplyOutcome::Updated
        }
    }

    /// Returns `Deleted` or `NoOp`.
    pub fn deleted(existed: bool) -> Self {
        if existed {
            ApplyOutcome::Deleted
        } else {
            ApplyOutcome::NoOp
        }
    }

    /// Returns true if local state changed.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            ApplyOutcome::Created | ApplyOutcome::Updated | ApplyOutcome::Deleted
        )
    }
}
