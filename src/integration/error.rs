//! Errors and violations raised while integrating a machine with a record.

use thiserror::Error;

/// A recoverable validation failure.
///
/// The `Display` form is the message attached to the record's field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Violation {
    /// A new record holds a state no rule can produce from scratch.
    #[error("is not a valid state")]
    InvalidState { field: String, state: String },

    /// An existing record moved along a pair no rule allows.
    #[error("cannot transition to {to} from {from}")]
    InvalidTransition {
        field: String,
        from: String,
        to: String,
    },
}

impl Violation {
    /// The governed field the violation belongs to.
    pub fn field(&self) -> &str {
        match self {
            Violation::InvalidState { field, .. } | Violation::InvalidTransition { field, .. } => {
                field
            }
        }
    }
}

/// Failure reported by a record's persist hook.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The record refused to save because it is invalid.
    #[error("record is invalid: {}", .0.join(", "))]
    Invalid(Vec<String>),

    /// Storage failed.
    #[error(transparent)]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the strict transition paths.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("transition rejected: {0}")]
    Rejected(Violation),

    #[error("failed to persist transition: {0}")]
    PersistFailure(#[from] PersistError),

    #[error("transition '{name}' targets any state and cannot be applied")]
    WildcardTarget { name: String },

    #[error("no transition registered for handle {index}")]
    UnknownTransition { index: usize },
}
