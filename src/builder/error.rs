//! Errors raised while defining a machine.

use thiserror::Error;

/// Errors that can occur while registering transitions, aliases and machines.
///
/// Every variant is fatal for the definition it came from: the builder is
/// not meant to be used further once one is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error(
        "another transition ('{existing}') already moves the '{namespace}' machine from {from} to {to}"
    )]
    AmbiguousTransition {
        namespace: String,
        from: String,
        to: String,
        existing: String,
    },

    #[error("another transition already exists with the name '{name}' in the '{namespace}' machine")]
    DuplicateTransitionName { namespace: String, name: String },

    #[error("another alias already exists with the name '{name}' in the '{namespace}' machine")]
    DuplicateAliasName { namespace: String, name: String },

    #[error("a machine is already registered for namespace '{namespace}'")]
    DuplicateNamespace { namespace: String },

    #[error("transition '{name}' has no source states. Call .from(state) or .from_any()")]
    MissingSource { name: String },

    #[error("transition '{name}' has no target state. Call .to(state)")]
    MissingTarget { name: String },

    #[error("transition '{name}' targets an empty field, which is not a state")]
    UnsetTarget { name: String },
}
