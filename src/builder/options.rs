//! Per-machine configuration.

use crate::core::{Namespace, State};

/// Field, namespace, initial state and tracking switch of one machine.
///
/// Defaults: field `"state"`, the default namespace, no initial state,
/// tracking off.
#[derive(Clone, Debug, PartialEq)]
pub struct MachineOptions<S: State> {
    pub field: String,
    pub namespace: Namespace,
    pub initial: Option<S>,
    pub track: bool,
}

impl<S: State> MachineOptions<S> {
    pub fn new() -> Self {
        Self {
            field: "state".to_string(),
            namespace: Namespace::default(),
            initial: None,
            track: false,
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Record when each state is entered.
    pub fn track(mut self, enabled: bool) -> Self {
        self.track = enabled;
        self
    }
}

impl<S: State> Default for MachineOptions<S> {
    fn default() -> Self {
        Self::new()
    }
}
