//! The evaluated, read-only definition of one machine.

use super::alias::{AliasHandle, AliasRule};
use super::transition::{first_match, TransitionHandle, TransitionRule};
use crate::core::{Endpoint, Guard, Namespace, State};
use crate::integration::{IntegrationContext, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transitions, aliases and metadata of one machine on one record type.
///
/// Produced by `MachineBuilder::evaluate` and immutable afterwards, so it
/// can be shared freely between threads and records.
#[derive(Clone, Debug, PartialEq)]
pub struct MachineDefinition<S: State> {
    pub(crate) namespace: Namespace,
    pub(crate) field: String,
    pub(crate) initial: Option<S>,
    pub(crate) states: Vec<S>,
    pub(crate) transitions: Vec<TransitionRule<S>>,
    pub(crate) aliases: Vec<AliasRule<S>>,
    pub(crate) tracking: bool,
}

impl<S: State> MachineDefinition<S> {
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Name of the record field this machine governs.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn initial_state(&self) -> Option<&S> {
        self.initial.as_ref()
    }

    /// Known states, in order of first appearance.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn tracking_enabled(&self) -> bool {
        self.tracking
    }

    pub fn transitions(&self) -> &[TransitionRule<S>] {
        &self.transitions
    }

    pub fn aliases(&self) -> &[AliasRule<S>] {
        &self.aliases
    }

    pub fn transition(&self, handle: TransitionHandle) -> Option<&TransitionRule<S>> {
        self.transitions.get(handle.0)
    }

    pub fn alias(&self, handle: AliasHandle) -> Option<&AliasRule<S>> {
        self.aliases.get(handle.0)
    }

    /// First rule, in registration order, that legalises `from` -> `to`.
    pub fn matching_transition(
        &self,
        from: &Endpoint<S>,
        to: &Endpoint<S>,
    ) -> Option<TransitionHandle> {
        first_match(&self.transitions, from, to)
    }

    /// Look up a named transition by its bare or qualified name.
    pub fn transition_named(&self, name: &str) -> Option<TransitionHandle> {
        self.transitions
            .iter()
            .position(|rule| rule.name() == Some(name) || rule.qualified_name() == Some(name))
            .map(TransitionHandle)
    }

    /// Look up an alias by its bare or qualified name.
    pub fn alias_named(&self, name: &str) -> Option<AliasHandle> {
        self.aliases
            .iter()
            .position(|alias| alias.name() == name || alias.qualified_name() == name)
            .map(AliasHandle)
    }

    /// Guard that holds while a record is in one of `states`.
    pub fn guard_for(&self, states: impl IntoIterator<Item = S>) -> Guard<S> {
        Guard::InStates(states.into_iter().collect())
    }

    /// Bind this machine to a live record.
    pub fn integration<R: Record<S>>(self: &Arc<Self>, record: R) -> IntegrationContext<S, R> {
        IntegrationContext::new(Arc::clone(self), record)
    }

    /// Serializable summary for generators of storage-side filters and constants.
    pub fn describe(&self) -> MachineDescription {
        MachineDescription {
            namespace: self.namespace.to_string(),
            field: self.field.clone(),
            initial: self.initial.as_ref().map(|s| s.name().to_string()),
            tracking: self.tracking,
            states: names(&self.states),
            transitions: self
                .transitions
                .iter()
                .map(|rule| TransitionDescription {
                    name: rule.qualified_name().map(str::to_string),
                    from: rule.from_states().iter().map(|e| e.to_string()).collect(),
                    to: rule.to_state().to_string(),
                })
                .collect(),
            aliases: self
                .aliases
                .iter()
                .map(|alias| AliasDescription {
                    name: alias.qualified_name().to_string(),
                    negated: alias.is_negated(),
                    members: names(alias.members()),
                    derived: names(alias.derived_members()),
                    opposite: alias
                        .opposite()
                        .and_then(|h| self.alias(h))
                        .map(|op| op.qualified_name().to_string()),
                })
                .collect(),
        }
    }
}

fn names<S: State>(states: &[S]) -> Vec<String> {
    states.iter().map(|s| s.name().to_string()).collect()
}

/// Name-level view of a machine definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineDescription {
    pub namespace: String,
    pub field: String,
    pub initial: Option<String>,
    pub tracking: bool,
    pub states: Vec<String>,
    pub transitions: Vec<TransitionDescription>,
    pub aliases: Vec<AliasDescription>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionDescription {
    pub name: Option<String>,
    pub from: Vec<String>,
    pub to: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AliasDescription {
    pub name: String,
    pub negated: bool,
    pub members: Vec<String>,
    /// States the alias holds for.
    pub derived: Vec<String>,
    pub opposite: Option<String>,
}
