//! Transition rules: one legal change of a governed field.

use crate::core::{ChangeScope, Endpoint, Guard, State};

/// Typed reference to a transition rule of one machine.
///
/// Handles are handed out at definition time and stay valid for the
/// definition produced by `evaluate()`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TransitionHandle(pub(crate) usize);

impl TransitionHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A legal move from any of `from_states` to `to_state`.
///
/// Anonymous rules (no name) come from implicit declarations: entering the
/// initial state, or `MachineBuilder::state`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRule<S: State> {
    pub(crate) name: Option<String>,
    pub(crate) qualified_name: Option<String>,
    pub(crate) from: Vec<Endpoint<S>>,
    pub(crate) to: Endpoint<S>,
}

impl<S: State> TransitionRule<S> {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name prefixed with the machine's namespace unless it is the default.
    pub fn qualified_name(&self) -> Option<&str> {
        self.qualified_name.as_deref()
    }

    pub fn from_states(&self) -> &[Endpoint<S>] {
        &self.from
    }

    pub fn to_state(&self) -> &Endpoint<S> {
        &self.to
    }

    /// Whether a record whose field holds `from` may take this rule.
    ///
    /// A wildcard `from` is accepted by every rule so that brand-new records
    /// can be checked against any rule producing their state.
    pub fn accepts(&self, from: &Endpoint<S>) -> bool {
        from.is_any() || self.from.contains(&Endpoint::Any) || self.from.contains(from)
    }

    /// Whether this rule legalises the move `from` -> `to`.
    pub fn matches(&self, from: &Endpoint<S>, to: &Endpoint<S>) -> bool {
        self.accepts(from) && (self.to == *to || self.to.is_any() || to.is_any())
    }

    /// Guard that holds when a record just moved along this rule.
    pub fn guard(&self, scope: ChangeScope) -> Guard<S> {
        Guard::Transitioned {
            from: self.from.clone(),
            to: self.to.clone(),
            scope,
        }
    }

    pub(crate) fn label(&self) -> String {
        self.qualified_name
            .clone()
            .unwrap_or_else(|| format!("anonymous transition to {}", self.to))
    }
}

/// First rule, in registration order, that legalises `from` -> `to`.
pub(crate) fn first_match<S: State>(
    rules: &[TransitionRule<S>],
    from: &Endpoint<S>,
    to: &Endpoint<S>,
) -> Option<TransitionHandle> {
    rules
        .iter()
        .position(|rule| rule.matches(from, to))
        .map(TransitionHandle)
}
