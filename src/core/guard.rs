//! Guard descriptors for enabling host-side behaviour around transitions.
//!
//! A guard is data, not a closure: it names the condition and is evaluated
//! against a live record by an integration context. Hosts use guards to
//! switch on extra validations or callbacks only when a particular
//! transition happened, or only while the record sits in certain states.

use super::state::{Endpoint, State};

/// Which change of the governed field a guard or query looks at.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ChangeScope {
    /// The unsaved change of the current save cycle.
    #[default]
    Pending,
    /// The change committed by the most recent save.
    Previous,
}

/// Declarative condition over a record's governed field.
#[derive(Clone, PartialEq, Debug)]
pub enum Guard<S: State> {
    /// The field changed in `scope`, the value before the change is one of
    /// `from` (or `from` holds `Any`), and the current value is `to` (or
    /// `to` is `Any`).
    Transitioned {
        from: Vec<Endpoint<S>>,
        to: Endpoint<S>,
        scope: ChangeScope,
    },
    /// The current value is one of these states.
    InStates(Vec<S>),
}

impl<S: State> Guard<S> {
    /// Check the guard against the observed field values.
    ///
    /// `changed` and `was` describe the change in the guard's own scope;
    /// `current` is the present value. Pure: callers gather the values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statebound::core::{ChangeScope, Endpoint, Guard, State};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    /// enum Zoo { Closed, Opened }
    ///
    /// impl State for Zoo {
    ///     fn name(&self) -> &str {
    ///         match self {
    ///             Self::Closed => "closed",
    ///             Self::Opened => "opened",
    ///         }
    ///     }
    /// }
    ///
    /// let opening = Guard::Transitioned {
    ///     from: vec![Endpoint::State(Zoo::Closed)],
    ///     to: Endpoint::State(Zoo::Opened),
    ///     scope: ChangeScope::Pending,
    /// };
    ///
    /// assert!(opening.check(true, Some(&Zoo::Closed), Some(&Zoo::Opened)));
    /// assert!(!opening.check(false, Some(&Zoo::Closed), Some(&Zoo::Opened)));
    /// ```
    pub fn check(&self, changed: bool, was: Option<&S>, current: Option<&S>) -> bool {
        match self {
            Guard::Transitioned { from, to, .. } => {
                changed
                    && (from.contains(&Endpoint::of(was)) || from.contains(&Endpoint::Any))
                    && (to.is_any() || *to == Endpoint::of(current))
            }
            Guard::InStates(states) => current.is_some_and(|state| states.contains(state)),
        }
    }

    /// The change scope this guard inspects.
    pub fn scope(&self) -> ChangeScope {
        match self {
            Guard::Transitioned { scope, .. } => *scope,
            Guard::InStates(_) => ChangeScope::Pending,
        }
    }
}
