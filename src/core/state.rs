//! State values and the endpoints transitions are declared between.
//!
//! A governed field holds at most one concrete state. Transition rules talk
//! about *endpoints*: a concrete state, the empty field, or the wildcard.
//! The wildcard is its own variant so it can never be confused with, or
//! written into, a real field.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Trait for the values a governed field can hold.
///
/// # Example
///
/// ```rust
/// use statebound::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "open",
///             Self::Closed => "closed",
///         }
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "open");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Name used in messages, timestamp slot names and descriptions.
    fn name(&self) -> &str;
}

/// One side of a transition: a concrete state, the empty field, or `Any`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Endpoint<S: State> {
    /// Matches every value, including the empty field.
    Any,
    /// The field holds no state.
    Unset,
    /// The field holds exactly this state.
    State(S),
}

impl<S: State> Endpoint<S> {
    /// The value currently held by a field, as an endpoint.
    pub fn of(value: Option<&S>) -> Self {
        match value {
            Some(state) => Endpoint::State(state.clone()),
            None => Endpoint::Unset,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Endpoint::Any)
    }

    /// The concrete state, if this endpoint names one.
    pub fn state(&self) -> Option<&S> {
        match self {
            Endpoint::State(state) => Some(state),
            _ => None,
        }
    }
}

impl<S: State> From<S> for Endpoint<S> {
    fn from(state: S) -> Self {
        Endpoint::State(state)
    }
}

impl<S: State> From<Option<S>> for Endpoint<S> {
    fn from(value: Option<S>) -> Self {
        match value {
            Some(state) => Endpoint::State(state),
            None => Endpoint::Unset,
        }
    }
}

impl<S: State> fmt::Display for Endpoint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Any => f.write_str("any"),
            Endpoint::Unset => f.write_str("nil"),
            Endpoint::State(state) => f.write_str(state.name()),
        }
    }
}
