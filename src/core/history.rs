//! Point-in-time queries over per-state entry timestamps.
//!
//! Records with tracking enabled remember when each state was last entered.
//! From those timestamps alone this module answers "was the record in state
//! S at time T" and "which state was the record most likely in at time T".

use super::state::State;
use chrono::{DateTime, Utc};

/// Entry timestamps of a record, viewed through a machine's declared states.
///
/// `states` is the machine's declaration order; `entered_at` returns the
/// recorded entry time of a state, if any.
///
/// # Example
///
/// ```rust
/// use statebound::core::{EntryTimeline, State};
/// use serde::{Deserialize, Serialize};
/// use chrono::{Duration, Utc};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Life { Unborn, Born }
///
/// impl State for Life {
///     fn name(&self) -> &str {
///         match self {
///             Self::Unborn => "unborn",
///             Self::Born => "born",
///         }
///     }
/// }
///
/// let t0 = Utc::now();
/// let t1 = t0 + Duration::hours(1);
/// let states = [Life::Unborn, Life::Born];
/// let timeline = EntryTimeline::new(&states, |s: &Life| match s {
///     Life::Unborn => Some(t0),
///     Life::Born => Some(t1),
/// });
///
/// assert!(timeline.in_state_at(&Life::Unborn, t0 + Duration::minutes(30)));
/// assert!(!timeline.in_state_at(&Life::Unborn, t1));
/// assert_eq!(timeline.likely_state_at(t1), Some(&Life::Born));
/// ```
pub struct EntryTimeline<'a, S, F> {
    states: &'a [S],
    entered_at: F,
}

impl<'a, S, F> EntryTimeline<'a, S, F>
where
    S: State,
    F: Fn(&S) -> Option<DateTime<Utc>>,
{
    pub fn new(states: &'a [S], entered_at: F) -> Self {
        Self { states, entered_at }
    }

    /// Whether the record was in `state` at `at`.
    ///
    /// The record was in `state` if it entered it on or before `at` and no
    /// other state was entered strictly after it and on or before `at`.
    /// When another state was entered at the very same instant, declaration
    /// order decides: the earlier-declared state wins.
    pub fn in_state_at(&self, state: &S, at: DateTime<Utc>) -> bool {
        let Some(entered) = (self.entered_at)(state) else {
            return false;
        };
        if entered > at {
            return false;
        }

        // Latest-declared first, so ties resolve against the latest-declared rival.
        let superseding: Vec<(&S, DateTime<Utc>)> = self
            .states
            .iter()
            .rev()
            .filter(|other| *other != state)
            .filter_map(|other| (self.entered_at)(other).map(|t| (other, t)))
            .filter(|(_, t)| *t >= entered && *t <= at)
            .collect();

        let Some(min_at) = superseding.iter().map(|(_, t)| *t).min() else {
            return true;
        };

        if min_at > entered {
            return false;
        }

        let rival = superseding
            .iter()
            .find(|(_, t)| *t == min_at)
            .map(|(other, _)| *other);

        match (self.position(state), rival.and_then(|r| self.position(r))) {
            (Some(own), Some(other)) => own < other,
            _ => false,
        }
    }

    /// The state the record was most likely in at `at`.
    ///
    /// Scans states latest-declared first and returns the first one the
    /// record was in at `at`, or `None` when nothing was recorded by then.
    pub fn likely_state_at(&self, at: DateTime<Utc>) -> Option<&'a S> {
        self.states
            .iter()
            .rev()
            .find(|state| self.in_state_at(state, at))
    }

    fn position(&self, state: &S) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }
}
