//! A machine bound to one live record.

use super::clock::{Clock, SystemClock};
use super::error::{PersistError, TransitionError, Violation};
use super::peers::{persist_or_undo, Peers, Stamp};
use super::record::{Record, TimestampSlot};
use crate::core::{ChangeScope, Endpoint, EntryTimeline, Guard, State};
use crate::machine::{AliasHandle, MachineDefinition, TransitionHandle, TransitionRule};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, trace, warn};

/// Result of attempting a single transition
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome<S: State> {
    /// The field now holds the rule's target (and was saved, if asked to).
    Transitioned(S),

    /// The rule does not accept the current state; nothing changed.
    Rejected(Violation),

    /// The field was assigned but the save cycle refused the record.
    Invalid,
}

impl<S: State> AttemptOutcome<S> {
    pub fn is_transitioned(&self) -> bool {
        matches!(self, AttemptOutcome::Transitioned(_))
    }
}

enum SaveFailure {
    Invalid(Vec<String>),
    Storage(PersistError),
}

/// One machine integrated with one record.
///
/// The context owns the record handle (pass `&mut record` to borrow one)
/// and carries the per-record scoped flags. It is cheap to create: the
/// machine itself is shared behind an `Arc`. Contexts handed out by a
/// `MachineRegistry` also know the record's other machines, and their
/// save cycle covers all of them.
pub struct IntegrationContext<S: State, R: Record<S>> {
    machine: Arc<MachineDefinition<S>>,
    record: R,
    clock: Arc<dyn Clock>,
    peers: Option<Arc<dyn Peers<R>>>,
    pub(crate) skip_validations: bool,
    pub(crate) skip_transition_tracking: bool,
}

impl<S: State, R: Record<S>> IntegrationContext<S, R> {
    pub fn new(machine: Arc<MachineDefinition<S>>, record: R) -> Self {
        Self {
            machine,
            record,
            clock: Arc::new(SystemClock),
            peers: None,
            skip_validations: false,
            skip_transition_tracking: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn with_peers(mut self, peers: Arc<dyn Peers<R>>) -> Self {
        self.peers = Some(peers);
        self
    }

    pub fn machine(&self) -> &Arc<MachineDefinition<S>> {
        &self.machine
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    pub fn into_record(self) -> R {
        self.record
    }

    pub fn skips_validations(&self) -> bool {
        self.skip_validations
    }

    pub fn set_skip_validations(&mut self, skip: bool) {
        self.skip_validations = skip;
    }

    pub fn skips_transition_tracking(&self) -> bool {
        self.skip_transition_tracking
    }

    pub fn set_skip_transition_tracking(&mut self, skip: bool) {
        self.skip_transition_tracking = skip;
    }

    pub fn state(&self) -> Option<S> {
        self.record.read_state(self.machine.field())
    }

    pub fn set_state(&mut self, value: Option<S>) {
        self.record.write_state(self.machine.field(), value);
    }

    pub fn state_was(&self, scope: ChangeScope) -> Option<S> {
        self.record.state_was(self.machine.field(), scope)
    }

    pub fn state_changed(&self, scope: ChangeScope) -> bool {
        self.record.state_changed(self.machine.field(), scope)
    }

    pub fn is_in(&self, state: &S) -> bool {
        self.state().as_ref() == Some(state)
    }

    /// Whether the alias holds for the current value. Unknown handles never hold.
    pub fn alias_holds(&self, handle: AliasHandle) -> bool {
        let current = self.state();
        self.machine
            .alias(handle)
            .is_some_and(|alias| alias.holds(current.as_ref()))
    }

    pub fn guard_holds(&self, guard: &Guard<S>) -> bool {
        let scope = guard.scope();
        guard.check(
            self.state_changed(scope),
            self.state_was(scope).as_ref(),
            self.state().as_ref(),
        )
    }

    /// Assign the initial state to a new record whose field is empty.
    ///
    /// Returns whether the field was assigned.
    pub fn ensure_initial_state(&mut self) -> bool {
        if !self.record.is_new_record() || self.state().is_some() {
            return false;
        }
        let Some(initial) = self.machine.initial_state().cloned() else {
            return false;
        };

        trace!(
            field = self.machine.field(),
            state = initial.name(),
            "assigned initial state"
        );
        self.set_state(Some(initial));
        true
    }

    /// Check that the unsaved change of the field is legal.
    ///
    /// A new record must hold a state some rule can produce; an existing
    /// record must have moved along a pair some rule allows. Violations are
    /// also attached to the record.
    pub fn validate_transition(&mut self) -> Validation<(), NonEmptyVec<Violation>> {
        if self.skip_validations || !self.state_changed(ChangeScope::Pending) {
            return Validation::success(());
        }

        let field = self.machine.field().to_string();
        let current = Endpoint::of(self.state().as_ref());

        let violation = if self.record.is_new_record() {
            if self
                .machine
                .matching_transition(&Endpoint::Any, &current)
                .is_some()
            {
                return Validation::success(());
            }
            Violation::InvalidState {
                field,
                state: current.to_string(),
            }
        } else {
            let was = Endpoint::of(self.state_was(ChangeScope::Pending).as_ref());
            if self.machine.matching_transition(&was, &current).is_some() {
                return Validation::success(());
            }
            Violation::InvalidTransition {
                field,
                from: was.to_string(),
                to: current.to_string(),
            }
        };

        debug!(
            namespace = %self.machine.namespace(),
            field = violation.field(),
            %violation,
            "state change rejected"
        );
        self.record
            .add_error(violation.field(), violation.to_string());
        Validation::fail(violation)
    }

    /// Whether `handle` may be applied to the record as it stands.
    pub fn can(&self, handle: TransitionHandle) -> bool {
        if self.skip_validations {
            return true;
        }
        let current = Endpoint::of(self.state().as_ref());
        self.machine
            .transition(handle)
            .is_some_and(|rule| rule.accepts(&current))
    }

    /// Whether some rule legalises `from` -> `to`.
    pub fn can_move(&self, from: &Endpoint<S>, to: &Endpoint<S>) -> bool {
        self.skip_validations || self.machine.matching_transition(from, to).is_some()
    }

    /// Apply a transition, optionally running the save cycle.
    ///
    /// A rejected rule leaves the field untouched. When `persist` is set the
    /// rejection is also attached to the record, and the save cycle runs
    /// after a successful assignment. Apart from unusable handles, only
    /// storage failures are errors.
    pub fn attempt(
        &mut self,
        handle: TransitionHandle,
        persist: bool,
    ) -> Result<AttemptOutcome<S>, TransitionError> {
        let (rule, target) = self.resolve(handle)?;

        if !self.can(handle) {
            let violation = self.rejection(&target);
            debug!(transition = %rule.label(), %violation, "transition rejected");
            if persist {
                self.record
                    .add_error(violation.field(), violation.to_string());
            }
            return Ok(AttemptOutcome::Rejected(violation));
        }

        self.assign(&rule, target.clone());
        if persist {
            match self.save_cycle() {
                Ok(()) => {}
                Err(SaveFailure::Invalid(_)) => return Ok(AttemptOutcome::Invalid),
                Err(SaveFailure::Storage(error)) => return Err(error.into()),
            }
        }
        Ok(AttemptOutcome::Transitioned(target))
    }

    /// Apply a transition and save, failing loudly on anything but success.
    pub fn attempt_or_fail(&mut self, handle: TransitionHandle) -> Result<S, TransitionError> {
        let (rule, target) = self.resolve(handle)?;

        if !self.can(handle) {
            let violation = self.rejection(&target);
            debug!(transition = %rule.label(), %violation, "transition rejected");
            self.record
                .add_error(violation.field(), violation.to_string());
            return Err(TransitionError::Rejected(violation));
        }

        self.assign(&rule, target.clone());
        match self.save_cycle() {
            Ok(()) => Ok(target),
            Err(SaveFailure::Invalid(messages)) => Err(PersistError::Invalid(messages).into()),
            Err(SaveFailure::Storage(error)) => Err(error.into()),
        }
    }

    /// Run the save cycle: validate, track if valid, then persist.
    ///
    /// Returns `Ok(false)` when the record was refused as invalid.
    pub fn save(&mut self) -> Result<bool, TransitionError> {
        match self.save_cycle() {
            Ok(()) => Ok(true),
            Err(SaveFailure::Invalid(_)) => Ok(false),
            Err(SaveFailure::Storage(error)) => Err(error.into()),
        }
    }

    fn resolve(
        &self,
        handle: TransitionHandle,
    ) -> Result<(TransitionRule<S>, S), TransitionError> {
        let rule = self
            .machine
            .transition(handle)
            .cloned()
            .ok_or(TransitionError::UnknownTransition {
                index: handle.index(),
            })?;

        match rule.to_state().state() {
            Some(target) => {
                let target = target.clone();
                Ok((rule, target))
            }
            None => Err(TransitionError::WildcardTarget { name: rule.label() }),
        }
    }

    fn rejection(&self, target: &S) -> Violation {
        Violation::InvalidTransition {
            field: self.machine.field().to_string(),
            from: Endpoint::of(self.state().as_ref()).to_string(),
            to: target.name().to_string(),
        }
    }

    fn assign(&mut self, rule: &TransitionRule<S>, target: S) {
        debug!(
            transition = %rule.label(),
            from = %Endpoint::of(self.state().as_ref()),
            to = target.name(),
            "applying transition"
        );
        self.set_state(Some(target));
    }

    fn save_cycle(&mut self) -> Result<(), SaveFailure> {
        self.record.clear_errors();

        let namespace = self.machine.namespace().clone();
        let peers = self.peers.clone();

        let mut checks = vec![self.validate_transition()];
        if let Some(peers) = &peers {
            checks.extend(peers.validate(&namespace, &mut self.record));
        }
        if let Validation::Failure(violations) = Validation::all_vec(checks) {
            return Err(SaveFailure::Invalid(
                violations
                    .iter()
                    .map(|violation| format!("{} {}", violation.field(), violation))
                    .collect(),
            ));
        }

        let mut stamps = self.track_stamps();
        if let Some(peers) = &peers {
            stamps.extend(peers.track(&namespace, &mut self.record));
        }

        match persist_or_undo(&mut self.record, &stamps) {
            Ok(()) => Ok(()),
            Err(PersistError::Invalid(messages)) => Err(SaveFailure::Invalid(messages)),
            Err(error) => {
                warn!(
                    namespace = %namespace,
                    error = %error,
                    "failed to persist record"
                );
                Err(SaveFailure::Storage(error))
            }
        }
    }

    /// Stamp the entry slot of the current state and the changed-at slot.
    ///
    /// A slot is written only if the record can both read and write it and
    /// it was not already updated in this cycle. The entry slot is written
    /// when empty or when the field changed; the changed-at slot only when
    /// the field changed.
    pub fn track_transition(&mut self) {
        self.track_stamps();
    }

    /// Track, returning the slots written with the values they replaced.
    pub(crate) fn track_stamps(&mut self) -> Vec<Stamp> {
        let mut stamps = Vec::new();
        if !self.machine.tracking_enabled() || self.skip_transition_tracking {
            return stamps;
        }

        let machine = Arc::clone(&self.machine);
        let field = machine.field();
        let changed = self.state_changed(ChangeScope::Pending);
        let now = self.clock.now();

        if let Some(state) = self.state() {
            let slot = TimestampSlot::Entered {
                state: state.name(),
                field,
            };
            let empty = self.record.read_timestamp(&slot).is_none();
            if empty || changed {
                stamps.extend(self.stamp(&slot, now));
            }
        }

        if changed {
            stamps.extend(self.stamp(&TimestampSlot::Changed { field }, now));
        }
        stamps
    }

    fn stamp(&mut self, slot: &TimestampSlot<'_>, at: DateTime<Utc>) -> Option<Stamp> {
        if !self.record.can_read_timestamp(slot) || !self.record.can_write_timestamp(slot) {
            return None;
        }
        if self.record.timestamp_changed(slot) {
            trace!(slot = %slot, "slot already updated this cycle");
            return None;
        }
        trace!(slot = %slot, %at, "recorded transition time");
        let stamp = Stamp::new(slot, self.record.read_timestamp(slot));
        self.record.write_timestamp(slot, Some(at));
        Some(stamp)
    }

    /// When the record last entered `state`, if that slot exists and is set.
    pub fn entered_at(&self, state: &S) -> Option<DateTime<Utc>> {
        let slot = TimestampSlot::Entered {
            state: state.name(),
            field: self.machine.field(),
        };
        if self.record.can_read_timestamp(&slot) {
            self.record.read_timestamp(&slot)
        } else {
            None
        }
    }

    /// When the field last changed, if that slot exists and is set.
    pub fn changed_at(&self) -> Option<DateTime<Utc>> {
        let slot = TimestampSlot::Changed {
            field: self.machine.field(),
        };
        if self.record.can_read_timestamp(&slot) {
            self.record.read_timestamp(&slot)
        } else {
            None
        }
    }

    /// Whether the record was in `state` at `at`, judged from entry timestamps.
    pub fn in_state_at(&self, state: &S, at: DateTime<Utc>) -> bool {
        EntryTimeline::new(self.machine.states(), |s: &S| self.entered_at(s))
            .in_state_at(state, at)
    }

    /// Best guess of the state held at `at`.
    pub fn likely_state_at(&self, at: DateTime<Utc>) -> Option<S> {
        EntryTimeline::new(self.machine.states(), |s: &S| self.entered_at(s))
            .likely_state_at(at)
            .cloned()
    }
}
