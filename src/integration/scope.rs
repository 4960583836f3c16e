//! Scoped suspension of validations and transition tracking.
//!
//! The flags live on the integration context, so each record has its own.
//! A `Bypass` sets one flag and restores its previous value when dropped,
//! including during unwinding, so nesting and early returns behave.

use super::context::IntegrationContext;
use super::record::Record;
use crate::core::State;
use std::ops::{Deref, DerefMut};

#[derive(Clone, Copy, Debug)]
enum Flag {
    Validations,
    TransitionTracking,
}

/// Guard returned by `bypass_validations` and `bypass_transition_tracking`.
///
/// Dereferences to the context it suspends.
pub struct Bypass<'c, S: State, R: Record<S>> {
    context: &'c mut IntegrationContext<S, R>,
    flag: Flag,
    previous: bool,
}

impl<'c, S: State, R: Record<S>> Bypass<'c, S, R> {
    fn engage(context: &'c mut IntegrationContext<S, R>, flag: Flag) -> Self {
        let slot = match flag {
            Flag::Validations => &mut context.skip_validations,
            Flag::TransitionTracking => &mut context.skip_transition_tracking,
        };
        let previous = std::mem::replace(slot, true);
        Self {
            context,
            flag,
            previous,
        }
    }
}

impl<S: State, R: Record<S>> Deref for Bypass<'_, S, R> {
    type Target = IntegrationContext<S, R>;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl<S: State, R: Record<S>> DerefMut for Bypass<'_, S, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl<S: State, R: Record<S>> Drop for Bypass<'_, S, R> {
    fn drop(&mut self) {
        match self.flag {
            Flag::Validations => self.context.skip_validations = self.previous,
            Flag::TransitionTracking => self.context.skip_transition_tracking = self.previous,
        }
    }
}

impl<S: State, R: Record<S>> IntegrationContext<S, R> {
    /// Skip validations until the returned guard is dropped.
    pub fn bypass_validations(&mut self) -> Bypass<'_, S, R> {
        Bypass::engage(self, Flag::Validations)
    }

    /// Skip transition tracking until the returned guard is dropped.
    pub fn bypass_transition_tracking(&mut self) -> Bypass<'_, S, R> {
        Bypass::engage(self, Flag::TransitionTracking)
    }

    /// Run `f` with validations skipped.
    ///
    /// ```
    /// use statebound::builder::{MachineBuilder, MachineOptions, TransitionBuilder};
    /// use statebound::integration::InMemoryRecord;
    /// use statebound::state_enum;
    /// use std::sync::Arc;
    ///
    /// state_enum! {
    ///     enum Door {
    ///         Open => "open",
    ///         Closed => "closed",
    ///     }
    /// }
    ///
    /// let mut builder = MachineBuilder::new(MachineOptions::new().initial(Door::Open));
    /// let close = builder.register_transition(
    ///     TransitionBuilder::named("close").from(Door::Open).to(Door::Closed),
    /// )?;
    /// let machine = Arc::new(builder.evaluate()?);
    ///
    /// let mut door = machine.integration(InMemoryRecord::new());
    /// door.ensure_initial_state();
    /// door.attempt(close, true).unwrap();
    ///
    /// // Reopening has no rule, but can be forced.
    /// let saved = door.without_validation(|door| {
    ///     door.set_state(Some(Door::Open));
    ///     door.save().unwrap()
    /// });
    /// assert!(saved);
    /// assert!(!door.skips_validations());
    /// # Ok::<(), statebound::builder::DefinitionError>(())
    /// ```
    pub fn without_validation<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mut bypass = self.bypass_validations();
        f(&mut *bypass)
    }

    /// Run `f` with transition tracking skipped.
    pub fn without_transition_tracking<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mut bypass = self.bypass_transition_tracking();
        f(&mut *bypass)
    }
}
