//! The capabilities a host record exposes to the engine.
//!
//! A record type implements `HostRecord` once, for everything that does not
//! depend on the state type: change flags, the error sink, the persist hook
//! and timestamp slots. It then implements `Record` once per state type it
//! stores. The engine only ever reaches the record through these traits.
//! Timestamp slots are optional; every slot method has a default meaning
//! "no such slot".

use super::error::PersistError;
use crate::core::{ChangeScope, State};
use chrono::{DateTime, Utc};
use std::fmt;

/// A per-record timestamp column maintained by tracking.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimestampSlot<'a> {
    /// When the record last entered `state`, stored as `<state>_<field>_at`.
    Entered { state: &'a str, field: &'a str },
    /// When the field last changed, stored as `<field>_changed_at`.
    Changed { field: &'a str },
}

impl TimestampSlot<'_> {
    /// Conventional column name of the slot.
    pub fn name(&self) -> String {
        match self {
            TimestampSlot::Entered { state, field } => format!("{state}_{field}_at"),
            TimestampSlot::Changed { field } => format!("{field}_changed_at"),
        }
    }
}

impl fmt::Display for TimestampSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Host-side contract shared by every machine declared on a record type.
pub trait HostRecord {
    /// True until the record has been persisted once.
    fn is_new_record(&self) -> bool;

    fn state_changed(&self, field: &str, scope: ChangeScope) -> bool;

    /// Attach a validation message to the record's error collection.
    fn add_error(&mut self, field: &str, message: String);

    /// Discard messages from an earlier save cycle.
    fn clear_errors(&mut self) {}

    /// Write the record to storage.
    fn persist(&mut self) -> Result<(), PersistError>;

    fn can_read_timestamp(&self, _slot: &TimestampSlot<'_>) -> bool {
        false
    }

    fn can_write_timestamp(&self, _slot: &TimestampSlot<'_>) -> bool {
        false
    }

    fn read_timestamp(&self, _slot: &TimestampSlot<'_>) -> Option<DateTime<Utc>> {
        None
    }

    /// Set or clear a slot. Clearing is used to undo a refused save.
    fn write_timestamp(&mut self, _slot: &TimestampSlot<'_>, _value: Option<DateTime<Utc>>) {}

    /// Whether the slot already holds an unsaved change in this cycle.
    fn timestamp_changed(&self, _slot: &TimestampSlot<'_>) -> bool {
        false
    }
}

/// Typed access to the fields holding states of type `S`.
pub trait Record<S: State>: HostRecord {
    fn read_state(&self, field: &str) -> Option<S>;

    fn write_state(&mut self, field: &str, value: Option<S>);

    /// Value of the field before the change in `scope`.
    fn state_was(&self, field: &str, scope: ChangeScope) -> Option<S>;
}

impl<R: HostRecord + ?Sized> HostRecord for &mut R {
    fn is_new_record(&self) -> bool {
        (**self).is_new_record()
    }

    fn state_changed(&self, field: &str, scope: ChangeScope) -> bool {
        (**self).state_changed(field, scope)
    }

    fn add_error(&mut self, field: &str, message: String) {
        (**self).add_error(field, message)
    }

    fn clear_errors(&mut self) {
        (**self).clear_errors()
    }

    fn persist(&mut self) -> Result<(), PersistError> {
        (**self).persist()
    }

    fn can_read_timestamp(&self, slot: &TimestampSlot<'_>) -> bool {
        (**self).can_read_timestamp(slot)
    }

    fn can_write_timestamp(&self, slot: &TimestampSlot<'_>) -> bool {
        (**self).can_write_timestamp(slot)
    }

    fn read_timestamp(&self, slot: &TimestampSlot<'_>) -> Option<DateTime<Utc>> {
        (**self).read_timestamp(slot)
    }

    fn write_timestamp(&mut self, slot: &TimestampSlot<'_>, value: Option<DateTime<Utc>>) {
        (**self).write_timestamp(slot, value)
    }

    fn timestamp_changed(&self, slot: &TimestampSlot<'_>) -> bool {
        (**self).timestamp_changed(slot)
    }
}

impl<S: State, R: Record<S> + ?Sized> Record<S> for &mut R {
    fn read_state(&self, field: &str) -> Option<S> {
        (**self).read_state(field)
    }

    fn write_state(&mut self, field: &str, value: Option<S>) {
        (**self).write_state(field, value)
    }

    fn state_was(&self, field: &str, scope: ChangeScope) -> Option<S> {
        (**self).state_was(field, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_follow_column_convention() {
        let entered = TimestampSlot::Entered {
            state: "semiactivated",
            field: "state",
        };
        let changed = TimestampSlot::Changed { field: "status" };

        assert_eq!(entered.name(), "semiactivated_state_at");
        assert_eq!(changed.to_string(), "status_changed_at");
    }
}
