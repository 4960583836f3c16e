//! An in-memory record for tests and hosts without storage.

use super::error::PersistError;
use super::record::{HostRecord, Record, TimestampSlot};
use crate::core::{ChangeScope, State};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A state of any type, held behind `Any` so one record can store the
/// fields of several machines.
#[derive(Clone)]
struct StoredState {
    value: Arc<dyn Any + Send + Sync>,
    name: String,
    same: fn(&(dyn Any + Send + Sync), &(dyn Any + Send + Sync)) -> bool,
}

impl StoredState {
    fn new<S: State>(state: S) -> Self {
        Self {
            name: state.name().to_string(),
            same: same_state::<S>,
            value: Arc::new(state),
        }
    }

    fn get<S: State>(&self) -> Option<S> {
        self.value.downcast_ref::<S>().cloned()
    }
}

fn same_state<S: State>(a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool {
    match (a.downcast_ref::<S>(), b.downcast_ref::<S>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl PartialEq for StoredState {
    fn eq(&self, other: &Self) -> bool {
        (self.same)(&*self.value, &*other.value)
    }
}

impl fmt::Debug for StoredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Clone, Debug, Default)]
struct FieldCell {
    current: Option<StoredState>,
    saved: Option<StoredState>,
    /// `(before, after)` of the change committed by the last save.
    last_change: Option<(Option<StoredState>, Option<StoredState>)>,
}

impl FieldCell {
    fn settled(value: Option<StoredState>) -> Self {
        Self {
            current: value.clone(),
            saved: value,
            last_change: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct TimestampCell {
    current: Option<DateTime<Utc>>,
    saved: Option<DateTime<Utc>>,
}

/// A record held entirely in memory.
///
/// Fields may hold states of different types, one type per field. Timestamp
/// slots exist only once declared with `with_timestamp_slot`. `persist`
/// commits pending values the way a storage round-trip would: unsaved
/// changes become the last saved change and the record stops being new.
#[derive(Clone, Debug)]
pub struct InMemoryRecord {
    fields: BTreeMap<String, FieldCell>,
    timestamps: BTreeMap<String, TimestampCell>,
    errors: Vec<(String, String)>,
    rejection: Option<(String, String)>,
    storage_failure: Option<String>,
    new_record: bool,
    saves: usize,
}

impl InMemoryRecord {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            timestamps: BTreeMap::new(),
            errors: Vec::new(),
            rejection: None,
            storage_failure: None,
            new_record: true,
            saves: 0,
        }
    }

    /// Start with `field` holding `value`, as a column default would.
    pub fn with_field<S: State>(mut self, field: &str, value: Option<S>) -> Self {
        self.fields.insert(
            field.to_string(),
            FieldCell::settled(value.map(StoredState::new)),
        );
        self
    }

    /// Declare an empty timestamp slot such as `activated_state_at`.
    pub fn with_timestamp_slot(mut self, name: &str) -> Self {
        self.timestamps
            .insert(name.to_string(), TimestampCell::default());
        self
    }

    /// Mark everything as loaded from storage.
    pub fn persisted(mut self) -> Self {
        self.commit();
        self
    }

    /// Current value of `field`, if it holds a state of type `S`.
    pub fn get<S: State>(&self, field: &str) -> Option<S> {
        self.fields
            .get(field)
            .and_then(|cell| cell.current.as_ref())
            .and_then(|stored| stored.get::<S>())
    }

    pub fn set<S: State>(&mut self, field: &str, value: Option<S>) {
        self.fields.entry(field.to_string()).or_default().current = value.map(StoredState::new);
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.timestamps.get(name).and_then(|cell| cell.current)
    }

    /// Write a timestamp slot directly, declaring it if needed.
    pub fn set_timestamp(&mut self, name: &str, at: DateTime<Utc>) {
        self.timestamps.entry(name.to_string()).or_default().current = Some(at);
    }

    pub fn errors(&self) -> &[(String, String)] {
        &self.errors
    }

    pub fn errors_on(&self, field: &str) -> Vec<String> {
        self.errors
            .iter()
            .filter(|(f, _)| f == field)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn set_new_record(&mut self, new_record: bool) {
        self.new_record = new_record;
    }

    /// Refuse every save with `message` on `field` until `accept` is called.
    pub fn reject_with(&mut self, field: &str, message: &str) {
        self.rejection = Some((field.to_string(), message.to_string()));
    }

    pub fn accept(&mut self) {
        self.rejection = None;
    }

    /// Fail the next persist with a storage error.
    pub fn fail_next_persist(&mut self, message: &str) {
        self.storage_failure = Some(message.to_string());
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn commit(&mut self) {
        for cell in self.fields.values_mut() {
            cell.last_change = (cell.current != cell.saved)
                .then(|| (cell.saved.clone(), cell.current.clone()));
            cell.saved = cell.current.clone();
        }
        for cell in self.timestamps.values_mut() {
            cell.saved = cell.current;
        }
        self.new_record = false;
    }
}

impl Default for InMemoryRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRecord for InMemoryRecord {
    fn is_new_record(&self) -> bool {
        self.new_record
    }

    fn state_changed(&self, field: &str, scope: ChangeScope) -> bool {
        self.fields.get(field).is_some_and(|cell| match scope {
            ChangeScope::Pending => cell.current != cell.saved,
            ChangeScope::Previous => cell.last_change.is_some(),
        })
    }

    fn add_error(&mut self, field: &str, message: String) {
        self.errors.push((field.to_string(), message));
    }

    fn clear_errors(&mut self) {
        self.errors.clear();
    }

    fn persist(&mut self) -> Result<(), PersistError> {
        if let Some(message) = self.storage_failure.take() {
            return Err(PersistError::Storage(message.into()));
        }
        if let Some((field, message)) = &self.rejection {
            self.errors.push((field.clone(), message.clone()));
        }
        if !self.errors.is_empty() {
            return Err(PersistError::Invalid(
                self.errors
                    .iter()
                    .map(|(field, message)| format!("{field} {message}"))
                    .collect(),
            ));
        }

        self.commit();
        self.saves += 1;
        Ok(())
    }

    fn can_read_timestamp(&self, slot: &TimestampSlot<'_>) -> bool {
        self.timestamps.contains_key(&slot.name())
    }

    fn can_write_timestamp(&self, slot: &TimestampSlot<'_>) -> bool {
        self.timestamps.contains_key(&slot.name())
    }

    fn read_timestamp(&self, slot: &TimestampSlot<'_>) -> Option<DateTime<Utc>> {
        self.timestamp(&slot.name())
    }

    fn write_timestamp(&mut self, slot: &TimestampSlot<'_>, value: Option<DateTime<Utc>>) {
        if let Some(cell) = self.timestamps.get_mut(&slot.name()) {
            cell.current = value;
        }
    }

    fn timestamp_changed(&self, slot: &TimestampSlot<'_>) -> bool {
        self.timestamps
            .get(&slot.name())
            .is_some_and(|cell| cell.current != cell.saved)
    }
}

impl<S: State> Record<S> for InMemoryRecord {
    fn read_state(&self, field: &str) -> Option<S> {
        self.get(field)
    }

    fn write_state(&mut self, field: &str, value: Option<S>) {
        self.set(field, value);
    }

    fn state_was(&self, field: &str, scope: ChangeScope) -> Option<S> {
        let cell = self.fields.get(field)?;
        let before = match scope {
            ChangeScope::Pending => cell.saved.as_ref(),
            ChangeScope::Previous => match &cell.last_change {
                Some((before, _)) => before.as_ref(),
                None => cell.saved.as_ref(),
            },
        };
        before.and_then(|stored| stored.get::<S>())
    }
}
