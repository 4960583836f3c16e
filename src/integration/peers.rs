//! Save-cycle hooks shared by the machines of one record.

use super::error::{PersistError, Violation};
use super::record::{HostRecord, TimestampSlot};
use crate::core::Namespace;
use chrono::{DateTime, Utc};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

/// A timestamp slot written by tracking, with the value it replaced.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Stamp {
    field: String,
    state: Option<String>,
    previous: Option<DateTime<Utc>>,
}

impl Stamp {
    pub(crate) fn new(slot: &TimestampSlot<'_>, previous: Option<DateTime<Utc>>) -> Self {
        let (field, state) = match slot {
            TimestampSlot::Entered { state, field } => (field, Some(state.to_string())),
            TimestampSlot::Changed { field } => (field, None),
        };
        Self {
            field: field.to_string(),
            state,
            previous,
        }
    }

    pub(crate) fn slot(&self) -> TimestampSlot<'_> {
        match &self.state {
            Some(state) => TimestampSlot::Entered {
                state: state.as_str(),
                field: &self.field,
            },
            None => TimestampSlot::Changed { field: &self.field },
        }
    }

    /// Put the slot back the way it was before tracking wrote it.
    pub(crate) fn undo<H: HostRecord + ?Sized>(&self, record: &mut H) {
        record.write_timestamp(&self.slot(), self.previous);
    }
}

/// The other machines declared on the record a context is bound to.
///
/// A context handed out by a registry carries them so that its save cycle
/// validates and tracks every machine of the record, not only its own.
pub(crate) trait Peers<R>: Send + Sync {
    /// Validate every machine except the one in `own`.
    fn validate(
        &self,
        own: &Namespace,
        record: &mut R,
    ) -> Vec<Validation<(), NonEmptyVec<Violation>>>;

    /// Track every machine except the one in `own`.
    fn track(&self, own: &Namespace, record: &mut R) -> Vec<Stamp>;
}

/// Persist the record, restoring the slots in `stamps` if the save fails.
///
/// A refused save must not leave tracking times behind: the next save would
/// treat them as set by the host and keep them.
pub(crate) fn persist_or_undo<H: HostRecord + ?Sized>(
    record: &mut H,
    stamps: &[Stamp],
) -> Result<(), PersistError> {
    let result = record.persist();
    if result.is_err() && !stamps.is_empty() {
        debug!(slots = stamps.len(), "save failed, restoring tracked slots");
        for stamp in stamps.iter().rev() {
            stamp.undo(record);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::InMemoryRecord;
    use chrono::TimeZone;

    #[test]
    fn stamp_rebuilds_its_slot() {
        let entered = TimestampSlot::Entered {
            state: "hired",
            field: "employment_state",
        };
        let changed = TimestampSlot::Changed { field: "status" };

        assert_eq!(Stamp::new(&entered, None).slot(), entered);
        assert_eq!(Stamp::new(&changed, None).slot(), changed);
    }

    #[test]
    fn failed_persist_restores_slots() {
        let earlier = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();
        let mut record = InMemoryRecord::new()
            .with_timestamp_slot("status_changed_at")
            .with_timestamp_slot("born_status_at");
        record.set_timestamp("status_changed_at", earlier);
        let mut record = record.persisted();

        let changed = TimestampSlot::Changed { field: "status" };
        let entered = TimestampSlot::Entered {
            state: "born",
            field: "status",
        };
        let stamps = vec![
            Stamp::new(&changed, record.read_timestamp(&changed)),
            Stamp::new(&entered, record.read_timestamp(&entered)),
        ];
        record.write_timestamp(&changed, Some(now));
        record.write_timestamp(&entered, Some(now));
        record.reject_with("name", "can't be blank");

        assert!(matches!(
            persist_or_undo(&mut record, &stamps),
            Err(PersistError::Invalid(_))
        ));
        assert_eq!(record.timestamp("status_changed_at"), Some(earlier));
        assert_eq!(record.timestamp("born_status_at"), None);
        assert!(!record.timestamp_changed(&changed));
    }

    #[test]
    fn successful_persist_keeps_slots() {
        let now = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();
        let mut record = InMemoryRecord::new().with_timestamp_slot("status_changed_at");
        let changed = TimestampSlot::Changed { field: "status" };
        let stamps = vec![Stamp::new(&changed, None)];
        record.write_timestamp(&changed, Some(now));

        assert!(persist_or_undo(&mut record, &stamps).is_ok());
        assert_eq!(record.timestamp("status_changed_at"), Some(now));
    }
}
