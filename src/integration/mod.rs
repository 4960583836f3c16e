//! Binding evaluated machines to live records.
//!
//! A host record exposes its change tracking, error sink, persist hook and
//! optional timestamp slots through [`HostRecord`], and its governed fields
//! through [`Record`]. An [`IntegrationContext`] pairs one record with one
//! machine and provides:
//!
//! - **Validation** of the unsaved change, accumulating violations
//! - **Transitions** by handle, with or without a save cycle
//! - **Tracking** of entry and change timestamps
//! - **History** queries over entry timestamps
//! - **Scoped bypasses** of validation and tracking

mod clock;
mod context;
mod error;
mod memory;
mod peers;
mod record;
mod scope;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{AttemptOutcome, IntegrationContext};
pub use error::{PersistError, TransitionError, Violation};
pub use memory::InMemoryRecord;
pub use record::{HostRecord, Record, TimestampSlot};
pub use scope::Bypass;

pub(crate) use peers::{persist_or_undo, Peers, Stamp};
