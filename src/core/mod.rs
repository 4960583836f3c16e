//! Core vocabulary shared by every layer.
//!
//! - State values via the `State` trait, and the `Endpoint` a rule names
//! - Namespaces separating machines on one record type
//! - Guard descriptors over a record's governed field
//! - Point-in-time queries over recorded entry timestamps
//!
//! Everything here is pure: no record access, no clock.

mod guard;
mod history;
mod namespace;
mod state;

pub use guard::{ChangeScope, Guard};
pub use history::EntryTimeline;
pub use namespace::{Namespace, NAMESPACE_ENV};
pub use state::{Endpoint, State};
