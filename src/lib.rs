//! Statebound: declarative state machines bound to record fields
//!
//! A machine governs one field of a stateful record. It is declared once,
//! up front, as a set of transition rules and aliases, then evaluated into
//! an immutable definition that every record of the type shares. Records
//! are reached only through the [`integration::HostRecord`] and
//! [`integration::Record`] traits, so any storage layer can host a machine.
//!
//! # Core Concepts
//!
//! - **States and endpoints**: type-safe states via the `State` trait, plus
//!   the `Any` wildcard and the empty field
//! - **Transition rules**: named or anonymous moves, checked for ambiguity
//!   when declared and matched in declaration order
//! - **Aliases**: named state sets with optional negation and opposites
//! - **Integration**: validation of pending changes, guarded transitions,
//!   entry timestamp tracking and historical queries
//!
//! # Example
//!
//! ```rust
//! use statebound::builder::{transition, MachineBuilder, MachineOptions};
//! use statebound::integration::InMemoryRecord;
//! use statebound::state_enum;
//! use std::sync::Arc;
//!
//! state_enum! {
//!     enum Account {
//!         Pending => "pending",
//!         Active => "active",
//!         Closed => "closed",
//!     }
//! }
//!
//! let mut builder = MachineBuilder::new(MachineOptions::new().initial(Account::Pending));
//! let activate = builder.register_transition(
//!     transition("activate").from(Account::Pending).to(Account::Active),
//! )?;
//! builder.register_transition(transition("close").from_any().to(Account::Closed))?;
//! let machine = Arc::new(builder.evaluate()?);
//!
//! let mut account = machine.integration(InMemoryRecord::new());
//! account.ensure_initial_state();
//! assert!(account.can(activate));
//!
//! account.attempt(activate, true).unwrap();
//! assert!(account.is_in(&Account::Active));
//! assert!(!account.can(activate));
//! # Ok::<(), statebound::builder::DefinitionError>(())
//! ```

pub mod builder;
pub mod core;
pub mod integration;
pub mod machine;

// Re-export commonly used types
pub use builder::{
    AliasBuilder, DefinitionError, MachineBuilder, MachineOptions, TransitionBuilder,
};
pub use core::{ChangeScope, Endpoint, Guard, Namespace, State};
pub use integration::{
    AttemptOutcome, HostRecord, InMemoryRecord, IntegrationContext, Record, TransitionError,
    Violation,
};
pub use machine::{AliasHandle, MachineDefinition, MachineRegistry, TransitionHandle};
