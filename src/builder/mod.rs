//! Definition-phase API.
//!
//! A machine is declared through a `MachineBuilder`: transitions are
//! registered one at a time and checked against those already present,
//! aliases are collected, and `evaluate()` freezes the result into a
//! read-only `MachineDefinition`.

pub mod alias;
pub mod error;
pub mod machine;
pub mod macros;
pub mod options;
pub mod transition;

pub use alias::AliasBuilder;
pub use error::DefinitionError;
pub use machine::MachineBuilder;
pub use options::MachineOptions;
pub use transition::TransitionBuilder;

use crate::core::State;

/// Start a named transition.
///
/// # Example
///
/// ```
/// use statebound::builder::{transition, MachineBuilder, MachineOptions};
/// use statebound::state_enum;
///
/// state_enum! {
///     enum Factory {
///         Constructed => "constructed",
///     }
/// }
///
/// let mut builder = MachineBuilder::new(MachineOptions::new());
/// builder.register_transition(
///     transition("construct").from(None::<Factory>).to(Factory::Constructed),
/// )?;
/// # Ok::<(), statebound::builder::DefinitionError>(())
/// ```
pub fn transition<S: State>(name: &str) -> TransitionBuilder<S> {
    TransitionBuilder::named(name)
}

/// Start an alias.
pub fn alias<S: State>(name: &str) -> AliasBuilder<S> {
    AliasBuilder::new(name)
}
