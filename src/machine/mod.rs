//! Evaluated machines.
//!
//! Everything here is the frozen output of the definition phase:
//!
//! - **Transition rules** with wildcard-aware, first-match lookup
//! - **Aliases** with their derived member sets and generated opposites
//! - **Definitions** bundling both with the machine's metadata
//! - **Registries** holding one definition per namespace of a record type
//!
//! Definitions are immutable and safe to share across threads.

mod alias;
mod definition;
mod registry;
pub(crate) mod transition;

pub use alias::{AliasHandle, AliasRule};
pub use definition::{
    AliasDescription, MachineDefinition, MachineDescription, TransitionDescription,
};
pub use registry::MachineRegistry;
pub use transition::{TransitionHandle, TransitionRule};
