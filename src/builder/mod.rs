//! Builder API for transition tables and machines.
//!
//! Registration happens here and only here: once a table is built and handed
//! to a [`Machine`](crate::Machine), it is never mutated again.

pub mod error;
pub mod machine;
pub mod macros;
pub mod table;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use table::TransitionTableBuilder;
