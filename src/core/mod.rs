//! Core state machine types.
//!
//! This module contains the pure data model of the machine:
//! - Bound traits for the caller's state, event, and side-effect types
//! - The immutable transition table
//!
//! Nothing here spawns threads or invokes callbacks; that lives in
//! [`effects`](crate::effects).

mod state;
mod table;

pub use state::{Event, SideEffect, State};
pub use table::{Transition, TransitionTable};
