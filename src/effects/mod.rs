//! The imperative shell around the transition table.
//!
//! # Key Concepts
//!
//! - **Machine**: holds the current state and applies events synchronously
//! - **Dispatcher**: runs each transition's side effects off the caller's thread
//! - **Outcome**: optional report of whether an event applied, and why not

mod dispatch;
mod machine;
mod outcome;

pub use dispatch::{
    ConfigError, DispatchConfig, DispatchId, Dispatcher, InlineDispatcher, Job, ThreadDispatcher,
};
pub use machine::{Machine, SideEffectCallback, StateChangeCallback};
pub use outcome::{FireError, Fired};
