//! Switchyard: a declarative finite state machine with fire-and-forget side effects
//!
//! Transitions are registered up front as `(from, event) -> (to, side effects)`
//! rules. The machine is then driven one event at a time with `fire`. Events
//! that match no rule, or arrive while the machine sits in an ending state,
//! are ignored. Side effects of an applied transition run on another thread,
//! in registration order, followed by the caller's completion callback.
//!
//! # Core Concepts
//!
//! - **Transition table**: immutable `(state, event)` lookup built by a builder
//! - **Ending states**: states no transition ever leaves
//! - **Callbacks**: a synchronous state-change callback and an asynchronous
//!   side-effect callback
//!
//! # Example
//!
//! ```rust
//! use switchyard::Machine;
//! use std::sync::mpsc;
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Job { Queued, Running, Done }
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Signal { Start, Finish }
//!
//! #[derive(Debug)]
//! enum Effect { Log(&'static str) }
//!
//! let mut machine = Machine::new(
//!     Job::Queued,
//!     |t| {
//!         t.add_transition(Job::Queued, Job::Running, Signal::Start, [Effect::Log("started")]);
//!         t.add_transition(Job::Running, Job::Done, Signal::Finish, []);
//!     },
//!     [Job::Done],
//! );
//!
//! let (tx, rx) = mpsc::channel();
//! machine.fire_with(&Signal::Start, move || tx.send(()).unwrap());
//! assert_eq!(machine.current_state(), &Job::Running);
//! rx.recv().unwrap(); // side effects finished
//!
//! machine.fire(&Signal::Finish);
//! assert!(machine.is_terminal());
//! ```
//!
//! Completion callbacks only run when the transition has at least one side
//! effect. A transition with none never calls them.

pub mod builder;
pub mod core;
pub mod effects;

// Re-export commonly used types
pub use self::builder::{BuildError, MachineBuilder, TransitionTableBuilder};
pub use self::core::{Event, SideEffect, State, Transition, TransitionTable};
pub use self::effects::{
    ConfigError, DispatchConfig, DispatchId, Dispatcher, FireError, Fired, InlineDispatcher,
    Machine, ThreadDispatcher,
};
