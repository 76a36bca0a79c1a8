//! Outcome of submitting an event to a machine.

use crate::core::{Event, State};
use crate::effects::dispatch::DispatchId;
use chrono::{DateTime, Utc};

/// Record of an applied transition, returned by `try_fire`.
#[derive(Clone, Debug, PartialEq)]
pub struct Fired<S: State> {
    /// The state the machine left
    pub from: S,
    /// The state the machine is now in
    pub to: S,
    /// Number of side effects handed to the dispatcher
    pub side_effects: usize,
    /// Batch identifier, `None` when the transition had no side effects
    pub dispatch: Option<DispatchId>,
    /// When the state changed
    pub fired_at: DateTime<Utc>,
}

/// Why an event left the machine where it was.
///
/// Variants are reported in the order the checks run: source state lookup,
/// event lookup, then the ending-state check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FireError<S: State, E: Event> {
    #[error("No transitions registered from state {state:?}")]
    NoTransitionsFrom { state: S },

    #[error("No transition from state {state:?} on event {event:?}")]
    NoTransitionFor { state: S, event: E },

    #[error("State {state:?} is an ending state")]
    TerminalState { state: S },
}

impl<S: State, E: Event> FireError<S, E> {
    /// The state the machine stayed in.
    pub fn state(&self) -> &S {
        match self {
            Self::NoTransitionsFrom { state }
            | Self::NoTransitionFor { state, .. }
            | Self::TerminalState { state } => state,
        }
    }
}
