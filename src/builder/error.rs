//! Build errors for transition tables and machines.

use thiserror::Error;

/// Errors that can occur when building transition tables and machines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Transition from '{from}' on '{event}' is already registered (targets '{existing}')")]
    DuplicateTransition {
        from: String,
        event: String,
        existing: String,
    },
}
