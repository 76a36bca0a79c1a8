//! Bound traits for the caller-defined state, event, and side-effect domains.
//!
//! The machine never inspects these values beyond equality and hashing, so
//! each trait is a bundle of standard bounds with a blanket implementation.
//! Any enum that derives the listed traits qualifies without extra code.

use std::fmt::Debug;
use std::hash::Hash;

/// A value identifying one configuration of the modeled system.
///
/// # Required Traits
///
/// - `Clone`: states are copied into callbacks and outcomes
/// - `Eq` + `Hash`: states key the transition table and the ending-state set
/// - `Debug`: states appear in logs and errors
/// - `Send` + `Sync`: machines may be moved across threads
///
/// # Example
///
/// ```rust
/// use switchyard::core::State;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// fn assert_state<S: State>() {}
/// assert_state::<Door>();
/// ```
pub trait State: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> State for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// A stimulus submitted to the machine through `fire`.
///
/// Same bounds as [`State`].
pub trait Event: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Event for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Work to perform after a transition, interpreted by the side-effect callback.
///
/// Side effects are shared with the dispatch thread, never compared.
pub trait SideEffect: Debug + Send + Sync + 'static {}

impl<T> SideEffect for T where T: Debug + Send + Sync + 'static {}
