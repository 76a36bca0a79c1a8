//! Immutable transition table.
//!
//! A table maps a source state to the events it reacts to, and each
//! (state, event) pair to a target state plus an ordered side-effect list.
//! Tables are produced by [`TransitionTableBuilder`](crate::builder::TransitionTableBuilder)
//! and never mutated afterwards.

use super::state::{Event, SideEffect, State};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Target of a registered (state, event) pair.
///
/// The side-effect list is shared, so dispatching it to another thread
/// costs a reference count rather than a copy.
pub struct Transition<S: State, SE: SideEffect> {
    target: S,
    side_effects: Arc<[SE]>,
}

impl<S: State, SE: SideEffect> Transition<S, SE> {
    pub(crate) fn new(target: S, side_effects: Vec<SE>) -> Self {
        Self {
            target,
            side_effects: side_effects.into(),
        }
    }

    /// State the machine moves to when this transition applies.
    pub fn target(&self) -> &S {
        &self.target
    }

    /// Side effects in registration order.
    pub fn side_effects(&self) -> &[SE] {
        &self.side_effects
    }

    pub(crate) fn shared_side_effects(&self) -> Arc<[SE]> {
        Arc::clone(&self.side_effects)
    }
}

impl<S: State, SE: SideEffect> Clone for Transition<S, SE> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            side_effects: Arc::clone(&self.side_effects),
        }
    }
}

impl<S: State, SE: SideEffect> fmt::Debug for Transition<S, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .field("side_effects", &self.side_effects)
            .finish()
    }
}

/// Mapping from (source state, event) to [`Transition`].
///
/// # Example
///
/// ```rust
/// use switchyard::builder::TransitionTableBuilder;
///
/// let mut builder = TransitionTableBuilder::<&str, &str, ()>::new();
/// builder.add_transition("locked", "unlocked", "coin", []);
/// let table = builder.build();
///
/// assert_eq!(table.get(&"locked", &"coin").map(|t| *t.target()), Some("unlocked"));
/// assert!(table.get(&"locked", &"push").is_none());
/// ```
pub struct TransitionTable<S: State, E: Event, SE: SideEffect> {
    entries: HashMap<S, HashMap<E, Transition<S, SE>>>,
}

impl<S: State, E: Event, SE: SideEffect> TransitionTable<S, E, SE> {
    pub(crate) fn from_entries(entries: HashMap<S, HashMap<E, Transition<S, SE>>>) -> Self {
        Self { entries }
    }

    pub(crate) fn into_entries(self) -> HashMap<S, HashMap<E, Transition<S, SE>>> {
        self.entries
    }

    /// Create a table with no transitions. A machine over it absorbs every event.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// All events registered for `state`, or `None` when the state has no
    /// outgoing transitions.
    pub fn transitions_from(&self, state: &S) -> Option<&HashMap<E, Transition<S, SE>>> {
        self.entries.get(state)
    }

    /// Look up the transition for a (state, event) pair.
    pub fn get(&self, state: &S, event: &E) -> Option<&Transition<S, SE>> {
        self.entries.get(state).and_then(|events| events.get(event))
    }

    /// Whether a transition is registered for the pair.
    pub fn contains(&self, state: &S, event: &E) -> bool {
        self.get(state, event).is_some()
    }

    /// Source states with at least one registered transition.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.entries.keys()
    }

    /// Number of registered (state, event) pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// True when no transition is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: State, E: Event, SE: SideEffect> Default for TransitionTable<S, E, SE> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: State, E: Event, SE: SideEffect> fmt::Debug for TransitionTable<S, E, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionTable")
            .field("entries", &self.entries)
            .finish()
    }
}
