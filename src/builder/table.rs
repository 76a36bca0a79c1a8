//! Builder for constructing transition tables.

use crate::builder::error::BuildError;
use crate::core::{Event, SideEffect, State, Transition, TransitionTable};
use std::collections::HashMap;

/// Accumulates transition registrations before a machine starts.
///
/// Registering the same (from, on) pair twice with [`add_transition`](Self::add_transition)
/// keeps the later registration. Use [`try_add_transition`](Self::try_add_transition)
/// to reject duplicates instead.
///
/// # Example
///
/// ```rust
/// use switchyard::builder::TransitionTableBuilder;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Light { Red, Green }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Tick { Next }
///
/// #[derive(Debug)]
/// enum Lamp { Switch }
///
/// let mut builder = TransitionTableBuilder::new();
/// builder
///     .add_transition(Light::Red, Light::Green, Tick::Next, [Lamp::Switch])
///     .add_transition(Light::Green, Light::Red, Tick::Next, [Lamp::Switch]);
/// let table = builder.build();
///
/// assert_eq!(table.len(), 2);
/// ```
pub struct TransitionTableBuilder<S: State, E: Event, SE: SideEffect> {
    entries: HashMap<S, HashMap<E, Transition<S, SE>>>,
}

impl<S: State, E: Event, SE: SideEffect> TransitionTableBuilder<S, E, SE> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `from --on--> to`, overwriting any earlier registration for
    /// the same (from, on) pair. Pass `[]` for a transition without side effects.
    pub fn add_transition<I>(&mut self, from: S, to: S, on: E, side_effects: I) -> &mut Self
    where
        I: IntoIterator<Item = SE>,
    {
        let transition = Transition::new(to, side_effects.into_iter().collect());
        let events = self.entries.entry(from).or_default();
        if let Some(previous) = events.get(&on) {
            tracing::debug!(
                event = ?on,
                replaced = ?previous.target(),
                target = ?transition.target(),
                "overwriting registered transition"
            );
        }
        events.insert(on, transition);
        self
    }

    /// Register `from --on--> to`, failing if the pair is already registered.
    pub fn try_add_transition<I>(
        &mut self,
        from: S,
        to: S,
        on: E,
        side_effects: I,
    ) -> Result<&mut Self, BuildError>
    where
        I: IntoIterator<Item = SE>,
    {
        if let Some(existing) = self.entries.get(&from).and_then(|events| events.get(&on)) {
            return Err(BuildError::DuplicateTransition {
                from: format!("{from:?}"),
                event: format!("{on:?}"),
                existing: format!("{:?}", existing.target()),
            });
        }
        Ok(self.add_transition(from, to, on, side_effects))
    }

    /// Number of (state, event) pairs registered so far.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// True when nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish registration.
    pub fn build(self) -> TransitionTable<S, E, SE> {
        TransitionTable::from_entries(self.entries)
    }
}

impl<S: State, E: Event, SE: SideEffect> From<TransitionTable<S, E, SE>>
    for TransitionTableBuilder<S, E, SE>
{
    /// Reopen a table, e.g. one produced by `transition_table!`, for more registrations.
    fn from(table: TransitionTable<S, E, SE>) -> Self {
        Self {
            entries: table.into_entries(),
        }
    }
}

impl<S: State, E: Event, SE: SideEffect> Default for TransitionTableBuilder<S, E, SE> {
    fn default() -> Self {
        Self::new()
    }
}
