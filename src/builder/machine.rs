//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::builder::table::TransitionTableBuilder;
use crate::core::{Event, SideEffect, State, TransitionTable};
use crate::effects::{Dispatcher, Machine, SideEffectCallback, StateChangeCallback};
use std::sync::Arc;

/// Builder for constructing machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use switchyard::builder::MachineBuilder;
/// use switchyard::effects::InlineDispatcher;
///
/// let machine = MachineBuilder::<&str, &str, ()>::new()
///     .initial("draft")
///     .transition("draft", "published", "publish", [])
///     .ending_state("published")
///     .dispatcher(InlineDispatcher)
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.current_state(), &"draft");
/// ```
pub struct MachineBuilder<S: State, E: Event, SE: SideEffect> {
    initial: Option<S>,
    table: TransitionTableBuilder<S, E, SE>,
    ending_states: Vec<S>,
    dispatcher: Option<Box<dyn Dispatcher>>,
    side_effect_callback: Option<SideEffectCallback<SE>>,
    state_change_callback: Option<StateChangeCallback<S>>,
}

impl<S: State, E: Event, SE: SideEffect> MachineBuilder<S, E, SE> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            table: TransitionTableBuilder::new(),
            ending_states: Vec::new(),
            dispatcher: None,
            side_effect_callback: None,
            state_change_callback: None,
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Register a transition, overwriting an earlier one for the same pair.
    pub fn transition<I>(mut self, from: S, to: S, on: E, side_effects: I) -> Self
    where
        I: IntoIterator<Item = SE>,
    {
        self.table.add_transition(from, to, on, side_effects);
        self
    }

    /// Register a transition, failing on a duplicate pair.
    pub fn try_transition<I>(
        mut self,
        from: S,
        to: S,
        on: E,
        side_effects: I,
    ) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = SE>,
    {
        self.table.try_add_transition(from, to, on, side_effects)?;
        Ok(self)
    }

    /// Register transitions through a closure.
    pub fn transitions<F>(mut self, register: F) -> Self
    where
        F: FnOnce(&mut TransitionTableBuilder<S, E, SE>),
    {
        register(&mut self.table);
        self
    }

    /// Start from an existing table. Replaces anything registered so far.
    pub fn table(mut self, table: TransitionTable<S, E, SE>) -> Self {
        self.table = TransitionTableBuilder::from(table);
        self
    }

    /// Mark a state as ending.
    pub fn ending_state(mut self, state: S) -> Self {
        self.ending_states.push(state);
        self
    }

    /// Mark several states as ending.
    pub fn ending_states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        self.ending_states.extend(states);
        self
    }

    /// Use a dispatcher other than the default thread-per-batch one.
    pub fn dispatcher<D>(mut self, dispatcher: D) -> Self
    where
        D: Dispatcher + 'static,
    {
        self.dispatcher = Some(Box::new(dispatcher));
        self
    }

    /// Callback run on the dispatch thread for each side effect
    pub fn on_side_effect<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SE) + Send + Sync + 'static,
    {
        self.side_effect_callback = Some(Arc::new(callback));
        self
    }

    /// Callback run synchronously inside `fire` with the old and new state
    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&S, &S) + Send + 'static,
    {
        self.state_change_callback = Some(Box::new(callback));
        self
    }

    /// Build the machine.
    /// Returns an error if the initial state is missing.
    pub fn build(self) -> Result<Machine<S, E, SE>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        let mut machine = Machine::from_table(initial, self.table.build(), self.ending_states);
        if let Some(dispatcher) = self.dispatcher {
            machine.dispatcher = dispatcher;
        }
        if let Some(callback) = self.side_effect_callback {
            machine.side_effect_callback = callback;
        }
        if let Some(callback) = self.state_change_callback {
            machine.state_change_callback = callback;
        }

        Ok(machine)
    }
}

impl<S: State, E: Event, SE: SideEffect> Default for MachineBuilder<S, E, SE> {
    fn default() -> Self {
        Self::new()
    }
}
