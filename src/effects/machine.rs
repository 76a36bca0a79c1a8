//! State machine that dispatches events against a transition table.

use crate::builder::{BuildError, TransitionTableBuilder};
use crate::core::{Event, SideEffect, State, TransitionTable};
use crate::effects::dispatch::{DispatchId, Dispatcher, ThreadDispatcher};
use crate::effects::outcome::{FireError, Fired};
use chrono::Utc;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Callback invoked once per side effect, on the dispatch thread.
pub type SideEffectCallback<SE> = Arc<dyn Fn(&SE) + Send + Sync>;

/// Callback invoked with `(from, to)` on the caller's thread, before the
/// current state changes.
pub type StateChangeCallback<S> = Box<dyn FnMut(&S, &S) + Send>;

/// Finite state machine over a fixed transition table.
///
/// `fire` runs synchronously through lookup, the ending-state check, the
/// state-change callback, and the state update. Side effects of the applied
/// transition are handed to the [`Dispatcher`] and run on another thread;
/// `fire` does not wait for them.
///
/// `fire` takes `&mut self`, so a machine is driven from one thread at a time.
///
/// # Example
///
/// ```rust
/// use switchyard::Machine;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Turnstile { Locked, Unlocked }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Input { Coin, Push }
///
/// let mut machine = Machine::<_, _, ()>::new(
///     Turnstile::Locked,
///     |t| {
///         t.add_transition(Turnstile::Locked, Turnstile::Unlocked, Input::Coin, []);
///         t.add_transition(Turnstile::Unlocked, Turnstile::Locked, Input::Push, []);
///     },
///     [],
/// );
///
/// machine.fire(&Input::Push);
/// assert_eq!(machine.current_state(), &Turnstile::Locked);
///
/// machine.fire(&Input::Coin);
/// assert_eq!(machine.current_state(), &Turnstile::Unlocked);
/// ```
pub struct Machine<S: State, E: Event, SE: SideEffect> {
    current: S,
    table: TransitionTable<S, E, SE>,
    ending_states: HashSet<S>,
    pub(crate) side_effect_callback: SideEffectCallback<SE>,
    pub(crate) state_change_callback: StateChangeCallback<S>,
    pub(crate) dispatcher: Box<dyn Dispatcher>,
}

impl<S: State, E: Event, SE: SideEffect> Machine<S, E, SE> {
    /// Create a machine in `initial`, registering transitions through `build`.
    ///
    /// The builder is consumed once `build` returns; the table cannot be
    /// changed afterwards.
    pub fn new<F, I>(initial: S, build: F, ending_states: I) -> Self
    where
        F: FnOnce(&mut TransitionTableBuilder<S, E, SE>),
        I: IntoIterator<Item = S>,
    {
        let mut builder = TransitionTableBuilder::new();
        build(&mut builder);
        Self::from_table(initial, builder.build(), ending_states)
    }

    /// Like [`new`](Self::new), for registration code that can fail, such as
    /// [`TransitionTableBuilder::try_add_transition`].
    pub fn try_new<F, I>(initial: S, build: F, ending_states: I) -> Result<Self, BuildError>
    where
        F: FnOnce(&mut TransitionTableBuilder<S, E, SE>) -> Result<(), BuildError>,
        I: IntoIterator<Item = S>,
    {
        let mut builder = TransitionTableBuilder::new();
        build(&mut builder)?;
        Ok(Self::from_table(initial, builder.build(), ending_states))
    }

    /// Create a machine over an already built table.
    pub fn from_table<I>(initial: S, table: TransitionTable<S, E, SE>, ending_states: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        Self {
            current: initial,
            table,
            ending_states: ending_states.into_iter().collect(),
            side_effect_callback: Arc::new(|_: &SE| {}),
            state_change_callback: Box::new(|_: &S, _: &S| {}),
            dispatcher: Box::new(ThreadDispatcher::new()),
        }
    }

    /// Replace the dispatcher used for side-effect batches.
    pub fn with_dispatcher<D>(mut self, dispatcher: D) -> Self
    where
        D: Dispatcher + 'static,
    {
        self.dispatcher = Box::new(dispatcher);
        self
    }

    /// Replace the side-effect callback.
    ///
    /// Batches already dispatched keep the callback they were dispatched with.
    pub fn set_side_effect_callback<F>(&mut self, callback: F)
    where
        F: Fn(&SE) + Send + Sync + 'static,
    {
        self.side_effect_callback = Arc::new(callback);
    }

    /// Replace the state-change callback. Takes effect on the next `fire`.
    pub fn set_state_change_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&S, &S) + Send + 'static,
    {
        self.state_change_callback = Box::new(callback);
    }

    /// Get current state
    pub fn current_state(&self) -> &S {
        &self.current
    }

    /// Check if the current state is an ending state
    pub fn is_terminal(&self) -> bool {
        self.ending_states.contains(&self.current)
    }

    /// States that ignore every event
    pub fn ending_states(&self) -> &HashSet<S> {
        &self.ending_states
    }

    /// The transition table this machine was built from
    pub fn table(&self) -> &TransitionTable<S, E, SE> {
        &self.table
    }

    /// Submit an event. Events without an applicable transition are ignored.
    pub fn fire(&mut self, event: &E) {
        self.fire_with(event, || {});
    }

    /// Submit an event, calling `on_complete` on the dispatch thread after
    /// the transition's side effects have run.
    ///
    /// `on_complete` is dropped without being called when the event is
    /// ignored or when the transition has no side effects.
    pub fn fire_with<F>(&mut self, event: &E, on_complete: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(err) = self.try_fire_with(event, on_complete) {
            tracing::trace!(error = %err, "event ignored");
        }
    }

    /// Submit an event, reporting whether it applied.
    pub fn try_fire(&mut self, event: &E) -> Result<Fired<S>, FireError<S, E>> {
        self.try_fire_with(event, || {})
    }

    /// Submit an event with a completion callback, reporting whether it applied.
    ///
    /// The machine is left untouched on `Err`.
    pub fn try_fire_with<F>(
        &mut self,
        event: &E,
        on_complete: F,
    ) -> Result<Fired<S>, FireError<S, E>>
    where
        F: FnOnce() + Send + 'static,
    {
        let events = self
            .table
            .transitions_from(&self.current)
            .ok_or_else(|| FireError::NoTransitionsFrom {
                state: self.current.clone(),
            })?;

        let transition = events
            .get(event)
            .ok_or_else(|| FireError::NoTransitionFor {
                state: self.current.clone(),
                event: event.clone(),
            })?;

        // Ending states are checked after lookup: they may have registrations.
        if self.ending_states.contains(&self.current) {
            return Err(FireError::TerminalState {
                state: self.current.clone(),
            });
        }

        let target = transition.target().clone();
        let side_effects = transition.shared_side_effects();

        (self.state_change_callback)(&self.current, &target);
        let from = std::mem::replace(&mut self.current, target);
        let fired_at = Utc::now();

        tracing::debug!(
            from = ?from,
            to = ?self.current,
            event = ?event,
            side_effects = side_effects.len(),
            "transition applied"
        );

        let count = side_effects.len();
        let dispatch = if side_effects.is_empty() {
            None
        } else {
            Some(self.dispatch_side_effects(side_effects, on_complete))
        };

        Ok(Fired {
            from,
            to: self.current.clone(),
            side_effects: count,
            dispatch,
            fired_at,
        })
    }

    fn dispatch_side_effects<F>(&self, side_effects: Arc<[SE]>, on_complete: F) -> DispatchId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = DispatchId::new();
        let callback = Arc::clone(&self.side_effect_callback);
        let span = tracing::debug_span!("side_effects", dispatch = %id, count = side_effects.len());

        self.dispatcher.dispatch(
            id,
            Box::new(move || {
                let _entered = span.enter();
                for effect in side_effects.iter() {
                    tracing::trace!(effect = ?effect, "running side effect");
                    callback(effect);
                }
                on_complete();
            }),
        );

        id
    }
}

impl<S: State, E: Event, SE: SideEffect> fmt::Debug for Machine<S, E, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("current", &self.current)
            .field("ending_states", &self.ending_states)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::dispatch::{spawn_or_run_inline, InlineDispatcher, Job};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum OrderState {
        Created,
        Paid,
        Shipped,
        Cancelled,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum OrderEvent {
        Pay,
        Ship,
        Cancel,
    }

    #[derive(Clone, PartialEq, Debug)]
    enum OrderEffect {
        ChargeCard,
        SendReceipt,
        NotifyWarehouse,
    }

    fn order_machine() -> Machine<OrderState, OrderEvent, OrderEffect> {
        Machine::new(
            OrderState::Created,
            |t| {
                t.add_transition(
                    OrderState::Created,
                    OrderState::Paid,
                    OrderEvent::Pay,
                    [OrderEffect::ChargeCard, OrderEffect::SendReceipt],
                );
                t.add_transition(
                    OrderState::Created,
                    OrderState::Cancelled,
                    OrderEvent::Cancel,
                    [],
                );
                t.add_transition(
                    OrderState::Paid,
                    OrderState::Shipped,
                    OrderEvent::Ship,
                    [OrderEffect::NotifyWarehouse],
                );
                t.add_transition(
                    OrderState::Shipped,
                    OrderState::Created,
                    OrderEvent::Pay,
                    [],
                );
            },
            [OrderState::Shipped, OrderState::Cancelled],
        )
    }

    /// Holds jobs until the test runs them.
    #[derive(Clone, Default)]
    struct DeferredDispatcher {
        jobs: Arc<Mutex<Vec<Job>>>,
    }

    impl DeferredDispatcher {
        fn run_all(&self) {
            let jobs: Vec<Job> = self.jobs.lock().unwrap().drain(..).collect();
            for job in jobs {
                job();
            }
        }
    }

    impl Dispatcher for DeferredDispatcher {
        fn dispatch(&self, _id: DispatchId, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    /// Spawner that the OS always refuses.
    struct NoThreadsDispatcher;

    impl Dispatcher for NoThreadsDispatcher {
        fn dispatch(&self, id: DispatchId, job: Job) {
            spawn_or_run_inline(id, job, |_job| {
                Err(io::Error::new(io::ErrorKind::Other, "resource temporarily unavailable"))
            });
        }
    }

    #[test]
    fn valid_event_moves_state() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);

        machine.fire(&OrderEvent::Pay);

        assert_eq!(machine.current_state(), &OrderState::Paid);
    }

    #[test]
    fn try_fire_reports_each_rejection_reason() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);

        assert_eq!(
            machine.try_fire(&OrderEvent::Ship).unwrap_err(),
            FireError::NoTransitionFor {
                state: OrderState::Created,
                event: OrderEvent::Ship,
            }
        );

        machine.fire(&OrderEvent::Cancel);
        assert_eq!(
            machine.try_fire(&OrderEvent::Pay).unwrap_err(),
            FireError::NoTransitionsFrom {
                state: OrderState::Cancelled,
            }
        );
    }

    #[test]
    fn ending_state_with_registrations_is_sticky() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);
        machine.fire(&OrderEvent::Pay);
        machine.fire(&OrderEvent::Ship);
        assert!(machine.is_terminal());

        let result = machine.try_fire(&OrderEvent::Pay);

        assert_eq!(
            result.unwrap_err(),
            FireError::TerminalState {
                state: OrderState::Shipped,
            }
        );
        assert_eq!(machine.current_state(), &OrderState::Shipped);
    }

    #[test]
    fn state_change_callback_sees_old_and_new() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        machine.set_state_change_callback(move |from, to| {
            sink.lock().unwrap().push((from.clone(), to.clone()));
        });

        machine.fire(&OrderEvent::Ship);
        machine.fire(&OrderEvent::Pay);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(OrderState::Created, OrderState::Paid)]
        );
    }

    #[test]
    fn side_effects_run_in_order_then_complete() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        machine.set_side_effect_callback(move |effect: &OrderEffect| {
            sink.lock().unwrap().push(format!("{effect:?}"));
        });

        let done = Arc::clone(&log);
        machine.fire_with(&OrderEvent::Pay, move || {
            done.lock().unwrap().push("complete".to_string());
        });

        assert_eq!(
            *log.lock().unwrap(),
            vec!["ChargeCard", "SendReceipt", "complete"]
        );
    }

    #[test]
    fn empty_side_effects_never_complete() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);

        let fired = machine
            .try_fire_with(&OrderEvent::Cancel, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(fired.side_effects, 0);
        assert!(fired.dispatch.is_none());
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejected_event_drops_completion() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&completions);

        machine.fire_with(&OrderEvent::Ship, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert_eq!(machine.current_state(), &OrderState::Created);
    }

    #[test]
    fn fired_records_transition() {
        let mut machine = order_machine().with_dispatcher(InlineDispatcher);

        let fired = machine.try_fire(&OrderEvent::Pay).unwrap();

        assert_eq!(fired.from, OrderState::Created);
        assert_eq!(fired.to, OrderState::Paid);
        assert_eq!(fired.side_effects, 2);
        assert!(fired.dispatch.is_some());
    }

    #[test]
    fn scheduled_batch_keeps_previous_callback() {
        let dispatcher = DeferredDispatcher::default();
        let mut machine = order_machine().with_dispatcher(dispatcher.clone());
        let old_calls = Arc::new(AtomicUsize::new(0));
        let new_calls = Arc::new(AtomicUsize::new(0));

        let old = Arc::clone(&old_calls);
        machine.set_side_effect_callback(move |_: &OrderEffect| {
            old.fetch_add(1, Ordering::SeqCst);
        });
        machine.fire(&OrderEvent::Pay);

        let new = Arc::clone(&new_calls);
        machine.set_side_effect_callback(move |_: &OrderEffect| {
            new.fetch_add(1, Ordering::SeqCst);
        });
        dispatcher.run_all();

        assert_eq!(old_calls.load(Ordering::SeqCst), 2);
        assert_eq!(new_calls.load(Ordering::SeqCst), 0);

        machine.fire(&OrderEvent::Ship);
        dispatcher.run_all();
        assert_eq!(new_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fire_returns_before_side_effects_finish() {
        let dispatcher = DeferredDispatcher::default();
        let mut machine = order_machine().with_dispatcher(dispatcher.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        machine.set_side_effect_callback(move |_: &OrderEffect| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        machine.fire(&OrderEvent::Pay);

        assert_eq!(machine.current_state(), &OrderState::Paid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        dispatcher.run_all();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn default_dispatcher_completes_off_caller_thread() {
        let mut machine = order_machine();
        let caller = std::thread::current().id();
        let (tx, rx) = mpsc::channel();

        machine.fire_with(&OrderEvent::Pay, move || {
            tx.send(std::thread::current().id()).unwrap();
        });

        let completed_on = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(completed_on, caller);
    }

    #[test]
    fn failed_spawn_still_runs_side_effects_and_completion() {
        let mut machine = order_machine().with_dispatcher(NoThreadsDispatcher);
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        machine.set_side_effect_callback(move |effect: &OrderEffect| {
            sink.lock().unwrap().push(format!("{effect:?}"));
        });

        let done = Arc::clone(&log);
        let fired = machine
            .try_fire_with(&OrderEvent::Pay, move || {
                done.lock().unwrap().push("complete".to_string());
            })
            .unwrap();

        assert!(fired.dispatch.is_some());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["ChargeCard", "SendReceipt", "complete"]
        );
    }

    #[test]
    fn try_new_propagates_duplicate_registration() {
        let result = Machine::<OrderState, OrderEvent, OrderEffect>::try_new(
            OrderState::Created,
            |t| {
                t.try_add_transition(OrderState::Created, OrderState::Paid, OrderEvent::Pay, [])?;
                t.try_add_transition(
                    OrderState::Created,
                    OrderState::Cancelled,
                    OrderEvent::Pay,
                    [],
                )?;
                Ok(())
            },
            [],
        );

        assert!(matches!(
            result,
            Err(BuildError::DuplicateTransition { .. })
        ));
    }
}
