//! Macros for ergonomic transition table construction.

/// Build a [`TransitionTable`](crate::core::TransitionTable) from a list of
/// `(from, event) => to` rules, each optionally followed by `; [side effects]`.
///
/// Later rules for the same `(from, event)` overwrite earlier ones, as with
/// [`TransitionTableBuilder::add_transition`](crate::builder::TransitionTableBuilder::add_transition).
///
/// # Example
///
/// ```
/// use switchyard::transition_table;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Phase { Draft, Review, Done }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Action { Submit, Approve }
///
/// #[derive(Debug)]
/// enum Notice { Reviewer, Author }
///
/// let table = transition_table! {
///     (Phase::Draft, Action::Submit) => Phase::Review; [Notice::Reviewer],
///     (Phase::Review, Action::Approve) => Phase::Done; [Notice::Author, Notice::Reviewer],
///     (Phase::Review, Action::Submit) => Phase::Review,
/// };
///
/// assert_eq!(table.len(), 3);
/// assert_eq!(table.get(&Phase::Review, &Action::Approve).unwrap().side_effects().len(), 2);
/// ```
#[macro_export]
macro_rules! transition_table {
    (
        $(
            ($from:expr, $on:expr) => $to:expr $(; [$($effect:expr),* $(,)?])?
        ),* $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut builder = $crate::builder::TransitionTableBuilder::new();
        $(
            builder.add_transition($from, $to, $on, ::std::vec![$($($effect),*)?]);
        )*
        builder.build()
    }};
}
