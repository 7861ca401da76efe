//! Builder API for declaring machines.
//!
//! This module provides fluent builders for transitions, regions and
//! machines, plus shorthands for the most common rows. Everything declared
//! here is checked when the machine is built; nothing is validated lazily at
//! dispatch time.

mod error;
mod machine;
mod macros;
mod region;
mod transition;
mod validate;

pub use error::{BuildError, TableViolation};
pub use machine::MachineBuilder;
pub use region::RegionBuilder;
pub use transition::TransitionBuilder;

use crate::core::State;

/// Start an external transition from `from` to `to`.
///
/// The triggering event still has to be named with
/// [`on`](TransitionBuilder::on) (or another `on_*` method).
///
/// # Example
///
/// ```
/// use stateloom::builder::transition;
/// use stateloom::core::EventEnvelope;
/// use stateloom::state_enum;
///
/// state_enum! {
///     enum Door {
///         Closed,
///         Open,
///     }
/// }
///
/// #[derive(Debug)]
/// struct Push;
///
/// let row = transition::<Door, ()>(Door::Closed, Door::Open)
///     .on::<Push>()
///     .build()
///     .unwrap();
/// assert!(row.can_fire(&Door::Closed, &(), &EventEnvelope::new(Push)).unwrap());
/// ```
pub fn transition<S: State, C: 'static>(from: S, to: S) -> TransitionBuilder<S, C> {
    TransitionBuilder::new().from(from).to(to)
}

/// Completion transition from `from` to `to`, taken as soon as `from` is
/// complete.
pub fn completion<S: State, C: 'static>(from: S, to: S) -> TransitionBuilder<S, C> {
    TransitionBuilder::new().from(from).on_completion().to(to)
}

/// Internal transition of `state`: the action runs, the state is neither
/// exited nor re-entered.
///
/// # Example
///
/// ```
/// use stateloom::builder::internal;
/// use stateloom::state_enum;
/// use stateloom::table::Target;
///
/// state_enum! {
///     enum Meter {
///         Counting,
///     }
/// }
///
/// #[derive(Debug)]
/// struct Pulse;
///
/// let row = internal::<Meter, u64>(Meter::Counting)
///     .on::<Pulse>()
///     .with_action(|count: &mut u64, _: &Pulse| *count += 1)
///     .build()
///     .unwrap();
/// assert_eq!(row.target, Target::Internal);
/// ```
pub fn internal<S: State, C: 'static>(state: S) -> TransitionBuilder<S, C> {
    TransitionBuilder::new().from(state).internal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventEnvelope;
    use crate::table::Target;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Start,
        Middle,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Middle => "Middle",
            }
        }
    }

    #[derive(Debug)]
    struct Next;

    #[test]
    fn transition_shorthand_needs_an_event() {
        let result = transition::<TestState, ()>(TestState::Start, TestState::Middle).build();
        assert!(matches!(result, Err(BuildError::MissingEvent)));

        let row = transition::<TestState, ()>(TestState::Start, TestState::Middle)
            .on::<Next>()
            .build()
            .unwrap();
        assert_eq!(row.target, Target::State(TestState::Middle));
    }

    #[test]
    fn completion_shorthand_matches_only_completion() {
        let row = completion::<TestState, ()>(TestState::Start, TestState::Middle)
            .build()
            .unwrap();

        assert!(row.event.is_completion());
        assert!(!row
            .can_fire(&TestState::Start, &(), &EventEnvelope::new(Next))
            .unwrap());
    }

    #[test]
    fn internal_shorthand_keeps_the_state() {
        let row = internal::<TestState, ()>(TestState::Middle)
            .on::<Next>()
            .build()
            .unwrap();

        assert_eq!(row.target, Target::Internal);
        assert!(row.source.matches(&TestState::Middle));
    }
}
