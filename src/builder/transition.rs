//! Builder for constructing transition rows.

use crate::builder::error::BuildError;
use crate::core::{Event, EventEnvelope, Guard, State};
use crate::table::{Action, EventMatcher, SourceMatcher, Target, Transition};

/// Builder for one transition row with a fluent API.
///
/// Source, event and target are required. Repeated calls to
/// [`guard`](Self::guard)/[`when`](Self::when) are combined with a logical
/// AND; repeated actions run in the order they were added.
///
/// # Example
///
/// ```rust
/// use stateloom::builder::TransitionBuilder;
/// use stateloom::core::EventEnvelope;
/// use stateloom::state_enum;
///
/// state_enum! {
///     enum Pump {
///         Idle,
///         Running,
///     }
/// }
///
/// #[derive(Debug)]
/// struct Prime {
///     litres: u32,
/// }
///
/// let row = TransitionBuilder::<Pump, u32>::new()
///     .from(Pump::Idle)
///     .on::<Prime>()
///     .to(Pump::Running)
///     .when(|level: &u32, _: &EventEnvelope| *level > 10)
///     .with_action(|level: &mut u32, prime: &Prime| *level -= prime.litres)
///     .build()
///     .unwrap();
///
/// assert!(row.can_fire(&Pump::Idle, &20, &EventEnvelope::new(Prime { litres: 5 })).unwrap());
/// assert!(!row.can_fire(&Pump::Idle, &5, &EventEnvelope::new(Prime { litres: 5 })).unwrap());
/// ```
pub struct TransitionBuilder<S, C> {
    source: Option<SourceMatcher<S>>,
    event: Option<EventMatcher>,
    target: Option<Target<S>>,
    action: Option<Action<C>>,
    guard: Option<Guard<C>>,
}

impl<S: State, C: 'static> TransitionBuilder<S, C> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            source: None,
            event: None,
            target: None,
            action: None,
            guard: None,
        }
    }

    /// Fire from `state` only.
    pub fn from(mut self, state: S) -> Self {
        self.source = Some(SourceMatcher::State(state));
        self
    }

    /// Fire from whichever state is active.
    pub fn from_any(mut self) -> Self {
        self.source = Some(SourceMatcher::Any);
        self
    }

    pub fn from_any_of(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.source = Some(SourceMatcher::AnyOf(states.into_iter().collect()));
        self
    }

    pub fn from_any_but(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.source = Some(SourceMatcher::AnyBut(states.into_iter().collect()));
        self
    }

    /// Trigger on events of type `E`.
    pub fn on<E: Event>(mut self) -> Self {
        self.event = Some(EventMatcher::is::<E>());
        self
    }

    /// Trigger on any external event.
    pub fn on_any(mut self) -> Self {
        self.event = Some(EventMatcher::Any);
        self
    }

    /// Make this a completion transition.
    pub fn on_completion(mut self) -> Self {
        self.event = Some(EventMatcher::Null);
        self
    }

    /// Trigger on a composed matcher.
    pub fn on_matching(mut self, matcher: EventMatcher) -> Self {
        self.event = Some(matcher);
        self
    }

    /// External transition to `state`.
    pub fn to(mut self, state: S) -> Self {
        self.target = Some(Target::State(state));
        self
    }

    /// Internal transition: run the action without leaving the source.
    pub fn internal(mut self) -> Self {
        self.target = Some(Target::Internal);
        self
    }

    /// Leave the source and finish the region.
    pub fn to_final(mut self) -> Self {
        self.target = Some(Target::Final);
        self
    }

    /// Add a prebuilt action.
    pub fn action(mut self, action: Action<C>) -> Self {
        self.action = Some(match self.action.take() {
            Some(first) => first.then(action),
            None => action,
        });
        self
    }

    /// Add an action over the triggering event.
    pub fn with_action<E, F>(self, action: F) -> Self
    where
        E: Event,
        F: Fn(&mut C, &E) + Send + Sync + 'static,
    {
        self.action(Action::on::<E, F>(action))
    }

    /// Add a prebuilt guard.
    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guard = Some(match self.guard.take() {
            Some(first) => first.and(guard),
            None => guard,
        });
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&C, &EventEnvelope) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S, C>, BuildError> {
        let source = self.source.ok_or(BuildError::MissingSource)?;
        let event = self.event.ok_or(BuildError::MissingEvent)?;
        let target = self.target.ok_or(BuildError::MissingTarget)?;

        Ok(Transition {
            source,
            event,
            target,
            action: self.action,
            guard: self.guard,
        })
    }
}

impl<S: State, C: 'static> Default for TransitionBuilder<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
