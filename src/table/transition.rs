//! Transition rows and first-match-wins table resolution.

use super::matcher::{EventMatcher, SourceMatcher};
use crate::core::{BoxError, Event, EventEnvelope, Guard, State};
use std::sync::Arc;

type Callback<C> = dyn Fn(&mut C, &EventEnvelope) -> Result<(), BoxError> + Send + Sync;

/// Side effect attached to a transition row or a state reaction.
///
/// Actions receive the machine context mutably and the event being
/// dispatched. Cloning an action is cheap.
pub struct Action<C> {
    callback: Arc<Callback<C>>,
}

impl<C: 'static> Action<C> {
    /// Create an action from an infallible closure.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut C, &EventEnvelope) + Send + Sync + 'static,
    {
        Self::fallible(move |ctx, event| {
            callback(ctx, event);
            Ok(())
        })
    }

    /// Create an action whose execution may fail.
    pub fn fallible<F>(callback: F) -> Self
    where
        F: Fn(&mut C, &EventEnvelope) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Create an action over a specific event type.
    ///
    /// The action does nothing when dispatched with any other event type.
    pub fn on<E, F>(callback: F) -> Self
    where
        E: Event,
        F: Fn(&mut C, &E) + Send + Sync + 'static,
    {
        Self::new(move |ctx, event| {
            if let Some(event) = event.downcast_ref::<E>() {
                callback(ctx, event);
            }
        })
    }

    /// Run `self`, then `next`. Stops at the first failure.
    pub fn then(self, next: Action<C>) -> Self {
        Self::fallible(move |ctx, event| {
            self.run(ctx, event)?;
            next.run(ctx, event)
        })
    }

    /// Execute the action.
    pub fn run(&self, ctx: &mut C, event: &EventEnvelope) -> Result<(), BoxError> {
        (self.callback)(ctx, event)
    }
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Where a transition row leads.
#[derive(Clone, Debug, PartialEq)]
pub enum Target<S> {
    /// External transition: exit the source, enter this state.
    State(S),
    /// Internal transition: run the action only, no exit or entry.
    Internal,
    /// Exit the source and mark the region as finished.
    Final,
}

/// One row of a transition table.
pub struct Transition<S, C> {
    pub source: SourceMatcher<S>,
    pub event: EventMatcher,
    pub target: Target<S>,
    pub action: Option<Action<C>>,
    pub guard: Option<Guard<C>>,
}

impl<S: State, C: 'static> Transition<S, C> {
    /// Check whether this row fires for the active state and event.
    ///
    /// The guard is only evaluated when both the source and the event match.
    pub fn can_fire(&self, active: &S, ctx: &C, event: &EventEnvelope) -> Result<bool, BoxError> {
        if !self.source.matches(active) || !self.event.matches(event) {
            return Ok(false);
        }

        match &self.guard {
            Some(guard) => guard.check(ctx, event),
            None => Ok(true),
        }
    }
}

impl<S: Clone, C> Clone for Transition<S, C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            event: self.event.clone(),
            target: self.target.clone(),
            action: self.action.clone(),
            guard: self.guard.clone(),
        }
    }
}

/// Row target with the state resolved to a slot index of its region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolved {
    State(usize),
    Internal,
    Final,
}

/// Ordered transition rows of one region.
pub(crate) struct TransitionTable<S, C> {
    rows: Vec<Transition<S, C>>,
    targets: Vec<Resolved>,
}

impl<S: State, C: 'static> TransitionTable<S, C> {
    /// Resolve every row target against the region's declared states.
    ///
    /// Returns the first target that names an undeclared state.
    pub(crate) fn compile(rows: Vec<Transition<S, C>>, states: &[S]) -> Result<Self, S> {
        let targets = rows
            .iter()
            .map(|row| match &row.target {
                Target::State(s) => states
                    .iter()
                    .position(|declared| declared == s)
                    .map(Resolved::State)
                    .ok_or_else(|| s.clone()),
                Target::Internal => Ok(Resolved::Internal),
                Target::Final => Ok(Resolved::Final),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows, targets })
    }

    /// Find the first row that fires, in declaration order.
    pub(crate) fn resolve(
        &self,
        active: &S,
        ctx: &C,
        event: &EventEnvelope,
    ) -> Result<Option<usize>, BoxError> {
        for (index, row) in self.rows.iter().enumerate() {
            if row.can_fire(active, ctx, event)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Dry-run variant of [`resolve`](Self::resolve); a failing guard counts
    /// as a rejection.
    pub(crate) fn accepts(&self, active: &S, ctx: &C, event: &EventEnvelope) -> bool {
        self.rows
            .iter()
            .any(|row| row.can_fire(active, ctx, event).unwrap_or(false))
    }

    pub(crate) fn target(&self, row: usize) -> Resolved {
        self.targets[row]
    }

    pub(crate) fn action(&self, row: usize) -> Option<&Action<C>> {
        self.rows[row].action.as_ref()
    }
}
