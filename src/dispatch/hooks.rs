//! Optional observation and recovery hooks.

use crate::core::{EventEnvelope, Failure, State};

/// One end of a transition as seen by hooks.
#[derive(Clone, Debug, PartialEq)]
pub enum Vertex<S> {
    /// The region's stopped pseudo-state.
    Stopped,
    /// A declared state.
    State(S),
    /// The region's final pseudo-state.
    Final,
}

/// Transition details passed to the pre- and post-transition hooks.
#[derive(Clone, Debug)]
pub struct TransitionInfo<'a, S> {
    /// Path of the region taking the transition, e.g. `main/Blinking/lamp`.
    pub region: &'a str,
    pub source: Vertex<S>,
    pub target: Vertex<S>,
    pub event: &'a EventEnvelope,
}

/// Verdict of the failure hook.
#[derive(Debug)]
pub enum Recovery {
    /// The failure was dealt with; carry on with the next queued event.
    Handled,
    /// Queue an event behind the ones already pending.
    Raise(EventEnvelope),
    /// Stop every region, then carry on with the next queued event.
    Stop,
    /// Return the failure to the caller of `process_event`.
    Propagate,
}

impl Recovery {
    /// Feed the failure back into the machine as a [`Failure`] event.
    pub fn reinject(failure: &Failure) -> Self {
        Self::Raise(EventEnvelope::new(failure.clone()))
    }
}

type TransitionHook<S, C> = Box<dyn Fn(&mut C, &TransitionInfo<'_, S>) + Send + Sync>;
type EventHook<C> = Box<dyn Fn(&mut C, &EventEnvelope) + Send + Sync>;
type ProcessedHook<C> = Box<dyn Fn(&mut C, &EventEnvelope, bool) + Send + Sync>;
type FailureHook<C> = Box<dyn Fn(&mut C, &Failure) -> Recovery + Send + Sync>;

/// The configured hooks of a machine. Absent hooks are no-ops.
pub(crate) struct Hooks<S, C> {
    pub(crate) pre_transition: Option<TransitionHook<S, C>>,
    pub(crate) post_transition: Option<TransitionHook<S, C>>,
    pub(crate) pre_processing: Option<EventHook<C>>,
    pub(crate) post_processing: Option<ProcessedHook<C>>,
    pub(crate) unprocessed: Option<EventHook<C>>,
    pub(crate) failure: Option<FailureHook<C>>,
}

impl<S: State, C> Hooks<S, C> {
    pub(crate) fn before_transition(&self, ctx: &mut C, info: &TransitionInfo<'_, S>) {
        if let Some(hook) = &self.pre_transition {
            hook(ctx, info);
        }
    }

    pub(crate) fn after_transition(&self, ctx: &mut C, info: &TransitionInfo<'_, S>) {
        if let Some(hook) = &self.post_transition {
            hook(ctx, info);
        }
    }

    pub(crate) fn before_processing(&self, ctx: &mut C, event: &EventEnvelope) {
        if let Some(hook) = &self.pre_processing {
            hook(ctx, event);
        }
    }

    pub(crate) fn after_processing(&self, ctx: &mut C, event: &EventEnvelope, processed: bool) {
        if let Some(hook) = &self.post_processing {
            hook(ctx, event, processed);
        }
        if !processed {
            if let Some(hook) = &self.unprocessed {
                hook(ctx, event);
            }
        }
    }

    /// `None` when no failure hook is configured.
    pub(crate) fn recover(&self, ctx: &mut C, failure: &Failure) -> Option<Recovery> {
        self.failure.as_ref().map(|hook| hook(ctx, failure))
    }
}

impl<S, C> Default for Hooks<S, C> {
    fn default() -> Self {
        Self {
            pre_transition: None,
            post_transition: None,
            pre_processing: None,
            post_processing: None,
            unprocessed: None,
            failure: None,
        }
    }
}
