//! State behaviour: entry, exit and internal reactions.

use crate::core::{BoxError, Event, EventEnvelope, EventType};
use crate::table::Action;

/// Whether an event was consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Processed,
    Unprocessed,
}

impl Outcome {
    pub fn is_processed(self) -> bool {
        matches!(self, Self::Processed)
    }
}

impl From<bool> for Outcome {
    fn from(processed: bool) -> Self {
        if processed {
            Self::Processed
        } else {
            Self::Unprocessed
        }
    }
}

/// Behaviour of one state instance.
///
/// Each declared state owns exactly one behaviour object for the lifetime of
/// the machine. Data that belongs to the state alone (its local context)
/// lives in the implementing type's fields; the shared machine context is
/// passed in on every call.
///
/// All methods have no-op defaults.
///
/// # Example
///
/// ```rust
/// use stateloom::core::{BoxError, EventEnvelope};
/// use stateloom::dispatch::{Outcome, StateBehavior};
///
/// #[derive(Debug)]
/// struct Ping;
///
/// #[derive(Default)]
/// struct Counting {
///     pings: u32,
/// }
///
/// impl StateBehavior<Vec<String>> for Counting {
///     fn on_entry(&mut self, log: &mut Vec<String>, _: &EventEnvelope) -> Result<(), BoxError> {
///         self.pings = 0;
///         log.push("counting".to_string());
///         Ok(())
///     }
///
///     fn on_event(&mut self, _: &mut Vec<String>, event: &EventEnvelope) -> Result<Outcome, BoxError> {
///         if event.is::<Ping>() {
///             self.pings += 1;
///             return Ok(Outcome::Processed);
///         }
///         Ok(Outcome::Unprocessed)
///     }
///
///     fn accepts(&self, _: &Vec<String>, event: &EventEnvelope) -> bool {
///         event.is::<Ping>()
///     }
/// }
/// ```
pub trait StateBehavior<C>: Send {
    /// Called when the state becomes active.
    fn on_entry(&mut self, ctx: &mut C, event: &EventEnvelope) -> Result<(), BoxError> {
        let _ = (ctx, event);
        Ok(())
    }

    /// Called when the state stops being active.
    fn on_exit(&mut self, ctx: &mut C, event: &EventEnvelope) -> Result<(), BoxError> {
        let _ = (ctx, event);
        Ok(())
    }

    /// Internal reaction, consulted when no table row fires.
    fn on_event(&mut self, ctx: &mut C, event: &EventEnvelope) -> Result<Outcome, BoxError> {
        let _ = (ctx, event);
        Ok(Outcome::Unprocessed)
    }

    /// Whether [`on_event`](Self::on_event) would process the event.
    ///
    /// Used by dry runs; must not have side effects.
    fn accepts(&self, ctx: &C, event: &EventEnvelope) -> bool {
        let _ = (ctx, event);
        false
    }
}

/// Closure-based [`StateBehavior`].
///
/// Entry and exit actions may be restricted to one event type; all matching
/// ones run in declaration order. Internal reactions are keyed by event type
/// and the first match handles the event.
pub struct Reactions<C> {
    entry: Vec<(Option<EventType>, Action<C>)>,
    exit: Vec<(Option<EventType>, Action<C>)>,
    internal: Vec<(EventType, Action<C>)>,
}

impl<C: 'static> Reactions<C> {
    pub fn new() -> Self {
        Self {
            entry: Vec::new(),
            exit: Vec::new(),
            internal: Vec::new(),
        }
    }

    /// Run on every entry.
    pub fn with_entry<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &EventEnvelope) + Send + Sync + 'static,
    {
        self.entry.push((None, Action::new(action)));
        self
    }

    /// Run on entries triggered by an `E`.
    pub fn with_entry_for<E, F>(mut self, action: F) -> Self
    where
        E: Event,
        F: Fn(&mut C, &E) + Send + Sync + 'static,
    {
        self.entry.push((Some(EventType::of::<E>()), Action::on::<E, F>(action)));
        self
    }

    /// Run on every exit.
    pub fn with_exit<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C, &EventEnvelope) + Send + Sync + 'static,
    {
        self.exit.push((None, Action::new(action)));
        self
    }

    /// Run on exits triggered by an `E`.
    pub fn with_exit_for<E, F>(mut self, action: F) -> Self
    where
        E: Event,
        F: Fn(&mut C, &E) + Send + Sync + 'static,
    {
        self.exit.push((Some(EventType::of::<E>()), Action::on::<E, F>(action)));
        self
    }

    /// Handle an `E` without leaving the state.
    pub fn with_reaction<E, F>(mut self, action: F) -> Self
    where
        E: Event,
        F: Fn(&mut C, &E) + Send + Sync + 'static,
    {
        self.internal.push((EventType::of::<E>(), Action::on::<E, F>(action)));
        self
    }

    /// Add a prebuilt entry action, optionally filtered by event type.
    pub fn entry_action(mut self, filter: Option<EventType>, action: Action<C>) -> Self {
        self.entry.push((filter, action));
        self
    }

    /// Add a prebuilt exit action, optionally filtered by event type.
    pub fn exit_action(mut self, filter: Option<EventType>, action: Action<C>) -> Self {
        self.exit.push((filter, action));
        self
    }

    /// Add a prebuilt internal reaction.
    pub fn internal_action(mut self, event: EventType, action: Action<C>) -> Self {
        self.internal.push((event, action));
        self
    }
}

impl<C: 'static> Default for Reactions<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn run_filtered<C>(
    actions: &[(Option<EventType>, Action<C>)],
    ctx: &mut C,
    event: &EventEnvelope,
) -> Result<(), BoxError>
where
    C: 'static,
{
    let kind = event.event_type();
    for (filter, action) in actions {
        if filter.map_or(true, |expected| expected == kind) {
            action.run(ctx, event)?;
        }
    }
    Ok(())
}

impl<C: 'static> StateBehavior<C> for Reactions<C> {
    fn on_entry(&mut self, ctx: &mut C, event: &EventEnvelope) -> Result<(), BoxError> {
        run_filtered(&self.entry, ctx, event)
    }

    fn on_exit(&mut self, ctx: &mut C, event: &EventEnvelope) -> Result<(), BoxError> {
        run_filtered(&self.exit, ctx, event)
    }

    fn on_event(&mut self, ctx: &mut C, event: &EventEnvelope) -> Result<Outcome, BoxError> {
        let kind = event.event_type();
        match self.internal.iter().find(|(expected, _)| *expected == kind) {
            Some((_, action)) => {
                action.run(ctx, event)?;
                Ok(Outcome::Processed)
            }
            None => Ok(Outcome::Unprocessed),
        }
    }

    fn accepts(&self, _ctx: &C, event: &EventEnvelope) -> bool {
        let kind = event.event_type();
        self.internal.iter().any(|(expected, _)| *expected == kind)
    }
}
