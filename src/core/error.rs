//! Dispatch-time error types.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error type returned by user-supplied guards, actions and state reactions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where in the dispatch sequence a user callback failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// A transition guard.
    Guard,
    /// A transition action.
    Action,
    /// A state's entry reaction.
    Entry,
    /// A state's exit reaction.
    Exit,
    /// A state's internal reaction.
    Reaction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Guard => "guard",
            Self::Action => "action",
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Reaction => "reaction",
        };
        f.write_str(name)
    }
}

/// A fault raised by user logic while an event was being dispatched.
///
/// `Failure` is itself an event type: a failure hook can feed it back into
/// the machine (see [`Recovery::reinject`](crate::dispatch::Recovery::reinject))
/// so that the transition table routes it to an error state.
#[derive(Clone, Debug, Error)]
#[error("{stage} failed in region '{region}' (state {state}, event {event}): {cause}")]
pub struct Failure {
    /// Callback kind that failed.
    pub stage: Stage,
    /// Path of the region that was dispatching.
    pub region: String,
    /// Name of the state whose callback (or outgoing row) failed.
    pub state: String,
    /// Type name of the event being dispatched.
    pub event: &'static str,
    /// The error returned by the callback.
    #[source]
    pub cause: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl Failure {
    pub(crate) fn new(
        stage: Stage,
        region: &str,
        state: &str,
        event: &'static str,
        cause: BoxError,
    ) -> Self {
        Self {
            stage,
            region: region.to_string(),
            state: state.to_string(),
            event,
            cause: Arc::from(cause),
        }
    }
}

/// Errors surfaced by `process_event`, `start` and `stop`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Failure(#[from] Failure),

    #[error("completion transitions in region '{region}' did not settle within {limit} steps")]
    CompletionOverflow { region: String, limit: usize },

    #[error("pending event queue is full ({capacity} events)")]
    QueueFull { capacity: usize },

    #[error("machine lock was poisoned by a panic during dispatch")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_the_position() {
        let failure = Failure::new(Stage::Entry, "main", "Heating", "Ignite", "no gas".into());

        assert_eq!(
            failure.to_string(),
            "entry failed in region 'main' (state Heating, event Ignite): no gas"
        );
    }

    #[test]
    fn failure_exposes_its_cause() {
        use std::error::Error;

        let failure = Failure::new(Stage::Action, "main", "Idle", "Go", "boom".into());
        let source = failure.source().map(|s| s.to_string());

        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn dispatch_error_wraps_failure_transparently() {
        let failure = Failure::new(Stage::Guard, "r", "A", "E", "bad".into());
        let error = DispatchError::from(failure.clone());

        assert_eq!(error.to_string(), failure.to_string());
    }
}
