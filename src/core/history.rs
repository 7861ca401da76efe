//! State transition history tracking.
//!
//! When [`MachineConfig::track_history`](crate::MachineConfig) is enabled,
//! the machine records every external state-to-state transition of every
//! region, nested regions included.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use stateloom::core::{State, StateTransition};
/// use serde::{Deserialize, Serialize};
/// use chrono::Utc;
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Valve {
///     Shut,
///     Open,
/// }
///
/// impl State for Valve {
///     fn name(&self) -> &str {
///         match self {
///             Self::Shut => "Shut",
///             Self::Open => "Open",
///         }
///     }
/// }
///
/// let transition = StateTransition {
///     region: "main".to_string(),
///     from: Valve::Shut,
///     to: Valve::Open,
///     event: "Turn".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to, Valve::Open);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// Path of the region that transitioned
    pub region: String,
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// Type name of the triggering event
    pub event: String,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of state transitions across all regions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Append a transition.
    pub fn record(&mut self, transition: StateTransition<S>) {
        self.transitions.push(transition);
    }

    /// Get the path of states traversed by one region.
    ///
    /// Returns the `from` state of the region's first recorded transition,
    /// then the `to` state of each of its transitions, in order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stateloom::core::{State, StateHistory, StateTransition};
    /// use serde::{Deserialize, Serialize};
    /// use chrono::Utc;
    ///
    /// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    /// enum Phase { One, Two, Three }
    ///
    /// impl State for Phase {
    ///     fn name(&self) -> &str {
    ///         match self {
    ///             Self::One => "One",
    ///             Self::Two => "Two",
    ///             Self::Three => "Three",
    ///         }
    ///     }
    /// }
    ///
    /// let mut history = StateHistory::new();
    /// for (from, to) in [(Phase::One, Phase::Two), (Phase::Two, Phase::Three)] {
    ///     history.record(StateTransition {
    ///         region: "main".to_string(),
    ///         from,
    ///         to,
    ///         event: "Next".to_string(),
    ///         timestamp: Utc::now(),
    ///     });
    /// }
    ///
    /// let path = history.get_path("main");
    /// assert_eq!(path, vec![&Phase::One, &Phase::Two, &Phase::Three]);
    /// assert!(history.get_path("other").is_empty());
    /// ```
    pub fn get_path(&self, region: &str) -> Vec<&S> {
        let mut own = self.transitions.iter().filter(|t| t.region == region);
        let mut path = Vec::new();
        if let Some(first) = own.next() {
            path.push(&first.from);
            path.push(&first.to);
        }
        path.extend(own.map(|t| &t.to));
        path
    }

    /// Transitions taken by one region, oldest first.
    pub fn in_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a StateTransition<S>> + 'a {
        self.transitions.iter().filter(move |t| t.region == region)
    }

    /// Calculate total duration from first to last transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all transitions in the order they completed.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    /// Forget every recorded transition.
    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::state_enum! {
        enum TestState {
            Initial,
            Processing,
            Complete,
        }
    }

    fn record(region: &str, from: TestState, to: TestState) -> StateTransition<TestState> {
        StateTransition {
            region: region.to_string(),
            from,
            to,
            event: "Next".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<TestState> = StateHistory::new();
        assert_eq!(history.transitions().len(), 0);
        assert!(history.get_path("main").is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn get_path_is_per_region() {
        let mut history = StateHistory::new();
        history.record(record("main", TestState::Initial, TestState::Processing));
        history.record(record("aux", TestState::Complete, TestState::Initial));
        history.record(record("main", TestState::Processing, TestState::Complete));

        let path = history.get_path("main");
        assert_eq!(
            path,
            vec![&TestState::Initial, &TestState::Processing, &TestState::Complete]
        );
        assert_eq!(history.get_path("aux").len(), 2);
        assert_eq!(history.in_region("main").count(), 2);
        assert_eq!(history.in_region("missing").count(), 0);
    }

    #[test]
    fn path_outlives_the_region_name() {
        let mut history = StateHistory::new();
        history.record(record("main", TestState::Initial, TestState::Complete));

        let region = String::from("main");
        let path = history.get_path(&region);
        drop(region);

        assert_eq!(path, vec![&TestState::Initial, &TestState::Complete]);
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = StateHistory::new();
        history.record(record("main", TestState::Initial, TestState::Processing));

        std::thread::sleep(Duration::from_millis(10));

        history.record(record("main", TestState::Processing, TestState::Complete));

        let duration = history.duration().unwrap();
        assert!(duration >= Duration::from_millis(10));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut history = StateHistory::new();
        history.record(record("main", TestState::Initial, TestState::Processing));
        history.clear();

        assert!(history.transitions().is_empty());
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::new();
        history.record(record("main", TestState::Initial, TestState::Processing));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<TestState> = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.transitions().len(), 1);
        assert_eq!(deserialized.transitions()[0].to, TestState::Processing);
    }
}
