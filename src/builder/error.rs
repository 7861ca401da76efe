//! Build errors for machine, region and transition builders.

use crate::core::DispatchError;
use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No regions defined. Add at least one region with .region(...)")]
    NoRegions,

    #[error("Region '{region}' declares no states and no transitions")]
    EmptyRegion { region: String },

    #[error("Transition source not specified. Call .from(state) or .from_any()")]
    MissingSource,

    #[error("Transition event not specified. Call .on::<E>(), .on_any() or .on_completion()")]
    MissingEvent,

    #[error("Transition target not specified. Call .to(state), .internal() or .to_final()")]
    MissingTarget,

    #[error("Transition table is malformed: {}", list(.violations))]
    InvalidTable { violations: Vec<TableViolation> },

    #[error("Machine failed to start: {0}")]
    Start(#[source] DispatchError),
}

/// A structural problem in the declared regions and tables.
///
/// All violations of a machine are reported together.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableViolation {
    #[error("state {state} is declared twice in region '{region}'")]
    DuplicateState { region: String, state: String },

    #[error("state {state} is declared in regions '{first}' and '{second}'")]
    StateInMultipleRegions {
        state: String,
        first: String,
        second: String,
    },

    #[error("region '{region}' designates {count} initial states")]
    AmbiguousInitial { region: String, count: usize },

    #[error("initial state {state} of region '{region}' is not declared there")]
    UnknownInitial { region: String, state: String },

    #[error("transition in region '{region}' lists undeclared state {state}")]
    UnknownSource { region: String, state: String },

    #[error("transition in region '{region}' targets undeclared state {state}")]
    UnknownTarget { region: String, state: String },

    #[error("state {state} of region '{region}' is neither initial nor the target of any transition")]
    UnreachableState { region: String, state: String },

    #[error("completion transitions in region '{region}' loop unconditionally: {}", cycle(.states))]
    CompletionCycle { region: String, states: Vec<String> },
}

fn cycle(states: &[String]) -> String {
    states.join(" -> ")
}

fn list(violations: &[TableViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_table_lists_every_violation() {
        let error = BuildError::InvalidTable {
            violations: vec![
                TableViolation::DuplicateState {
                    region: "main".to_string(),
                    state: "Idle".to_string(),
                },
                TableViolation::CompletionCycle {
                    region: "main".to_string(),
                    states: vec!["A".to_string(), "B".to_string(), "A".to_string()],
                },
            ],
        };

        assert_eq!(
            error.to_string(),
            "Transition table is malformed: state Idle is declared twice in region 'main'; \
             completion transitions in region 'main' loop unconditionally: A -> B -> A"
        );
    }
}
