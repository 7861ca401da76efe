//! Structural validation of declared regions.
//!
//! Every check runs and all violations are accumulated, so a malformed
//! machine reports all of its problems at once.

use crate::builder::error::{BuildError, TableViolation};
use crate::builder::region::RegionPlan;
use crate::core::State;
use crate::table::{SourceMatcher, Target};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<TableViolation>>;

/// Validate every region, nested regions included.
pub(crate) fn validate<S: State, C: 'static>(regions: &[RegionPlan<S, C>]) -> Result<(), BuildError> {
    let mut owners: Vec<(&S, &str)> = Vec::new();
    let mut checks = Vec::new();
    for region in regions {
        check_region(region, &mut owners, &mut checks);
    }

    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(BuildError::InvalidTable {
            violations: errors.iter().cloned().collect(),
        }),
    }
}

fn check_region<'a, S: State, C: 'static>(
    region: &'a RegionPlan<S, C>,
    owners: &mut Vec<(&'a S, &'a str)>,
    checks: &mut Vec<Check>,
) {
    let path = region.path.as_str();

    for plan in &region.states {
        let owner = owners.iter().find(|(state, _)| **state == plan.id).map(|(_, owner)| *owner);
        checks.push(match owner {
            Some(owner) if owner == path => Validation::fail(TableViolation::DuplicateState {
                region: path.to_string(),
                state: plan.id.name().to_string(),
            }),
            Some(owner) => Validation::fail(TableViolation::StateInMultipleRegions {
                state: plan.id.name().to_string(),
                first: owner.to_string(),
                second: path.to_string(),
            }),
            None => {
                owners.push((&plan.id, path));
                Validation::success(())
            }
        });
    }

    checks.push(check_initial(region));
    checks.extend(check_sources(region));
    checks.extend(check_reachable(region));
    if let Some(states) = completion_cycle(region) {
        checks.push(Validation::fail(TableViolation::CompletionCycle {
            region: path.to_string(),
            states,
        }));
    }

    for plan in &region.states {
        for child in &plan.children {
            check_region(child, owners, checks);
        }
    }
}

fn declares<S: State, C>(region: &RegionPlan<S, C>, state: &S) -> bool {
    region.states.iter().any(|plan| plan.id == *state)
}

fn check_initial<S: State, C: 'static>(region: &RegionPlan<S, C>) -> Check {
    if region.initial.len() > 1 {
        return Validation::fail(TableViolation::AmbiguousInitial {
            region: region.path.clone(),
            count: region.initial.len(),
        });
    }
    match region.initial.first() {
        Some(initial) if !declares(region, initial) => Validation::fail(TableViolation::UnknownInitial {
            region: region.path.clone(),
            state: initial.name().to_string(),
        }),
        _ => Validation::success(()),
    }
}

/// Members of `AnyOf`/`AnyBut` sets must be declared in the region.
fn check_sources<S: State, C: 'static>(region: &RegionPlan<S, C>) -> Vec<Check> {
    region
        .rows
        .iter()
        .filter(|row| matches!(row.source, SourceMatcher::AnyOf(_) | SourceMatcher::AnyBut(_)))
        .flat_map(|row| row.source.named())
        .filter(|state| !declares(region, state))
        .map(|state| {
            Validation::fail(TableViolation::UnknownSource {
                region: region.path.clone(),
                state: state.name().to_string(),
            })
        })
        .collect()
}

fn check_reachable<S: State, C: 'static>(region: &RegionPlan<S, C>) -> Vec<Check> {
    let initial = region.initial_index();
    region
        .states
        .iter()
        .enumerate()
        .filter(|(index, plan)| {
            Some(*index) != initial
                && !region
                    .rows
                    .iter()
                    .any(|row| row.target == Target::State(plan.id.clone()))
        })
        .map(|(_, plan)| {
            Validation::fail(TableViolation::UnreachableState {
                region: region.path.clone(),
                state: plan.id.name().to_string(),
            })
        })
        .collect()
}

/// Follow unguarded completion rows from every simple state, honouring
/// first-match-wins, and report the first loop found.
///
/// A guarded row, a composite target or a final target ends the walk.
fn completion_cycle<S: State, C: 'static>(region: &RegionPlan<S, C>) -> Option<Vec<String>> {
    for start in &region.states {
        let mut walked: Vec<&S> = Vec::new();
        let mut current = start;

        while current.children.is_empty() {
            if let Some(position) = walked.iter().position(|state| **state == current.id) {
                let mut names: Vec<String> = walked[position..].iter().map(|s| s.name().to_string()).collect();
                names.push(current.id.name().to_string());
                return Some(names);
            }
            walked.push(&current.id);

            let Some(row) = region
                .rows
                .iter()
                .find(|row| row.event.is_completion() && row.source.matches(&current.id))
            else {
                break;
            };
            if row.guard.is_some() {
                break;
            }
            match &row.target {
                Target::Internal => {
                    let name = current.id.name().to_string();
                    return Some(vec![name.clone(), name]);
                }
                Target::Final => break,
                Target::State(next) => match region.states.iter().find(|plan| plan.id == *next) {
                    Some(next) => current = next,
                    None => break,
                },
            }
        }
    }
    None
}
