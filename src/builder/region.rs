//! Builder for regions and the states they contain.

use crate::builder::error::{BuildError, TableViolation};
use crate::builder::transition::TransitionBuilder;
use crate::core::State;
use crate::dispatch::{MachineRef, Reactions, Region, StateBehavior, StateSlot};
use crate::table::{SourceMatcher, Target, Transition, TransitionTable};

type StateFactory<C> = Box<dyn FnOnce(&mut C, MachineRef) -> Box<dyn StateBehavior<C>>>;

/// Builder for one region: its states, their behaviour and its transitions.
///
/// States referenced by a transition's source or target but never declared
/// are declared implicitly, with no behaviour, in order of first appearance.
/// The initial state is the one passed to [`initial`](Self::initial), or
/// else the first declared state.
///
/// # Example
///
/// ```rust
/// use stateloom::builder::{completion, transition, RegionBuilder};
/// use stateloom::dispatch::Reactions;
/// use stateloom::state_enum;
///
/// state_enum! {
///     enum Valve {
///         Closed,
///         Opening,
///         Open,
///     }
/// }
///
/// #[derive(Debug)]
/// struct Turn;
///
/// let region: RegionBuilder<Valve, Vec<String>> = RegionBuilder::new("valve")
///     .initial(Valve::Closed)
///     .state_with(
///         Valve::Opening,
///         Reactions::new().with_entry(|log: &mut Vec<String>, _| log.push("opening".into())),
///     )
///     .transition(transition(Valve::Closed, Valve::Opening).on::<Turn>())
///     .transition(completion(Valve::Opening, Valve::Open));
/// ```
pub struct RegionBuilder<S, C> {
    name: String,
    initial: Vec<S>,
    states: Vec<StateDecl<S, C>>,
    transitions: Vec<Result<Transition<S, C>, BuildError>>,
}

struct StateDecl<S, C> {
    id: S,
    factory: StateFactory<C>,
    children: Vec<RegionBuilder<S, C>>,
}

impl<S: State, C: 'static> RegionBuilder<S, C> {
    /// Create a builder for a region called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: Vec::new(),
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Designate the initial state.
    pub fn initial(mut self, state: S) -> Self {
        self.initial.push(state);
        self
    }

    /// Declare a state with no behaviour.
    pub fn state(self, state: S) -> Self {
        self.state_with(state, Reactions::new())
    }

    /// Declare a state with its behaviour.
    pub fn state_with<B>(self, state: S, behavior: B) -> Self
    where
        B: StateBehavior<C> + 'static,
    {
        self.state_from(state, move |_, _| behavior)
    }

    /// Declare a state whose behaviour is constructed when the machine is
    /// built, from the already constructed context and a handle onto the
    /// machine.
    pub fn state_from<B, F>(mut self, state: S, factory: F) -> Self
    where
        B: StateBehavior<C> + 'static,
        F: FnOnce(&mut C, MachineRef) -> B + 'static,
    {
        self.states.push(StateDecl {
            id: state,
            factory: Box::new(
                move |ctx: &mut C, machine: MachineRef| -> Box<dyn StateBehavior<C>> {
                    Box::new(factory(ctx, machine))
                },
            ),
            children: Vec::new(),
        });
        self
    }

    /// Declare a composite state owning `regions`.
    pub fn composite(self, state: S, regions: impl IntoIterator<Item = RegionBuilder<S, C>>) -> Self {
        self.composite_with(state, Reactions::new(), regions)
    }

    /// Declare a composite state with its own behaviour.
    pub fn composite_with<B>(
        mut self,
        state: S,
        behavior: B,
        regions: impl IntoIterator<Item = RegionBuilder<S, C>>,
    ) -> Self
    where
        B: StateBehavior<C> + 'static,
    {
        self.states.push(StateDecl {
            id: state,
            factory: Box::new(move |_: &mut C, _: MachineRef| -> Box<dyn StateBehavior<C>> {
                Box::new(behavior)
            }),
            children: regions.into_iter().collect(),
        });
        self
    }

    /// Add a transition using a builder. Builder errors surface from
    /// [`MachineBuilder::build`](crate::builder::MachineBuilder::build).
    pub fn transition(mut self, builder: TransitionBuilder<S, C>) -> Self {
        self.transitions.push(builder.build());
        self
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition<S, C>) -> Self {
        self.transitions.push(Ok(transition));
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: impl IntoIterator<Item = Transition<S, C>>) -> Self {
        self.transitions.extend(transitions.into_iter().map(Ok));
        self
    }

    /// Resolve builder errors and implicit declarations, recursively.
    pub(crate) fn plan(self, path: String) -> Result<RegionPlan<S, C>, BuildError> {
        let rows = self.transitions.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut states = Vec::with_capacity(self.states.len());
        for decl in self.states {
            let children = decl
                .children
                .into_iter()
                .map(|child| {
                    let child_path = format!("{path}/{}/{}", decl.id.name(), child.name);
                    child.plan(child_path)
                })
                .collect::<Result<Vec<_>, _>>()?;
            states.push(StatePlan {
                id: decl.id,
                factory: decl.factory,
                children,
            });
        }

        for row in &rows {
            let source = match &row.source {
                SourceMatcher::State(s) => Some(s),
                _ => None,
            };
            let target = match &row.target {
                Target::State(s) => Some(s),
                _ => None,
            };
            for state in source.into_iter().chain(target) {
                if !states.iter().any(|plan| plan.id == *state) {
                    tracing::trace!(region = %path, state = state.name(), "Declaring state implicitly");
                    states.push(StatePlan::implicit(state.clone()));
                }
            }
        }

        if states.is_empty() {
            return Err(BuildError::EmptyRegion { region: path });
        }

        Ok(RegionPlan {
            path,
            initial: self.initial,
            states,
            rows,
        })
    }
}

/// A region whose declarations are complete but whose states are not yet
/// constructed.
pub(crate) struct RegionPlan<S, C> {
    pub(crate) path: String,
    pub(crate) initial: Vec<S>,
    pub(crate) states: Vec<StatePlan<S, C>>,
    pub(crate) rows: Vec<Transition<S, C>>,
}

pub(crate) struct StatePlan<S, C> {
    pub(crate) id: S,
    factory: StateFactory<C>,
    pub(crate) children: Vec<RegionPlan<S, C>>,
}

impl<S: State, C: 'static> StatePlan<S, C> {
    fn implicit(id: S) -> Self {
        Self {
            id,
            factory: Box::new(|_: &mut C, _: MachineRef| -> Box<dyn StateBehavior<C>> {
                Box::new(Reactions::<C>::new())
            }),
            children: Vec::new(),
        }
    }
}

impl<S: State, C: 'static> RegionPlan<S, C> {
    /// Index of the initial state; the first state unless designated.
    pub(crate) fn initial_index(&self) -> Option<usize> {
        match self.initial.first() {
            Some(initial) => self.states.iter().position(|plan| plan.id == *initial),
            None => Some(0),
        }
    }

    /// Construct every state instance, children before their parent.
    pub(crate) fn compile(self, ctx: &mut C, machine: &MachineRef) -> Result<Region<S, C>, BuildError> {
        let initial = self.initial_index().ok_or_else(|| invalid(TableViolation::UnknownInitial {
            region: self.path.clone(),
            state: self.initial.first().map(|s| s.name().to_string()).unwrap_or_default(),
        }))?;
        let ids: Vec<S> = self.states.iter().map(|plan| plan.id.clone()).collect();
        let table = TransitionTable::compile(self.rows, &ids).map_err(|state| {
            invalid(TableViolation::UnknownTarget {
                region: self.path.clone(),
                state: state.name().to_string(),
            })
        })?;

        let mut slots = Vec::with_capacity(self.states.len());
        for plan in self.states {
            let children = plan
                .children
                .into_iter()
                .map(|child| child.compile(ctx, machine))
                .collect::<Result<Vec<_>, _>>()?;
            let behavior = (plan.factory)(ctx, machine.clone());
            slots.push(StateSlot::new(plan.id, behavior, children));
        }

        Ok(Region::new(self.path, slots, table, initial))
    }
}

fn invalid(violation: TableViolation) -> BuildError {
    BuildError::InvalidTable {
        violations: vec![violation],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{completion, transition};
    use crate::state_enum;

    state_enum! {
        enum Light {
            Off,
            Dim,
            Bright,
        }
    }

    #[derive(Debug)]
    struct Press;

    #[test]
    fn undeclared_states_are_declared_in_order_of_appearance() {
        let plan = RegionBuilder::<Light, ()>::new("main")
            .state(Light::Dim)
            .transition(transition(Light::Off, Light::Dim).on::<Press>())
            .transition(completion(Light::Dim, Light::Bright))
            .plan("main".to_string())
            .unwrap();

        let ids: Vec<_> = plan.states.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![Light::Dim, Light::Off, Light::Bright]);
        assert_eq!(plan.initial_index(), Some(0));
    }

    #[test]
    fn designated_initial_state_wins() {
        let plan = RegionBuilder::<Light, ()>::new("main")
            .initial(Light::Bright)
            .transition(transition(Light::Off, Light::Bright).on::<Press>())
            .plan("main".to_string())
            .unwrap();

        assert_eq!(plan.initial_index(), Some(1));
    }

    #[test]
    fn builder_errors_surface_when_planning() {
        let result = RegionBuilder::<Light, ()>::new("main")
            .transition(TransitionBuilder::new().from(Light::Off).to(Light::Dim))
            .plan("main".to_string());

        assert!(matches!(result, Err(BuildError::MissingEvent)));
    }

    #[test]
    fn empty_region_is_rejected() {
        let result = RegionBuilder::<Light, ()>::new("empty").plan("empty".to_string());

        assert!(matches!(result, Err(BuildError::EmptyRegion { region }) if region == "empty"));
    }

    #[test]
    fn child_paths_name_their_parent_state() {
        let plan = RegionBuilder::<Light, ()>::new("main")
            .composite(
                Light::Bright,
                [RegionBuilder::new("dimmer").state(Light::Dim)],
            )
            .plan("main".to_string())
            .unwrap();

        assert_eq!(plan.states[0].children[0].path, "main/Bright/dimmer");
    }
}
