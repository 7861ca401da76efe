//! A constructed state instance, optionally wrapping child regions.

use super::behavior::StateBehavior;
use super::region::{Region, Scope};
use crate::core::{DispatchError, EventEnvelope, Failure, Stage, State};

pub(crate) struct StateSlot<S, C> {
    id: S,
    behavior: Box<dyn StateBehavior<C>>,
    children: Vec<Region<S, C>>,
}

impl<S: State, C: 'static> StateSlot<S, C> {
    pub(crate) fn new(id: S, behavior: Box<dyn StateBehavior<C>>, children: Vec<Region<S, C>>) -> Self {
        Self {
            id,
            behavior,
            children,
        }
    }

    pub(crate) fn id(&self) -> &S {
        &self.id
    }

    pub(crate) fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }

    /// Simple states are always complete; composites once every child
    /// region has reached its final state.
    pub(crate) fn is_complete(&self) -> bool {
        self.children.iter().all(Region::is_final)
    }

    /// Own entry reaction, then start child regions in declaration order.
    pub(crate) fn enter(
        &mut self,
        region: &str,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        self.behavior
            .on_entry(scope.ctx, event)
            .map_err(|cause| Failure::new(Stage::Entry, region, self.id.name(), event.type_name(), cause))?;
        for child in &mut self.children {
            child.start(scope, event)?;
        }
        Ok(())
    }

    /// Stop child regions in declaration order, then the own exit reaction.
    pub(crate) fn exit(
        &mut self,
        region: &str,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        for child in &mut self.children {
            child.stop(scope, event)?;
        }
        self.behavior
            .on_exit(scope.ctx, event)
            .map_err(|cause| Failure::new(Stage::Exit, region, self.id.name(), event.type_name(), cause))?;
        Ok(())
    }

    /// Offer the event to every child region; the own reaction only runs if
    /// none of them processed it.
    pub(crate) fn react(
        &mut self,
        region: &str,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<bool, DispatchError> {
        let mut processed = false;
        for child in &mut self.children {
            processed |= child.process(scope, event)?;
        }
        if processed {
            return Ok(true);
        }

        let outcome = self
            .behavior
            .on_event(scope.ctx, event)
            .map_err(|cause| Failure::new(Stage::Reaction, region, self.id.name(), event.type_name(), cause))?;
        Ok(outcome.is_processed())
    }

    pub(crate) fn accepts(&self, ctx: &C, event: &EventEnvelope) -> bool {
        self.children.iter().any(|child| child.check(ctx, event)) || self.behavior.accepts(ctx, event)
    }

    /// Whether `state` is this slot or active somewhere below it.
    pub(crate) fn contains(&self, state: &S) -> bool {
        self.id == *state || self.children.iter().any(|child| child.is(state))
    }

    pub(crate) fn collect_active<'a>(&'a self, out: &mut Vec<&'a S>) {
        out.push(&self.id);
        for child in &self.children {
            child.collect_active(out);
        }
    }
}
