//! Regions: one active state out of a set, driven by a transition table.

use super::hooks::{Hooks, TransitionInfo, Vertex};
use super::slot::StateSlot;
use crate::config::MachineConfig;
use crate::core::{
    BoxError, DispatchError, EventEnvelope, Failure, Stage, State, StateHistory, StateTransition,
};
use crate::table::{Resolved, TransitionTable};
use chrono::Utc;

/// Machine-wide data every region needs while dispatching.
pub(crate) struct Scope<'a, S: State, C> {
    pub(crate) ctx: &'a mut C,
    pub(crate) hooks: &'a Hooks<S, C>,
    pub(crate) config: &'a MachineConfig,
    pub(crate) history: &'a mut StateHistory<S>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Active {
    Stopped,
    At(usize),
    Final,
}

pub(crate) struct Region<S, C> {
    path: String,
    slots: Vec<StateSlot<S, C>>,
    table: TransitionTable<S, C>,
    initial: usize,
    active: Active,
}

impl<S: State, C: 'static> Region<S, C> {
    pub(crate) fn new(
        path: String,
        slots: Vec<StateSlot<S, C>>,
        table: TransitionTable<S, C>,
        initial: usize,
    ) -> Self {
        Self {
            path,
            slots,
            table,
            initial,
            active: Active::Stopped,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.active != Active::Stopped
    }

    pub(crate) fn is_final(&self) -> bool {
        self.active == Active::Final
    }

    /// Enter the initial state. Does nothing if the region is running.
    pub(crate) fn start(
        &mut self,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        if self.is_running() {
            return Ok(());
        }

        let initial = self.initial;
        let info = TransitionInfo {
            region: &self.path,
            source: Vertex::Stopped,
            target: Vertex::State(self.slots[initial].id().clone()),
            event,
        };
        tracing::trace!(region = %self.path, state = self.slots[initial].id().name(), "Starting region");
        scope.hooks.before_transition(scope.ctx, &info);
        self.active = Active::At(initial);
        self.slots[initial].enter(&self.path, scope, event)?;
        scope.hooks.after_transition(scope.ctx, &info);

        self.settle(scope)
    }

    /// Exit the active state (children first) and return to the stopped
    /// pseudo-state. Does nothing if the region is not running.
    pub(crate) fn stop(
        &mut self,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        let source = match self.active {
            Active::Stopped => return Ok(()),
            Active::Final => Vertex::Final,
            Active::At(index) => Vertex::State(self.slots[index].id().clone()),
        };
        let info = TransitionInfo {
            region: &self.path,
            source,
            target: Vertex::Stopped,
            event,
        };
        tracing::trace!(region = %self.path, "Stopping region");
        scope.hooks.before_transition(scope.ctx, &info);
        if let Active::At(index) = self.active {
            self.slots[index].exit(&self.path, scope, event)?;
        }
        self.active = Active::Stopped;
        scope.hooks.after_transition(scope.ctx, &info);
        Ok(())
    }

    /// Dispatch one event. Returns whether the region processed it.
    ///
    /// Completion is never dispatched from outside; only [`settle`](Self::settle)
    /// takes completion rows, and only once the active state is complete.
    pub(crate) fn process(
        &mut self,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<bool, DispatchError> {
        let Active::At(index) = self.active else {
            return Ok(false);
        };
        if event.is_completion() {
            return Ok(false);
        }

        if let Some(row) = self.resolve(index, scope, event)? {
            let internal = self.table.target(row) == Resolved::Internal;
            self.fire(index, row, scope, event)?;
            if !internal {
                self.settle(scope)?;
            }
            return Ok(true);
        }

        let processed = self.slots[index].react(&self.path, scope, event)?;
        if processed && self.slots[index].is_composite() {
            self.settle(scope)?;
        }
        Ok(processed)
    }

    /// Dry run of [`process`](Self::process): guards only, no side effects.
    pub(crate) fn check(&self, ctx: &C, event: &EventEnvelope) -> bool {
        let Active::At(index) = self.active else {
            return false;
        };
        let slot = &self.slots[index];
        self.table.accepts(slot.id(), ctx, event) || slot.accepts(ctx, event)
    }

    /// Whether `state` is active in this region or any region nested in it.
    pub(crate) fn is(&self, state: &S) -> bool {
        match self.active {
            Active::At(index) => self.slots[index].contains(state),
            _ => false,
        }
    }

    pub(crate) fn collect_active<'a>(&'a self, out: &mut Vec<&'a S>) {
        if let Active::At(index) = self.active {
            self.slots[index].collect_active(out);
        }
    }

    fn resolve(
        &self,
        index: usize,
        scope: &Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<Option<usize>, DispatchError> {
        self.table
            .resolve(self.slots[index].id(), &*scope.ctx, event)
            .map_err(|cause| self.failure(Stage::Guard, index, event, cause))
    }

    /// Chain completion transitions while the active state is complete.
    fn settle(&mut self, scope: &mut Scope<'_, S, C>) -> Result<(), DispatchError> {
        let completion = EventEnvelope::completion();
        let limit = scope.config.max_completion_chain;
        let mut steps = 0;

        loop {
            let Active::At(index) = self.active else {
                return Ok(());
            };
            if !self.slots[index].is_complete() {
                return Ok(());
            }
            let Some(row) = self.resolve(index, scope, &completion)? else {
                return Ok(());
            };
            if steps == limit {
                return Err(DispatchError::CompletionOverflow {
                    region: self.path.clone(),
                    limit,
                });
            }
            steps += 1;
            self.fire(index, row, scope, &completion)?;
        }
    }

    /// Execute a resolved row: exit, commit, action, entry.
    fn fire(
        &mut self,
        source: usize,
        row: usize,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        match self.table.target(row) {
            Resolved::Internal => self.run_action(row, source, scope, event),
            Resolved::State(target) => {
                let info = TransitionInfo {
                    region: &self.path,
                    source: Vertex::State(self.slots[source].id().clone()),
                    target: Vertex::State(self.slots[target].id().clone()),
                    event,
                };
                tracing::trace!(
                    region = %self.path,
                    from = self.slots[source].id().name(),
                    to = self.slots[target].id().name(),
                    event = event.type_name(),
                    "Transition"
                );
                scope.hooks.before_transition(scope.ctx, &info);
                self.slots[source].exit(&self.path, scope, event)?;
                self.active = Active::At(target);
                self.run_action(row, target, scope, event)?;
                self.slots[target].enter(&self.path, scope, event)?;
                if scope.config.track_history {
                    scope.history.record(StateTransition {
                        region: self.path.clone(),
                        from: self.slots[source].id().clone(),
                        to: self.slots[target].id().clone(),
                        event: event.type_name().to_string(),
                        timestamp: Utc::now(),
                    });
                }
                scope.hooks.after_transition(scope.ctx, &info);
                Ok(())
            }
            Resolved::Final => {
                let info = TransitionInfo {
                    region: &self.path,
                    source: Vertex::State(self.slots[source].id().clone()),
                    target: Vertex::Final,
                    event,
                };
                tracing::trace!(
                    region = %self.path,
                    from = self.slots[source].id().name(),
                    event = event.type_name(),
                    "Transition to final"
                );
                scope.hooks.before_transition(scope.ctx, &info);
                self.slots[source].exit(&self.path, scope, event)?;
                self.active = Active::Final;
                self.run_action(row, source, scope, event)?;
                scope.hooks.after_transition(scope.ctx, &info);
                Ok(())
            }
        }
    }

    /// `state` names the slot reported if the action fails.
    fn run_action(
        &self,
        row: usize,
        state: usize,
        scope: &mut Scope<'_, S, C>,
        event: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        match self.table.action(row) {
            Some(action) => action
                .run(scope.ctx, event)
                .map_err(|cause| self.failure(Stage::Action, state, event, cause)),
            None => Ok(()),
        }
    }

    fn failure(&self, stage: Stage, slot: usize, event: &EventEnvelope, cause: BoxError) -> DispatchError {
        Failure::new(stage, &self.path, self.slots[slot].id().name(), event.type_name(), cause).into()
    }
}
