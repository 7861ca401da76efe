//! The machine: orthogonal regions, shared context and the run-to-completion
//! queue.

use super::handle::{AnyEvent, Inbox, MachineRef};
use super::hooks::{Hooks, Recovery};
use super::region::{Region, Scope};
use crate::config::MachineConfig;
use crate::core::{DispatchError, Event, EventEnvelope, Start, State, StateHistory, Stop};
use std::fmt;
use uuid::Uuid;

/// A compiled state machine.
///
/// Built with [`MachineBuilder`](crate::builder::MachineBuilder). Every
/// top-level region receives each event in declaration order; events raised
/// while an event is being dispatched are queued and processed in FIFO order
/// before the outermost call returns.
pub struct Machine<S: State, C> {
    id: Uuid,
    regions: Vec<Region<S, C>>,
    context: C,
    hooks: Hooks<S, C>,
    config: MachineConfig,
    inbox: Inbox,
    history: StateHistory<S>,
}

impl<S: State, C: 'static> Machine<S, C> {
    pub(crate) fn new(
        regions: Vec<Region<S, C>>,
        context: C,
        hooks: Hooks<S, C>,
        config: MachineConfig,
        inbox: Inbox,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            regions,
            context,
            hooks,
            config,
            inbox,
            history: StateHistory::new(),
        }
    }

    /// Unique identifier, used to correlate log output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Dispatch an event, then every event that was raised while doing so.
    ///
    /// Events still pending from an earlier call go first.
    pub fn process_event<E: Event>(&mut self, event: E) -> Result<(), DispatchError> {
        self.process_envelope(EventEnvelope::new(event))
    }

    /// [`process_event`](Self::process_event) for an already wrapped event.
    pub fn process_envelope(&mut self, event: EventEnvelope) -> Result<(), DispatchError> {
        self.inbox.push(event)?;
        self.drain()
    }

    /// Dispatch an event ahead of the pending ones, then drain the queue.
    pub fn process_event_now<E: Event>(&mut self, event: E) -> Result<(), DispatchError> {
        let result = self.dispatch(&EventEnvelope::new(event));
        self.recover(result)?;
        self.drain()
    }

    /// Dispatch every pending event.
    pub fn process_pending(&mut self) -> Result<(), DispatchError> {
        self.drain()
    }

    /// Number of events waiting to be dispatched.
    pub fn pending(&self) -> Result<usize, DispatchError> {
        self.inbox.len()
    }

    /// Whether some region would process `event`.
    ///
    /// Only guards run; no action, reaction or hook is executed and no state
    /// changes. A guard that fails counts as rejecting the event.
    pub fn check_event<E: Event>(&self, event: E) -> bool {
        self.check_envelope(&EventEnvelope::new(event))
    }

    pub fn check_envelope(&self, event: &EventEnvelope) -> bool {
        self.regions
            .iter()
            .any(|region| region.check(&self.context, event))
    }

    /// Start every region, then drain events raised by entry reactions.
    ///
    /// Regions that are already running are left alone.
    pub fn start(&mut self) -> Result<(), DispatchError> {
        let event = EventEnvelope::new(Start);
        let result = self.for_each_region(|region, scope| region.start(scope, &event));
        self.recover(result)?;
        self.drain()
    }

    /// Stop every region. Stopping a stopped machine does nothing.
    pub fn stop(&mut self) -> Result<(), DispatchError> {
        let result = self.stop_regions();
        self.recover(result)?;
        self.drain()
    }

    /// Whether any region is running.
    pub fn running(&self) -> bool {
        self.regions.iter().any(Region::is_running)
    }

    /// Whether `state` is active, at any nesting depth.
    pub fn is(&self, state: &S) -> bool {
        self.regions.iter().any(|region| region.is(state))
    }

    /// Active states of every region, outermost first.
    pub fn active_states(&self) -> Vec<&S> {
        let mut active = Vec::new();
        for region in &self.regions {
            region.collect_active(&mut active);
        }
        active
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// A handle for raising events into this machine.
    pub fn machine_ref(&self) -> MachineRef<AnyEvent> {
        MachineRef::new(self.inbox.clone())
    }

    /// Recorded transitions; empty unless history tracking is enabled.
    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub(crate) fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    fn drain(&mut self) -> Result<(), DispatchError> {
        while let Some(event) = self.inbox.pop()? {
            let result = self.dispatch(&event);
            self.recover(result)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &EventEnvelope) -> Result<(), DispatchError> {
        let span = tracing::debug_span!("dispatch", machine = %self.id, event = event.type_name());
        let _entered = span.enter();

        self.hooks.before_processing(&mut self.context, event);
        let mut processed = false;
        self.for_each_region(|region, scope| {
            processed |= region.process(scope, event)?;
            Ok(())
        })?;
        if !processed {
            tracing::debug!(event = ?event, "Event not processed");
        }
        self.hooks.after_processing(&mut self.context, event, processed);
        Ok(())
    }

    fn stop_regions(&mut self) -> Result<(), DispatchError> {
        let event = EventEnvelope::new(Stop);
        self.for_each_region(|region, scope| region.stop(scope, &event))
    }

    fn for_each_region<F>(&mut self, mut f: F) -> Result<(), DispatchError>
    where
        F: FnMut(&mut Region<S, C>, &mut Scope<'_, S, C>) -> Result<(), DispatchError>,
    {
        let mut scope = Scope {
            ctx: &mut self.context,
            hooks: &self.hooks,
            config: &self.config,
            history: &mut self.history,
        };
        for region in &mut self.regions {
            f(region, &mut scope)?;
        }
        Ok(())
    }

    /// Route a user failure through the failure hook, if there is one.
    fn recover(&mut self, result: Result<(), DispatchError>) -> Result<(), DispatchError> {
        let failure = match result {
            Err(DispatchError::Failure(failure)) => failure,
            other => return other,
        };

        let Some(recovery) = self.hooks.recover(&mut self.context, &failure) else {
            tracing::warn!(machine = %self.id, error = %failure, "Dispatch failed");
            return Err(failure.into());
        };

        tracing::warn!(machine = %self.id, error = %failure, ?recovery, "Dispatch failed, recovering");
        match recovery {
            Recovery::Handled => Ok(()),
            Recovery::Raise(event) => self.inbox.push(event),
            Recovery::Stop => self.stop_regions(),
            Recovery::Propagate => Err(failure.into()),
        }
    }
}

impl<S: State, C> fmt::Debug for Machine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.id)
            .field("regions", &self.regions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
