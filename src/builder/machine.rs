//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::builder::region::RegionBuilder;
use crate::builder::validate::validate;
use crate::config::MachineConfig;
use crate::core::{EventEnvelope, Failure, State};
use crate::dispatch::{Hooks, Inbox, Machine, MachineRef, Recovery, TransitionInfo};

/// Builder for constructing machines with a fluent API.
///
/// Building validates every region first, then constructs the context,
/// then every state instance, and finally starts the machine unless
/// [`auto_start`](Self::auto_start) is disabled.
///
/// # Example
///
/// ```rust
/// use stateloom::builder::{transition, MachineBuilder, RegionBuilder};
/// use stateloom::state_enum;
///
/// state_enum! {
///     enum Switch {
///         Off,
///         On,
///     }
/// }
///
/// #[derive(Debug)]
/// struct Flip;
///
/// let mut machine = MachineBuilder::new()
///     .region(
///         RegionBuilder::new("main")
///             .transition(transition(Switch::Off, Switch::On).on::<Flip>())
///             .transition(transition(Switch::On, Switch::Off).on::<Flip>()),
///     )
///     .on_unprocessed(|misses: &mut u32, _| *misses += 1)
///     .build(0)
///     .unwrap();
///
/// machine.process_event(Flip).unwrap();
/// assert!(machine.is(&Switch::On));
///
/// machine.process_event("not a flip").unwrap();
/// assert_eq!(*machine.context(), 1);
/// ```
pub struct MachineBuilder<S: State, C> {
    regions: Vec<RegionBuilder<S, C>>,
    hooks: Hooks<S, C>,
    config: MachineConfig,
}

impl<S: State, C: 'static> MachineBuilder<S, C> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            hooks: Hooks::default(),
            config: MachineConfig::default(),
        }
    }

    /// Add a top-level region. Regions receive events in the order they
    /// were added.
    pub fn region(mut self, region: RegionBuilder<S, C>) -> Self {
        self.regions.push(region);
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the machine as the last step of building (default: on).
    pub fn auto_start(mut self, enabled: bool) -> Self {
        self.config.auto_start = enabled;
        self
    }

    /// Called before every external transition, including start and stop.
    pub fn on_pre_transition<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &TransitionInfo<'_, S>) + Send + Sync + 'static,
    {
        self.hooks.pre_transition = Some(Box::new(hook));
        self
    }

    /// Called after every external transition, including start and stop.
    pub fn on_post_transition<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &TransitionInfo<'_, S>) + Send + Sync + 'static,
    {
        self.hooks.post_transition = Some(Box::new(hook));
        self
    }

    /// Called before an event is offered to the regions.
    pub fn on_pre_processing<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &EventEnvelope) + Send + Sync + 'static,
    {
        self.hooks.pre_processing = Some(Box::new(hook));
        self
    }

    /// Called once every region has seen an event, with whether any of them
    /// processed it.
    pub fn on_post_processing<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &EventEnvelope, bool) + Send + Sync + 'static,
    {
        self.hooks.post_processing = Some(Box::new(hook));
        self
    }

    /// Called once for each event no region processed.
    ///
    /// To observe every event together with whether some region processed
    /// it, use [`on_post_processing`](Self::on_post_processing); both hooks
    /// fire once per dispatched event, after every region has seen it.
    pub fn on_unprocessed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &EventEnvelope) + Send + Sync + 'static,
    {
        self.hooks.unprocessed = Some(Box::new(hook));
        self
    }

    /// Decide what happens when a guard, action or reaction fails.
    ///
    /// Without a failure hook, failures propagate to the caller.
    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C, &Failure) -> Recovery + Send + Sync + 'static,
    {
        self.hooks.failure = Some(Box::new(hook));
        self
    }

    /// Feed every failure back into the machine as a [`Failure`] event.
    pub fn reinject_failures(self) -> Self {
        self.on_failure(|_, failure| Recovery::reinject(failure))
    }

    /// Build the machine around `context`.
    pub fn build(self, context: C) -> Result<Machine<S, C>, BuildError> {
        self.build_with(move |_| context)
    }

    /// Build the machine, constructing the context from a handle onto the
    /// machine so that actions can raise events through it.
    pub fn build_with<F>(self, context: F) -> Result<Machine<S, C>, BuildError>
    where
        F: FnOnce(MachineRef) -> C,
    {
        if self.regions.is_empty() {
            return Err(BuildError::NoRegions);
        }

        let plans = self
            .regions
            .into_iter()
            .map(|region| {
                let path = region.name().to_string();
                region.plan(path)
            })
            .collect::<Result<Vec<_>, _>>()?;
        validate(&plans)?;

        let inbox = Inbox::new(self.config.queue_capacity);
        let handle = MachineRef::new(inbox.clone());
        let mut context = context(handle.clone());
        let regions = plans
            .into_iter()
            .map(|plan| plan.compile(&mut context, &handle))
            .collect::<Result<Vec<_>, _>>()?;

        let auto_start = self.config.auto_start;
        let mut machine = Machine::new(regions, context, self.hooks, self.config, inbox);
        tracing::debug!(machine = %machine.id(), "Machine built");
        if auto_start {
            machine.start().map_err(BuildError::Start)?;
        }
        Ok(machine)
    }
}

impl<S: State, C: 'static> Default for MachineBuilder<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
