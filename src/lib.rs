//! Stateloom: a hierarchical state machine engine
//!
//! Stateloom compiles a declaration of states, events, guards, actions and
//! ordered transition tables into a machine that dispatches events
//! synchronously, with first-match-wins resolution and a strict
//! exit → action → entry order.
//!
//! # Core Concepts
//!
//! - **Regions**: each holds one active state and a transition table; a
//!   machine may own several orthogonal regions that all see every event
//! - **Composite states**: states owning regions of their own; they complete
//!   once all of their children reach a final state
//! - **Completion transitions**: rows without a triggering event, taken as
//!   soon as their source is complete
//! - **Run-to-completion**: events raised while dispatching wait in a FIFO
//!   queue until the current event is fully processed
//! - **Failures**: errors from guards, actions and reactions are routed to an
//!   optional failure hook or returned to the caller
//!
//! # Example
//!
//! ```rust
//! use stateloom::builder::{transition, MachineBuilder, RegionBuilder};
//! use stateloom::dispatch::{MachineRef, Reactions};
//! use stateloom::state_enum;
//!
//! state_enum! {
//!     enum Phase {
//!         Idle,
//!         Busy,
//!         Done,
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Begin;
//! #[derive(Debug)]
//! struct Finish;
//!
//! struct Ctx {
//!     machine: MachineRef<(Finish,)>,
//!     log: Vec<&'static str>,
//! }
//!
//! let mut machine = MachineBuilder::new()
//!     .region(
//!         RegionBuilder::new("main")
//!             .initial(Phase::Idle)
//!             .state_with(
//!                 Phase::Busy,
//!                 Reactions::new().with_entry(|ctx: &mut Ctx, _| {
//!                     ctx.log.push("busy");
//!                     // Queued until the current event is fully processed.
//!                     ctx.machine.process_event(Finish).unwrap();
//!                 }),
//!             )
//!             .transition(transition(Phase::Idle, Phase::Busy).on::<Begin>())
//!             .transition(transition(Phase::Busy, Phase::Done).on::<Finish>()),
//!     )
//!     .build_with(|handle| Ctx {
//!         machine: handle.narrow(),
//!         log: Vec::new(),
//!     })
//!     .unwrap();
//!
//! machine.process_event(Begin).unwrap();
//! assert!(machine.is(&Phase::Done));
//! assert_eq!(machine.context().log, vec!["busy"]);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod table;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, RegionBuilder, TransitionBuilder};
pub use config::MachineConfig;
pub use core::{DispatchError, Event, EventEnvelope, Failure, Guard, State};
pub use dispatch::{Machine, MachineRef, Reactions, Recovery, SharedMachine, StateBehavior};
