//! Runtime dispatch engine.
//!
//! A [`Machine`] owns one or more orthogonal regions. Each region has exactly
//! one active state (or is stopped, or finished) and a transition table. A
//! state that owns regions of its own is a composite: it forwards events to
//! its children before reacting itself, and it is complete once all of its
//! children have finished.
//!
//! Dispatch is synchronous and run-to-completion. Events raised from inside
//! an action, through a [`MachineRef`], wait in a FIFO queue until the event
//! being dispatched (completion chains included) is done.

mod behavior;
mod handle;
mod hooks;
mod machine;
mod region;
mod shared;
mod slot;

pub use behavior::{Outcome, Reactions, StateBehavior};
pub use handle::{Accepts, AnyEvent, At, MachineRef, Subset};
pub use hooks::{Recovery, TransitionInfo, Vertex};
pub use machine::Machine;
pub use shared::SharedMachine;

pub(crate) use handle::Inbox;
pub(crate) use hooks::Hooks;
pub(crate) use region::Region;
pub(crate) use slot::StateSlot;
