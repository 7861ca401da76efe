//! Core vocabulary of the engine.
//!
//! This module contains the pieces every other layer builds on:
//! - State identities via the `State` trait
//! - Events and the type-erased `EventEnvelope`
//! - Guard predicates with boolean composition
//! - Failure and dispatch error types
//! - Transition history tracking

mod error;
mod event;
mod guard;
mod history;
mod state;

pub use error::{BoxError, DispatchError, Failure, Stage};
pub(crate) use event::Completion;
pub use event::{Event, EventEnvelope, EventType, Start, Stop};
pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use state::State;
