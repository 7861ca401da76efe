//! Transition tables.
//!
//! A table is an ordered list of rows `(source, event, target, action, guard)`.
//! Rows are evaluated in declaration order and the first row whose source
//! matches the active state, whose event matcher accepts the event and whose
//! guard holds is the one that fires. Order is the only tie-break.

mod matcher;
mod transition;

pub use matcher::{EventMatcher, SourceMatcher};
pub use transition::{Action, Target, Transition};
pub(crate) use transition::{Resolved, TransitionTable};
