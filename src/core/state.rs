//! State identity trait.
//!
//! A state identity is an opaque, comparable token naming one declared state.
//! Identities carry no behaviour of their own; what a state does on entry,
//! exit and internal events lives in its [`StateBehavior`](crate::dispatch::StateBehavior).

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state identities.
///
/// One identity type covers every region of a machine, nested regions
/// included, so that [`Machine::is`](crate::dispatch::Machine::is) can answer
/// for any level of the hierarchy. Two states are the same iff their
/// identities compare equal.
///
/// # Required Traits
///
/// - `Clone`: identities are copied into hooks and history records
/// - `PartialEq`: table resolution compares the active identity with row sources
/// - `Debug`: identities appear in logs and violation reports
/// - `Serialize` + `Deserialize`: history records can be exported
///
/// # Example
///
/// ```rust
/// use stateloom::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door {
///     Open,
///     Closed,
///     Locked,
/// }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Locked => "Locked",
///         }
///     }
/// }
///
/// assert_eq!(Door::Locked.name(), "Locked");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}
