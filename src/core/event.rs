//! Type-erased event envelope.
//!
//! Events are plain Rust values. The dispatch engine never needs to know the
//! full set of event types up front: every event travels through regions and
//! composite states inside an [`EventEnvelope`], which carries a runtime type
//! tag and an immutable, shared payload.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Any value that can be dispatched to a machine.
///
/// Implemented automatically for every `'static + Debug + Send + Sync` type.
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// View the event as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Runtime type tag of an event.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Tag for the event type `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Fully qualified Rust type name of the event.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Pseudo-event passed to entry reactions when a region starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Start;

/// Pseudo-event passed to exit reactions when a region stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stop;

/// Pseudo-event used for completion (anonymous) transitions.
///
/// Only rows built with [`EventMatcher::Null`](crate::table::EventMatcher::Null)
/// match it. Regions raise it themselves; it cannot be constructed outside
/// the crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Completion;

/// Value-semantic, type-erased holder for the event being dispatched.
///
/// Cloning an envelope is cheap and never copies the payload; the payload is
/// never mutated.
///
/// # Example
///
/// ```rust
/// use stateloom::core::EventEnvelope;
///
/// #[derive(Debug)]
/// struct Coin {
///     cents: u32,
/// }
///
/// let envelope = EventEnvelope::new(Coin { cents: 25 });
/// assert!(envelope.is::<Coin>());
/// assert_eq!(envelope.downcast_ref::<Coin>().map(|c| c.cents), Some(25));
/// assert!(envelope.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct EventEnvelope {
    kind: EventType,
    payload: Arc<dyn Event>,
}

impl EventEnvelope {
    /// Wrap an event.
    pub fn new<E: Event>(event: E) -> Self {
        Self {
            kind: EventType::of::<E>(),
            payload: Arc::new(event),
        }
    }

    pub(crate) fn completion() -> Self {
        Self::new(Completion)
    }

    /// Runtime type tag of the payload.
    pub fn event_type(&self) -> EventType {
        self.kind
    }

    /// Type name of the payload.
    pub fn type_name(&self) -> &'static str {
        self.kind.name
    }

    /// Whether the payload is an `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.kind.id == TypeId::of::<E>()
    }

    /// Whether this is the completion pseudo-event.
    ///
    /// Completion envelopes only exist inside a region's dispatch; callers
    /// cannot build one:
    ///
    /// ```compile_fail
    /// use stateloom::core::{Completion, EventEnvelope};
    ///
    /// let forged = EventEnvelope::new(Completion);
    /// ```
    pub fn is_completion(&self) -> bool {
        self.is::<Completion>()
    }

    /// Borrow the payload as an `E`, or `None` on a type mismatch.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        let event: &dyn Event = &*self.payload;
        event.as_any().downcast_ref::<E>()
    }
}

impl fmt::Debug for EventEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event: &dyn Event = &*self.payload;
        fmt::Debug::fmt(event, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Press {
        button: u8,
    }

    #[derive(Debug)]
    struct Release;

    #[test]
    fn envelope_reports_runtime_type() {
        let envelope = EventEnvelope::new(Press { button: 2 });

        assert!(envelope.is::<Press>());
        assert!(!envelope.is::<Release>());
        assert_eq!(envelope.event_type(), EventType::of::<Press>());
        assert!(envelope.type_name().ends_with("Press"));
    }

    #[test]
    fn downcast_by_expected_type_never_panics() {
        let envelope = EventEnvelope::new(Press { button: 7 });

        assert_eq!(envelope.downcast_ref::<Press>(), Some(&Press { button: 7 }));
        assert!(envelope.downcast_ref::<Release>().is_none());
    }

    #[test]
    fn clones_share_the_payload() {
        let envelope = EventEnvelope::new(Press { button: 1 });
        let copy = envelope.clone();

        let a = envelope.downcast_ref::<Press>().unwrap() as *const Press;
        let b = copy.downcast_ref::<Press>().unwrap() as *const Press;
        assert_eq!(a, b);
    }

    #[test]
    fn completion_is_distinct_from_user_events() {
        assert!(EventEnvelope::completion().is_completion());
        assert!(!EventEnvelope::new(Release).is_completion());
        assert!(!EventEnvelope::new(Start).is_completion());
    }

    #[test]
    fn debug_shows_the_payload() {
        let envelope = EventEnvelope::new(Press { button: 3 });
        assert_eq!(format!("{envelope:?}"), "Press { button: 3 }");
    }
}
