//! Source and event matchers for transition rows.

use crate::core::{Event, EventEnvelope, EventType, State};
use std::ops::{BitAnd, BitOr, Not};

/// Predicate over the active state of a region.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceMatcher<S> {
    /// Exactly this state.
    State(S),
    /// Any state of the region.
    Any,
    /// Any state in the list.
    AnyOf(Vec<S>),
    /// Any state not in the list.
    AnyBut(Vec<S>),
}

impl<S: State> SourceMatcher<S> {
    /// Whether the matcher accepts `state` as the active state.
    pub fn matches(&self, state: &S) -> bool {
        match self {
            Self::State(s) => s == state,
            Self::Any => true,
            Self::AnyOf(states) => states.contains(state),
            Self::AnyBut(states) => !states.contains(state),
        }
    }

    /// States named explicitly by the matcher.
    pub(crate) fn named(&self) -> &[S] {
        match self {
            Self::State(s) => std::slice::from_ref(s),
            Self::Any => &[],
            Self::AnyOf(states) | Self::AnyBut(states) => states,
        }
    }
}

/// Predicate over the runtime type of the dispatched event.
///
/// Matchers compose with `&`, `|` and `!`. Only [`EventMatcher::Null`]
/// matches the completion pseudo-event; every other matcher, negations
/// included, rejects it.
///
/// # Example
///
/// ```rust
/// use stateloom::core::EventEnvelope;
/// use stateloom::table::EventMatcher;
///
/// #[derive(Debug)]
/// struct Press;
/// #[derive(Debug)]
/// struct Release;
/// #[derive(Debug)]
/// struct Tick;
///
/// let buttons = EventMatcher::is::<Press>() | EventMatcher::is::<Release>();
/// assert!(buttons.matches(&EventEnvelope::new(Release)));
/// assert!(!buttons.matches(&EventEnvelope::new(Tick)));
///
/// let not_tick = !EventMatcher::is::<Tick>();
/// assert!(not_tick.matches(&EventEnvelope::new(Press)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum EventMatcher {
    /// Exactly this event type.
    Is(EventType),
    /// Any external event.
    Any,
    /// The completion pseudo-event only.
    Null,
    /// Negation.
    Not(Box<EventMatcher>),
    /// Both matchers.
    And(Box<EventMatcher>, Box<EventMatcher>),
    /// Either matcher.
    Or(Box<EventMatcher>, Box<EventMatcher>),
}

impl EventMatcher {
    /// Matcher for the event type `E`.
    pub fn is<E: Event>() -> Self {
        Self::Is(EventType::of::<E>())
    }

    /// Whether the matcher accepts the event.
    pub fn matches(&self, event: &EventEnvelope) -> bool {
        if event.is_completion() {
            return matches!(self, Self::Null);
        }
        self.matches_type(event.event_type())
    }

    fn matches_type(&self, kind: EventType) -> bool {
        match self {
            Self::Is(expected) => *expected == kind,
            Self::Any => true,
            Self::Null => false,
            Self::Not(inner) => !inner.matches_type(kind),
            Self::And(a, b) => a.matches_type(kind) && b.matches_type(kind),
            Self::Or(a, b) => a.matches_type(kind) || b.matches_type(kind),
        }
    }

    /// Whether this is a completion matcher.
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl BitAnd for EventMatcher {
    type Output = EventMatcher;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(Box::new(self), Box::new(rhs))
    }
}

impl BitOr for EventMatcher {
    type Output = EventMatcher;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(Box::new(self), Box::new(rhs))
    }
}

impl Not for EventMatcher {
    type Output = EventMatcher;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Light {
        Off,
        On,
        Broken,
    }

    impl State for Light {
        fn name(&self) -> &str {
            match self {
                Self::Off => "Off",
                Self::On => "On",
                Self::Broken => "Broken",
            }
        }
    }

    #[derive(Debug)]
    struct Flip;

    #[derive(Debug)]
    struct Smash;

    #[test]
    fn source_matchers() {
        assert!(SourceMatcher::State(Light::On).matches(&Light::On));
        assert!(!SourceMatcher::State(Light::On).matches(&Light::Off));
        assert!(SourceMatcher::Any.matches(&Light::Broken));
        assert!(SourceMatcher::AnyOf(vec![Light::Off, Light::On]).matches(&Light::Off));
        assert!(!SourceMatcher::AnyOf(vec![Light::Off, Light::On]).matches(&Light::Broken));
        assert!(SourceMatcher::AnyBut(vec![Light::Broken]).matches(&Light::On));
        assert!(!SourceMatcher::AnyBut(vec![Light::Broken]).matches(&Light::Broken));
    }

    #[test]
    fn null_only_matches_completion() {
        let completion = EventEnvelope::completion();
        let flip = EventEnvelope::new(Flip);

        assert!(EventMatcher::Null.matches(&completion));
        assert!(!EventMatcher::Null.matches(&flip));
        assert!(!EventMatcher::Any.matches(&completion));
        assert!(!(!EventMatcher::is::<Flip>()).matches(&completion));
    }

    #[test]
    fn boolean_combinations() {
        let flip = EventEnvelope::new(Flip);
        let smash = EventEnvelope::new(Smash);

        let either = EventMatcher::is::<Flip>() | EventMatcher::is::<Smash>();
        assert!(either.matches(&flip));
        assert!(either.matches(&smash));

        let both = EventMatcher::is::<Flip>() & EventMatcher::is::<Smash>();
        assert!(!both.matches(&flip));

        let anything_but_smash = EventMatcher::Any & !EventMatcher::is::<Smash>();
        assert!(anything_but_smash.matches(&flip));
        assert!(!anything_but_smash.matches(&smash));
    }
}
