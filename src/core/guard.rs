//! Guard predicates for controlling transitions.
//!
//! Guards are boolean functions over the machine context and the event being
//! dispatched. They only ever see `&C`, so evaluating a guard (including
//! during a [`check_event`](crate::dispatch::Machine::check_event) dry run)
//! cannot mutate the machine.

use super::error::BoxError;
use super::event::{Event, EventEnvelope};
use std::ops::{BitAnd, BitOr, BitXor, Not};
use std::sync::Arc;

type Predicate<C> = dyn Fn(&C, &EventEnvelope) -> Result<bool, BoxError> + Send + Sync;

/// Predicate that determines whether a transition row may fire.
///
/// Guards compose with the usual boolean operators: `a & b`, `a | b`,
/// `a ^ b` (exclusive or) and `!a`. Conjunction and disjunction
/// short-circuit left to right.
///
/// # Example
///
/// ```rust
/// use stateloom::core::{EventEnvelope, Guard};
///
/// struct Tank {
///     litres: u32,
///     locked: bool,
/// }
///
/// let has_fuel = Guard::new(|tank: &Tank, _: &EventEnvelope| tank.litres > 0);
/// let unlocked = Guard::new(|tank: &Tank, _: &EventEnvelope| !tank.locked);
/// let can_start = has_fuel & unlocked;
///
/// let event = EventEnvelope::new(());
/// let tank = Tank { litres: 10, locked: false };
/// assert!(can_start.check(&tank, &event).unwrap());
///
/// let tank = Tank { litres: 10, locked: true };
/// assert!(!can_start.check(&tank, &event).unwrap());
/// ```
pub struct Guard<C> {
    predicate: Arc<Predicate<C>>,
}

impl<C: 'static> Guard<C> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C, &EventEnvelope) -> bool + Send + Sync + 'static,
    {
        Self::fallible(move |ctx, event| Ok(predicate(ctx, event)))
    }

    /// Create a guard whose evaluation may fail.
    ///
    /// An error aborts the current dispatch and is reported as a
    /// [`Failure`](super::Failure) at [`Stage::Guard`](super::Stage::Guard).
    pub fn fallible<F>(predicate: F) -> Self
    where
        F: Fn(&C, &EventEnvelope) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Create a guard over a specific event type.
    ///
    /// The guard is false for every other event type.
    pub fn on<E, F>(predicate: F) -> Self
    where
        E: Event,
        F: Fn(&C, &E) -> bool + Send + Sync + 'static,
    {
        Self::new(move |ctx, event| event.downcast_ref::<E>().is_some_and(|e| predicate(ctx, e)))
    }

    /// Evaluate the guard.
    pub fn check(&self, ctx: &C, event: &EventEnvelope) -> Result<bool, BoxError> {
        (self.predicate)(ctx, event)
    }

    /// Both guards hold.
    pub fn and(self, other: Guard<C>) -> Self {
        Self::fallible(move |ctx, event| Ok(self.check(ctx, event)? && other.check(ctx, event)?))
    }

    /// Either guard holds.
    pub fn or(self, other: Guard<C>) -> Self {
        Self::fallible(move |ctx, event| Ok(self.check(ctx, event)? || other.check(ctx, event)?))
    }

    /// Exactly one of the guards holds.
    pub fn xor(self, other: Guard<C>) -> Self {
        Self::fallible(move |ctx, event| Ok(self.check(ctx, event)? != other.check(ctx, event)?))
    }

    /// The guard does not hold.
    pub fn negate(self) -> Self {
        Self::fallible(move |ctx, event| Ok(!self.check(ctx, event)?))
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C: 'static> BitAnd for Guard<C> {
    type Output = Guard<C>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<C: 'static> BitOr for Guard<C> {
    type Output = Guard<C>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<C: 'static> BitXor for Guard<C> {
    type Output = Guard<C>;

    fn bitxor(self, rhs: Self) -> Self::Output {
        self.xor(rhs)
    }
}

impl<C: 'static> Not for Guard<C> {
    type Output = Guard<C>;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Flags {
        a: bool,
        b: bool,
        calls: AtomicUsize,
    }

    fn flag_a() -> Guard<Flags> {
        Guard::new(|f: &Flags, _: &EventEnvelope| {
            f.calls.fetch_add(1, Ordering::SeqCst);
            f.a
        })
    }

    fn flag_b() -> Guard<Flags> {
        Guard::new(|f: &Flags, _: &EventEnvelope| {
            f.calls.fetch_add(1, Ordering::SeqCst);
            f.b
        })
    }

    fn event() -> EventEnvelope {
        EventEnvelope::new("tick")
    }

    #[test]
    fn operators_follow_boolean_logic() {
        for a in [false, true] {
            for b in [false, true] {
                let flags = Flags { a, b, ..Flags::default() };
                let ev = event();

                assert_eq!((flag_a() & flag_b()).check(&flags, &ev).unwrap(), a && b);
                assert_eq!((flag_a() | flag_b()).check(&flags, &ev).unwrap(), a || b);
                assert_eq!((flag_a() ^ flag_b()).check(&flags, &ev).unwrap(), a != b);
                assert_eq!((!flag_a()).check(&flags, &ev).unwrap(), !a);
            }
        }
    }

    #[test]
    fn conjunction_short_circuits() {
        let flags = Flags::default();
        let guard = flag_a() & flag_b();

        assert!(!guard.check(&flags, &event()).unwrap());
        assert_eq!(flags.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn typed_guard_rejects_other_events() {
        let guard = Guard::on(|_: &Flags, n: &u32| *n > 3);
        let flags = Flags::default();

        assert!(guard.check(&flags, &EventEnvelope::new(5u32)).unwrap());
        assert!(!guard.check(&flags, &EventEnvelope::new(2u32)).unwrap());
        assert!(!guard.check(&flags, &EventEnvelope::new(5u64)).unwrap());
    }

    #[test]
    fn fallible_guard_propagates_errors_through_combinators() {
        let broken: Guard<Flags> = Guard::fallible(|_, _| Err("sensor offline".into()));
        let guard = !broken | flag_a();

        let error = guard.check(&Flags::default(), &event()).unwrap_err();
        assert_eq!(error.to_string(), "sensor offline");
    }

    #[test]
    fn guard_is_deterministic() {
        let flags = Flags { a: true, ..Flags::default() };
        let guard = flag_a() ^ flag_b();

        let first = guard.check(&flags, &event()).unwrap();
        let second = guard.check(&flags, &event()).unwrap();
        assert_eq!(first, second);
    }
}
