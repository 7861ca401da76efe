//! Property-based tests for guards, matchers and row resolution.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use proptest::prelude::*;
use stateloom::builder::{transition, MachineBuilder, RegionBuilder};
use stateloom::core::{EventEnvelope, Guard, State, StateHistory, StateTransition};
use stateloom::state_enum;
use stateloom::table::{EventMatcher, SourceMatcher};

state_enum! {
    enum Slot {
        Origin,
        T0,
        T1,
        T2,
        T3,
        T4,
        T5,
    }
}

const TARGETS: [Slot; 6] = [Slot::T0, Slot::T1, Slot::T2, Slot::T3, Slot::T4, Slot::T5];

#[derive(Debug)]
struct Go;
#[derive(Debug)]
struct Other;

fn constant(value: bool) -> Guard<()> {
    Guard::new(move |_: &(), _: &EventEnvelope| value)
}

fn check(guard: &Guard<()>) -> bool {
    guard.check(&(), &EventEnvelope::new(Go)).unwrap()
}

prop_compose! {
    fn arbitrary_slot()(index in 0..Slot::ALL.len()) -> Slot {
        Slot::ALL[index]
    }
}

prop_compose! {
    fn arbitrary_matcher()(
        kind in 0..4u8,
        states in prop::collection::vec(arbitrary_slot(), 0..4),
        single in arbitrary_slot(),
    ) -> SourceMatcher<Slot> {
        match kind {
            0 => SourceMatcher::State(single),
            1 => SourceMatcher::Any,
            2 => SourceMatcher::AnyOf(states),
            _ => SourceMatcher::AnyBut(states),
        }
    }
}

proptest! {
    #[test]
    fn guard_operators_follow_boolean_algebra(a in any::<bool>(), b in any::<bool>()) {
        prop_assert_eq!(check(&(constant(a) & constant(b))), a && b);
        prop_assert_eq!(check(&(constant(a) | constant(b))), a || b);
        prop_assert_eq!(check(&(constant(a) ^ constant(b))), a ^ b);
        prop_assert_eq!(check(&!constant(a)), !a);
        prop_assert_eq!(check(&!(constant(a) & constant(b))), check(&(!constant(a) | !constant(b))));
    }

    #[test]
    fn guard_errors_surface_unless_short_circuited(a in any::<bool>()) {
        let failing = || Guard::fallible(|_: &(), _: &EventEnvelope| Err("unreadable".into()));

        let and = constant(a) & failing();
        let or = constant(a) | failing();

        prop_assert_eq!(and.check(&(), &EventEnvelope::new(Go)).is_err(), a);
        prop_assert_eq!(or.check(&(), &EventEnvelope::new(Go)).is_err(), !a);
    }

    #[test]
    fn any_of_and_any_but_are_complements(
        states in prop::collection::vec(arbitrary_slot(), 0..4),
        active in arbitrary_slot(),
    ) {
        let any_of = SourceMatcher::AnyOf(states.clone());
        let any_but = SourceMatcher::AnyBut(states);

        prop_assert_ne!(any_of.matches(&active), any_but.matches(&active));
    }

    #[test]
    fn source_matchers_are_pure(matcher in arbitrary_matcher(), active in arbitrary_slot()) {
        prop_assert_eq!(matcher.matches(&active), matcher.matches(&active));
        prop_assert!(SourceMatcher::Any.matches(&active));
    }

    #[test]
    fn negation_flips_external_events(go in any::<bool>(), any in any::<bool>()) {
        let matcher = if any { EventMatcher::Any } else { EventMatcher::is::<Go>() };
        let event = if go { EventEnvelope::new(Go) } else { EventEnvelope::new(Other) };

        prop_assert_ne!(matcher.matches(&event), (!matcher.clone()).matches(&event));
        prop_assert!(!EventMatcher::Null.matches(&event));
    }

    #[test]
    fn first_enabled_row_wins(enabled in prop::collection::vec(any::<bool>(), 1..=6)) {
        let mut region = RegionBuilder::new("main").initial(Slot::Origin);
        for (target, open) in TARGETS.iter().zip(enabled.iter().copied()) {
            region = region.transition(
                transition(Slot::Origin, *target)
                    .on::<Go>()
                    .when(move |_: &(), _: &EventEnvelope| open),
            );
        }
        let mut machine = MachineBuilder::new().region(region).build(()).unwrap();

        prop_assert_eq!(machine.check_event(Go), enabled.contains(&true));
        machine.process_event(Go).unwrap();

        let expected = enabled
            .iter()
            .position(|open| *open)
            .map_or(Slot::Origin, |index| TARGETS[index]);
        prop_assert_eq!(machine.active_states(), vec![&expected]);
        prop_assert!(!machine.check_event(Other));
    }

    #[test]
    fn history_path_follows_recorded_transitions(
        steps in prop::collection::vec(arbitrary_slot(), 1..10)
    ) {
        let mut history = StateHistory::new();
        let mut current = Slot::Origin;
        for next in &steps {
            history.record(StateTransition {
                region: "main".to_string(),
                from: current,
                to: *next,
                event: "Go".to_string(),
                timestamp: Utc::now(),
            });
            current = *next;
        }

        let path = history.get_path("main");
        prop_assert_eq!(path.len(), steps.len() + 1);
        prop_assert_eq!(path[0], &Slot::Origin);
        prop_assert_eq!(path.last().map(|s| s.name()), steps.last().map(|s| s.name()));
        prop_assert!(history.get_path("elsewhere").is_empty());
    }
}
