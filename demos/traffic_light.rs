//! Traffic Light
//!
//! This example drives an intersection controller built from a composite
//! state with two orthogonal regions.
//!
//! Key concepts:
//! - Composite state (`Operating`) owning regions of its own
//! - Orthogonal regions (lamp cycle and pedestrian button) seeing every event
//! - Completion transition out of a finished composite
//! - Transition hooks for observation
//!
//! Run with: RUST_LOG=stateloom=trace cargo run --example traffic_light

use stateloom::builder::{completion, transition, MachineBuilder, RegionBuilder, TransitionBuilder};
use stateloom::dispatch::{Reactions, Vertex};
use stateloom::state_enum;
use stateloom::State;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Light {
        Operating,
        Red,
        Green,
        Yellow,
        Idle,
        Waiting,
        Maintenance,
    }
}

#[derive(Debug)]
struct Timer;

#[derive(Debug)]
struct ButtonPressed;

#[derive(Debug)]
struct Shutdown;

#[derive(Default)]
struct Intersection {
    cycles: u32,
    crossings: u32,
}

fn describe(vertex: &Vertex<Light>) -> &str {
    match vertex {
        Vertex::Stopped => "(stopped)",
        Vertex::State(state) => state.name(),
        Vertex::Final => "(final)",
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Traffic Light ===\n");

    let lamp = RegionBuilder::new("lamp")
        .state_with(
            Light::Red,
            Reactions::new().with_entry(|crossing: &mut Intersection, _| crossing.cycles += 1),
        )
        .transition(transition(Light::Red, Light::Green).on::<Timer>())
        .transition(transition(Light::Green, Light::Yellow).on::<Timer>())
        .transition(transition(Light::Yellow, Light::Red).on::<Timer>())
        .transition(TransitionBuilder::new().from_any().on::<Shutdown>().to_final());

    let pedestrian = RegionBuilder::new("pedestrian")
        .transition(transition(Light::Idle, Light::Waiting).on::<ButtonPressed>())
        .transition(
            transition(Light::Waiting, Light::Idle)
                .on::<Timer>()
                .with_action(|crossing: &mut Intersection, _: &Timer| crossing.crossings += 1),
        )
        .transition(TransitionBuilder::new().from_any().on::<Shutdown>().to_final());

    let mut machine = MachineBuilder::new()
        .region(
            RegionBuilder::new("controller")
                .composite(Light::Operating, [lamp, pedestrian])
                .state(Light::Maintenance)
                .transition(completion(Light::Operating, Light::Maintenance)),
        )
        .on_post_transition(|_, info| {
            println!("  [{}] {} -> {}", info.region, describe(&info.source), describe(&info.target));
        })
        .build(Intersection::default())
        .expect("intersection tables are valid");

    println!("\nActive: {:?}\n", machine.active_states());

    for _ in 0..3 {
        machine.process_event(Timer).expect("timer tick");
    }
    machine.process_event(ButtonPressed).expect("button press");
    machine.process_event(Timer).expect("timer tick");

    println!("\nActive: {:?}", machine.active_states());
    println!("Shutdown accepted: {}", machine.check_event(Shutdown));

    machine.process_event(Shutdown).expect("shutdown");

    let stats = machine.context();
    println!("\nActive: {:?}", machine.active_states());
    println!("Red phases: {}, pedestrian crossings: {}", stats.cycles, stats.crossings);
    assert!(machine.is(&Light::Maintenance));

    println!("\n=== Example Complete ===");
}
