//! Motor Controller
//!
//! This example runs a motor controller shared between threads, with faults
//! routed back into the transition table.
//!
//! Key concepts:
//! - Fallible actions reported as failures
//! - A failure hook that re-injects failures as events
//! - Narrowed machine handles that may only raise whitelisted events
//! - `SharedMachine` accepting events from several threads
//!
//! Run with: RUST_LOG=stateloom=debug cargo run --example motor

use stateloom::builder::{internal, transition, MachineBuilder, RegionBuilder, TransitionBuilder};
use stateloom::core::{EventEnvelope, Failure};
use stateloom::dispatch::{MachineRef, Reactions, Recovery};
use stateloom::table::Action;
use stateloom::{state_enum, SharedMachine};
use std::thread;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Motor {
        Off,
        Spinning,
        Stalled,
    }
}

#[derive(Debug)]
struct PowerOn;

#[derive(Debug)]
struct Load {
    amps: u32,
}

#[derive(Debug)]
struct Stall;

#[derive(Debug)]
struct Reset;

const MAX_AMPS: u32 = 40;
const STALL_AMPS: u32 = 30;

struct Drive {
    machine: MachineRef<(Stall,)>,
    amps: u32,
    faults: Vec<String>,
}

fn apply_load(drive: &mut Drive, event: &EventEnvelope) -> Result<(), stateloom::core::BoxError> {
    let Some(load) = event.downcast_ref::<Load>() else {
        return Ok(());
    };
    if load.amps > MAX_AMPS {
        return Err(format!("overcurrent: {} A", load.amps).into());
    }
    drive.amps = load.amps;
    if load.amps > STALL_AMPS {
        drive.machine.process_event(Stall)?;
    }
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Motor Controller ===\n");

    let machine = MachineBuilder::new()
        .region(
            RegionBuilder::new("motor")
                .state_with(
                    Motor::Stalled,
                    Reactions::new().with_entry(|drive: &mut Drive, _| drive.amps = 0),
                )
                .initial(Motor::Off)
                .transition(transition(Motor::Off, Motor::Spinning).on::<PowerOn>())
                .transition(internal(Motor::Spinning).on::<Load>().action(Action::fallible(apply_load)))
                .transition(transition(Motor::Spinning, Motor::Stalled).on::<Stall>())
                .transition(TransitionBuilder::new().from_any().on::<Failure>().to(Motor::Stalled))
                .transition(transition(Motor::Stalled, Motor::Off).on::<Reset>()),
        )
        .on_failure(|drive: &mut Drive, failure| {
            drive.faults.push(failure.cause.to_string());
            Recovery::reinject(failure)
        })
        .build_with(|handle| Drive {
            machine: handle.narrow(),
            amps: 0,
            faults: Vec::new(),
        })
        .expect("motor table is valid");

    let shared = SharedMachine::new(machine);
    shared.process_event(PowerOn).expect("power on");

    let workers: Vec<_> = [10, 20, 35, 50]
        .into_iter()
        .map(|amps| {
            let shared = shared.clone();
            thread::spawn(move || shared.process_event(Load { amps }))
        })
        .collect();
    for worker in workers {
        worker
            .join()
            .expect("worker panicked")
            .expect("load accepted");
    }
    shared.process_pending().expect("drain");

    shared
        .with(|machine| {
            println!("Active: {:?}", machine.active_states());
            println!("Faults: {:?}", machine.context().faults);
            machine.process_event(Reset)
        })
        .expect("machine available")
        .expect("reset");

    let machine = shared.into_inner().expect("no other handles");
    println!("After reset: {:?}", machine.active_states());

    println!("\n=== Example Complete ===");
}
