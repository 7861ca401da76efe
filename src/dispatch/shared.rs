//! Thread-safe wrapper for machines driven by external collaborators.

use super::handle::{AnyEvent, Driver, Inbox, MachineRef};
use super::machine::Machine;
use crate::core::{DispatchError, Event, EventEnvelope, State};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

struct SharedInner<S: State, C> {
    machine: Mutex<Machine<S, C>>,
    inbox: Inbox,
}

impl<S: State, C: Send + 'static> Driver for SharedInner<S, C> {
    fn drive(&self) -> Result<(), DispatchError> {
        loop {
            match self.machine.try_lock() {
                Ok(mut machine) => machine.process_pending()?,
                // Whoever holds the lock drains the queue before releasing it.
                Err(TryLockError::WouldBlock) => {
                    tracing::trace!("Machine busy, event left queued");
                    return Ok(());
                }
                Err(TryLockError::Poisoned(_)) => {
                    tracing::warn!("Machine lock poisoned");
                    return Err(DispatchError::Poisoned);
                }
            }
            // An event may have been queued between the drain and the unlock.
            if self.inbox.len()? == 0 {
                return Ok(());
            }
        }
    }
}

/// A machine that can be fed from several threads or callbacks.
///
/// Posting an event queues it and, if no other caller is dispatching,
/// dispatches it on the calling thread. If the machine is busy (another
/// thread is dispatching, or an action of the machine itself is raising the
/// event) the event stays queued and the current dispatcher processes it
/// before it releases the machine.
///
/// Once a machine is wrapped, every [`MachineRef`] onto it behaves the same
/// way, including handles created before wrapping.
///
/// # Example
///
/// ```rust
/// use stateloom::builder::{transition, MachineBuilder, RegionBuilder};
/// use stateloom::dispatch::SharedMachine;
/// use stateloom::state_enum;
/// use std::thread;
///
/// state_enum! {
///     enum Lamp {
///         Off,
///         On,
///     }
/// }
///
/// #[derive(Debug)]
/// struct Toggle;
///
/// let machine = MachineBuilder::new()
///     .region(
///         RegionBuilder::new("main")
///             .transition(transition(Lamp::Off, Lamp::On).on::<Toggle>())
///             .transition(transition(Lamp::On, Lamp::Off).on::<Toggle>()),
///     )
///     .build(())
///     .unwrap();
/// let shared = SharedMachine::new(machine);
///
/// let handle = shared.machine_ref();
/// thread::spawn(move || handle.process_event(Toggle).unwrap())
///     .join()
///     .unwrap();
///
/// assert!(shared.with(|m| m.is(&Lamp::On)).unwrap());
/// ```
pub struct SharedMachine<S: State, C> {
    inner: Arc<SharedInner<S, C>>,
}

impl<S: State, C: Send + 'static> SharedMachine<S, C> {
    pub fn new(machine: Machine<S, C>) -> Self {
        let inbox = machine.inbox().clone();
        let inner = Arc::new(SharedInner {
            machine: Mutex::new(machine),
            inbox: inbox.clone(),
        });
        let driver: Arc<dyn Driver> = inner.clone();
        inbox.attach(Arc::downgrade(&driver));
        Self { inner }
    }

    /// Queue an event and dispatch it unless the machine is busy.
    pub fn process_event<E: Event>(&self, event: E) -> Result<(), DispatchError> {
        self.inner.inbox.post(EventEnvelope::new(event))
    }

    pub fn process_envelope(&self, event: EventEnvelope) -> Result<(), DispatchError> {
        self.inner.inbox.post(event)
    }

    /// Dispatch whatever is pending, unless the machine is busy.
    pub fn process_pending(&self) -> Result<(), DispatchError> {
        self.inner.drive()
    }

    pub fn machine_ref(&self) -> MachineRef<AnyEvent> {
        MachineRef::new(self.inner.inbox.clone())
    }

    /// Run `f` with exclusive access to the machine, then dispatch any
    /// events queued in the meantime.
    ///
    /// Blocks while another thread is dispatching. Must not be called from
    /// the machine's own callbacks; raise events through a [`MachineRef`]
    /// there instead.
    pub fn with<R>(&self, f: impl FnOnce(&mut Machine<S, C>) -> R) -> Result<R, DispatchError> {
        let result = {
            let mut machine = self
                .inner
                .machine
                .lock()
                .map_err(|_| DispatchError::Poisoned)?;
            let result = f(&mut machine);
            machine.process_pending()?;
            result
        };
        self.inner.drive()?;
        Ok(result)
    }

    /// Unwrap the machine if this is the last handle to it.
    pub fn into_inner(self) -> Result<Machine<S, C>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => Ok(inner
                .machine
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<S: State, C> std::fmt::Debug for SharedMachine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMachine").finish_non_exhaustive()
    }
}

impl<S: State, C> Clone for SharedMachine<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{transition, MachineBuilder, RegionBuilder};
    use crate::state_enum;
    use std::thread;

    state_enum! {
        enum Counter {
            Even,
            Odd,
        }
    }

    #[derive(Debug)]
    struct Tick;

    fn counter() -> SharedMachine<Counter, u32> {
        let machine = MachineBuilder::new()
            .region(
                RegionBuilder::new("main")
                    .transition(transition(Counter::Even, Counter::Odd).on::<Tick>())
                    .transition(transition(Counter::Odd, Counter::Even).on::<Tick>()),
            )
            .on_post_processing(|ticks: &mut u32, _, processed| {
                if processed {
                    *ticks += 1;
                }
            })
            .build(0)
            .unwrap();
        SharedMachine::new(machine)
    }

    #[test]
    fn events_from_many_threads_are_all_dispatched() {
        let shared = counter();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = shared.machine_ref();
                thread::spawn(move || {
                    for _ in 0..25 {
                        handle.process_event(Tick).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        shared.process_pending().unwrap();

        let (ticks, even) = shared.with(|m| (*m.context(), m.is(&Counter::Even))).unwrap();
        assert_eq!(ticks, 100);
        assert!(even);
    }

    #[test]
    fn events_posted_inside_with_are_dispatched_before_it_returns() {
        let shared = counter();
        let handle = shared.machine_ref();

        shared
            .with(|_| handle.process_event(Tick).unwrap())
            .unwrap();

        assert!(shared.with(|m| m.is(&Counter::Odd)).unwrap());
    }

    #[test]
    fn into_inner_requires_the_last_handle() {
        let shared = counter();
        let other = shared.clone();

        let shared = shared.into_inner().unwrap_err();
        drop(other);
        let machine = shared.into_inner().unwrap();
        assert!(machine.is(&Counter::Even));
    }
}
