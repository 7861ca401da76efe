//! Pending-event queue and the narrow handles that feed it.

use crate::core::{DispatchError, Event, EventEnvelope};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, OnceLock, Weak};

/// Something that can dispatch the events waiting in an inbox.
pub(crate) trait Driver: Send + Sync {
    /// Dispatch pending events if the machine is idle; otherwise leave them
    /// for whoever is dispatching.
    fn drive(&self) -> Result<(), DispatchError>;
}

struct Shared {
    queue: Mutex<VecDeque<EventEnvelope>>,
    capacity: Option<usize>,
    driver: OnceLock<Weak<dyn Driver>>,
}

/// FIFO queue of events waiting for the current dispatch to finish.
#[derive(Clone)]
pub(crate) struct Inbox {
    shared: Arc<Shared>,
}

impl Inbox {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                capacity,
                driver: OnceLock::new(),
            }),
        }
    }

    pub(crate) fn push(&self, event: EventEnvelope) -> Result<(), DispatchError> {
        let mut queue = self
            .shared
            .queue
            .lock()
            .map_err(|_| DispatchError::Poisoned)?;
        if let Some(capacity) = self.shared.capacity {
            if queue.len() >= capacity {
                return Err(DispatchError::QueueFull { capacity });
            }
        }
        queue.push_back(event);
        Ok(())
    }

    pub(crate) fn pop(&self) -> Result<Option<EventEnvelope>, DispatchError> {
        let mut queue = self
            .shared
            .queue
            .lock()
            .map_err(|_| DispatchError::Poisoned)?;
        Ok(queue.pop_front())
    }

    pub(crate) fn len(&self) -> Result<usize, DispatchError> {
        let queue = self
            .shared
            .queue
            .lock()
            .map_err(|_| DispatchError::Poisoned)?;
        Ok(queue.len())
    }

    /// Attach the driver that dispatches posted events. Only the first call
    /// has an effect.
    pub(crate) fn attach(&self, driver: Weak<dyn Driver>) {
        let _ = self.shared.driver.set(driver);
    }

    /// Queue an event, then let the attached driver (if any) dispatch it.
    pub(crate) fn post(&self, event: EventEnvelope) -> Result<(), DispatchError> {
        self.push(event)?;
        match self.shared.driver.get().and_then(Weak::upgrade) {
            Some(driver) => driver.drive(),
            None => Ok(()),
        }
    }
}

/// Whitelist marker accepting every event type.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyEvent;

/// Position marker used to find an event type inside a whitelist tuple.
#[derive(Clone, Copy, Debug, Default)]
pub struct At<const N: usize>;

/// Compile-time membership test: the whitelist `Self` contains `E`.
///
/// Implemented for [`AnyEvent`] and for tuples of up to eight event types.
/// `I` is inferred and never needs to be written out.
pub trait Accepts<E, I> {}

impl<E: Event> Accepts<E, AnyEvent> for AnyEvent {}

macro_rules! accepts_at {
    ($($index:literal => $target:ident in ($($member:ident),+);)+) => {
        $(impl<$($member),+> Accepts<$target, At<$index>> for ($($member,)+) {})+
    };
}

accepts_at! {
    0 => A in (A);
    0 => A in (A, B);
    1 => B in (A, B);
    0 => A in (A, B, C);
    1 => B in (A, B, C);
    2 => C in (A, B, C);
    0 => A in (A, B, C, D);
    1 => B in (A, B, C, D);
    2 => C in (A, B, C, D);
    3 => D in (A, B, C, D);
    0 => A in (A, B, C, D, F);
    1 => B in (A, B, C, D, F);
    2 => C in (A, B, C, D, F);
    3 => D in (A, B, C, D, F);
    4 => F in (A, B, C, D, F);
    0 => A in (A, B, C, D, F, G);
    1 => B in (A, B, C, D, F, G);
    2 => C in (A, B, C, D, F, G);
    3 => D in (A, B, C, D, F, G);
    4 => F in (A, B, C, D, F, G);
    5 => G in (A, B, C, D, F, G);
    0 => A in (A, B, C, D, F, G, H);
    1 => B in (A, B, C, D, F, G, H);
    2 => C in (A, B, C, D, F, G, H);
    3 => D in (A, B, C, D, F, G, H);
    4 => F in (A, B, C, D, F, G, H);
    5 => G in (A, B, C, D, F, G, H);
    6 => H in (A, B, C, D, F, G, H);
    0 => A in (A, B, C, D, F, G, H, J);
    1 => B in (A, B, C, D, F, G, H, J);
    2 => C in (A, B, C, D, F, G, H, J);
    3 => D in (A, B, C, D, F, G, H, J);
    4 => F in (A, B, C, D, F, G, H, J);
    5 => G in (A, B, C, D, F, G, H, J);
    6 => H in (A, B, C, D, F, G, H, J);
    7 => J in (A, B, C, D, F, G, H, J);
}

/// Compile-time subset test: every event type of the whitelist `Self` is
/// accepted by the whitelist `L`.
///
/// Implemented for [`AnyEvent`] (a subset of itself only) and for tuples of
/// up to eight event types. `I` is inferred.
pub trait Subset<L, I> {}

impl Subset<AnyEvent, AnyEvent> for AnyEvent {}

macro_rules! subset_of {
    ($(($($member:ident @ $index:ident),+))+) => {
        $(impl<L, $($member, $index),+> Subset<L, ($($index,)+)> for ($($member,)+)
        where
            $(L: Accepts<$member, $index>),+
        {})+
    };
}

subset_of! {
    (A @ IA)
    (A @ IA, B @ IB)
    (A @ IA, B @ IB, C @ IC)
    (A @ IA, B @ IB, C @ IC, D @ ID)
    (A @ IA, B @ IB, C @ IC, D @ ID, F @ IF)
    (A @ IA, B @ IB, C @ IC, D @ ID, F @ IF, G @ IG)
    (A @ IA, B @ IB, C @ IC, D @ ID, F @ IF, G @ IG, H @ IH)
    (A @ IA, B @ IB, C @ IC, D @ ID, F @ IF, G @ IG, H @ IH, J @ IJ)
}

/// Narrow handle for raising events into a machine.
///
/// A `MachineRef` only exposes `process_event`, and only for the event types
/// listed in `L`, so components can raise events without naming the
/// machine's full type. Events raised while the machine is dispatching are
/// queued and processed, in order, before the outer `process_event` returns.
///
/// For a plain [`Machine`](super::Machine) the event is queued and picked up
/// by the next `process_event` or `process_pending` call; handles obtained
/// from a [`SharedMachine`](super::SharedMachine) also dispatch immediately
/// when the machine is idle.
///
/// # Example
///
/// ```rust
/// use stateloom::dispatch::{AnyEvent, MachineRef};
///
/// #[derive(Debug)]
/// struct Done;
/// #[derive(Debug)]
/// struct Abort;
///
/// fn notify(machine: &MachineRef<(Done, Abort)>) {
///     machine.process_event(Done).unwrap();
///     // machine.process_event(42u8); // does not compile: u8 is not whitelisted
/// }
///
/// fn narrow(machine: &MachineRef<AnyEvent>) -> MachineRef<(Done, Abort)> {
///     machine.narrow()
/// }
/// ```
pub struct MachineRef<L = AnyEvent> {
    inbox: Inbox,
    _accepts: PhantomData<fn() -> L>,
}

impl<L> MachineRef<L> {
    pub(crate) fn new(inbox: Inbox) -> Self {
        Self {
            inbox,
            _accepts: PhantomData,
        }
    }

    /// Raise a whitelisted event.
    pub fn process_event<E, I>(&self, event: E) -> Result<(), DispatchError>
    where
        E: Event,
        L: Accepts<E, I>,
    {
        self.inbox.post(EventEnvelope::new(event))
    }

    /// A handle onto the same machine whose whitelist is a subset of this
    /// one. Widening does not compile:
    ///
    /// ```compile_fail
    /// use stateloom::dispatch::{AnyEvent, MachineRef};
    ///
    /// #[derive(Debug)]
    /// struct Done;
    ///
    /// fn widen(machine: &MachineRef<(Done,)>) -> MachineRef<AnyEvent> {
    ///     machine.narrow()
    /// }
    /// ```
    ///
    /// ```compile_fail
    /// use stateloom::dispatch::MachineRef;
    ///
    /// #[derive(Debug)]
    /// struct Done;
    /// #[derive(Debug)]
    /// struct Abort;
    ///
    /// fn widen(machine: &MachineRef<(Done,)>) -> MachineRef<(Done, Abort)> {
    ///     machine.narrow()
    /// }
    /// ```
    pub fn narrow<M, I>(&self) -> MachineRef<M>
    where
        M: Subset<L, I>,
    {
        MachineRef::new(self.inbox.clone())
    }
}

impl MachineRef<AnyEvent> {
    /// Raise an already wrapped event.
    pub fn process_envelope(&self, event: EventEnvelope) -> Result<(), DispatchError> {
        self.inbox.post(event)
    }
}

impl<L> Clone for MachineRef<L> {
    fn clone(&self) -> Self {
        Self::new(self.inbox.clone())
    }
}

impl<L> std::fmt::Debug for MachineRef<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineRef")
            .field("whitelist", &std::any::type_name::<L>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Open;

    #[derive(Debug)]
    struct Close;

    #[test]
    fn inbox_is_fifo() {
        let inbox = Inbox::new(None);
        inbox.push(EventEnvelope::new(0u8)).unwrap();
        inbox.push(EventEnvelope::new(1u8)).unwrap();
        inbox.push(EventEnvelope::new(2u8)).unwrap();

        let drained: Vec<u8> = std::iter::from_fn(|| inbox.pop().unwrap())
            .map(|e| *e.downcast_ref::<u8>().unwrap())
            .collect();
        assert_eq!(drained, vec![0, 1, 2]);
    }

    #[test]
    fn inbox_enforces_capacity() {
        let inbox = Inbox::new(Some(1));
        inbox.push(EventEnvelope::new(Open)).unwrap();

        let result = inbox.push(EventEnvelope::new(Close));
        assert!(matches!(result, Err(DispatchError::QueueFull { capacity: 1 })));
        assert_eq!(inbox.len().unwrap(), 1);
    }

    #[test]
    fn whitelisted_handle_queues_events() {
        let inbox = Inbox::new(None);
        let handle: MachineRef<(Open, Close)> = MachineRef::new(inbox.clone());

        handle.process_event(Close).unwrap();
        handle.process_event(Open).unwrap();

        assert!(inbox.pop().unwrap().unwrap().is::<Close>());
        assert!(inbox.pop().unwrap().unwrap().is::<Open>());
    }

    #[test]
    fn narrowed_handles_share_the_queue() {
        let inbox = Inbox::new(None);
        let everything: MachineRef<AnyEvent> = MachineRef::new(inbox.clone());

        let both: MachineRef<(Open, Close)> = everything.narrow();
        let close_only: MachineRef<(Close,)> = both.narrow();
        let reordered: MachineRef<(Close, Open)> = both.narrow();
        close_only.process_event(Close).unwrap();
        reordered.process_event(Open).unwrap();

        assert!(inbox.pop().unwrap().unwrap().is::<Close>());
        assert!(inbox.pop().unwrap().unwrap().is::<Open>());
    }

    struct CountingDriver(AtomicUsize);

    impl Driver for CountingDriver {
        fn drive(&self) -> Result<(), DispatchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn post_wakes_the_attached_driver() {
        let inbox = Inbox::new(None);
        let driver = Arc::new(CountingDriver(AtomicUsize::new(0)));
        let strong: Arc<dyn Driver> = driver.clone();
        inbox.attach(Arc::downgrade(&strong));

        MachineRef::<AnyEvent>::new(inbox.clone())
            .process_event(Open)
            .unwrap();

        assert_eq!(driver.0.load(Ordering::SeqCst), 1);
        assert_eq!(inbox.len().unwrap(), 1);
    }
}
