use super::{errors::SpawnError, result::SpawnResult};
use parking_lot::{Condvar, Mutex};
use std::{
    any::Any,
    mem,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::{Duration, Instant},
};

/// What the worker learns from running an envelope. The user's value never
/// passes through the worker; it goes straight into the result slot.
pub(crate) enum TaskOutcome {
    Completed,
    Panicked,
}

/// Type-erased unit of work: a nullary job paired with its result slot.
pub(crate) struct Task {
    job: Box<dyn FnOnce() -> TaskOutcome + Send + 'static>,
}

impl Task {
    pub(crate) fn run(self) -> TaskOutcome {
        (self.job)()
    }
}

enum SlotState<T> {
    Pending,
    Ready(SpawnResult<T>),
    Taken,
}

/// One-shot result slot shared by the envelope and the handle. Written at
/// most once; later writes are ignored.
struct ResultSlot<T> {
    state: Mutex<SlotState<T>>,
    cvar: Condvar,
}

impl<T> ResultSlot<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            cvar: Condvar::new(),
        }
    }

    fn fulfill(&self, result: SpawnResult<T>) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Ready(result);
            self.cvar.notify_all();
        }
    }
}

/// Resolves the handle to `Cancelled` if the envelope is dropped unrun.
struct CompletionGuard<T> {
    slot: Arc<ResultSlot<T>>,
}

impl<T> Drop for CompletionGuard<T> {
    fn drop(&mut self) {
        self.slot.fulfill(Err(SpawnError::Cancelled));
    }
}

/// Handle to a submitted task with blocking retrieval
pub struct JoinHandle<T> {
    slot: Arc<ResultSlot<T>>,
}

impl<T> JoinHandle<T> {
    /// Block until the task has run, then take the result: the callable's
    /// return value, or `Panic` carrying its payload. The slot is one-shot;
    /// a second call returns `ResultAlreadyRead`.
    pub fn get(&self) -> SpawnResult<T> {
        let mut state = self.slot.state.lock();
        while matches!(*state, SlotState::Pending) {
            self.slot.cvar.wait(&mut state);
        }
        match mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Ready(result) => result,
            _ => Err(SpawnError::ResultAlreadyRead),
        }
    }

    /// Like `get`, but gives up with `Timeout` once `timeout` has elapsed.
    /// A timed-out call consumes nothing; `get` may still be called later.
    pub fn get_timeout(&self, timeout: Duration) -> SpawnResult<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.state.lock();
        while matches!(*state, SlotState::Pending) {
            if self.slot.cvar.wait_until(&mut state, deadline).timed_out() {
                return Err(SpawnError::Timeout);
            }
        }
        match mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Ready(result) => result,
            _ => Err(SpawnError::ResultAlreadyRead),
        }
    }

    /// Block until the task has run without extracting the result.
    pub fn wait(&self) {
        let mut state = self.slot.state.lock();
        while matches!(*state, SlotState::Pending) {
            self.slot.cvar.wait(&mut state);
        }
    }

    /// Peek: has the task run (or been discarded)?
    pub fn is_ready(&self) -> bool {
        !matches!(*self.slot.state.lock(), SlotState::Pending)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_owned()
    }
}

/// Wrap a callable into a nullary envelope and the handle that observes it.
/// The envelope runs the callable exactly once under `catch_unwind` and
/// stores the value or the panic payload into the shared slot.
pub(crate) fn pack<F, T>(f: F) -> (Task, JoinHandle<T>)
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let slot = Arc::new(ResultSlot::new());
    let guard = CompletionGuard { slot: slot.clone() };

    let job = Box::new(move || {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                guard.slot.fulfill(Ok(value));
                TaskOutcome::Completed
            }
            Err(payload) => {
                guard.slot.fulfill(Err(SpawnError::Panic(panic_message(payload))));
                TaskOutcome::Panicked
            }
        };
        drop(guard);
        outcome
    });

    (Task { job }, JoinHandle { slot })
}
