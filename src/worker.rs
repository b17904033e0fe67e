use super::{
    handle::{Task, TaskOutcome},
    model::Counters,
};
use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    mem,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

/// State shared between the worker's owner and its thread.
struct WorkerShared {
    id: usize,
    queue: Mutex<VecDeque<Task>>,
    cvar: Condvar,
    /// Tasks enqueued but not yet run. Producers read this without the lock
    /// for placement; it may briefly exceed the queue length while a batch
    /// is executing.
    load: AtomicUsize,
    running: AtomicBool,
    executed: AtomicUsize,
    counters: Arc<Counters>,
}

/// A single executor: one thread, one FIFO queue, one load counter.
pub(crate) struct Worker {
    shared: Arc<WorkerShared>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Worker {
    pub(crate) fn spawn(id: usize, counters: Arc<Counters>) -> Self {
        let shared = Arc::new(WorkerShared {
            id,
            queue: Mutex::new(VecDeque::new()),
            cvar: Condvar::new(),
            load: AtomicUsize::new(0),
            running: AtomicBool::new(true),
            executed: AtomicUsize::new(0),
            counters,
        });

        let thread_shared = shared.clone();
        let thread = thread::Builder::new()
            .name(format!("balanced-pool-worker-{id}"))
            .spawn(move || worker_loop(thread_shared))
            .expect("failed to spawn worker thread");

        Self {
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.shared.id
    }

    /// Hand a task to this worker. Rejected (and handed back) once the
    /// worker has been asked to stop. The running check happens under the
    /// queue mutex, so an accepted task is always seen by the final drain.
    pub(crate) fn enqueue(&self, task: Task) -> Result<(), Task> {
        let mut queue = self.shared.queue.lock();
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(task);
        }
        queue.push_back(task);
        self.shared.load.fetch_add(1, Ordering::Release);
        drop(queue);
        self.shared.cvar.notify_one();
        Ok(())
    }

    /// Advisory load snapshot used for placement.
    pub(crate) fn load(&self) -> usize {
        self.shared.load.load(Ordering::Acquire)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub(crate) fn executed(&self) -> usize {
        self.shared.executed.load(Ordering::Relaxed)
    }

    /// Ask the thread to stop once its queue is empty. Non-blocking,
    /// idempotent. The store happens under the queue mutex to serialize
    /// with concurrent enqueues.
    pub(crate) fn request_stop(&self) {
        let queue = self.shared.queue.lock();
        self.shared.running.store(false, Ordering::Release);
        drop(queue);
        self.shared.cvar.notify_one();
    }

    /// Join the worker thread. Call after `request_stop`; the join covers
    /// the drain of any remaining queued tasks.
    pub(crate) fn join(&self) {
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                // Task panics are caught by the envelope, so this means a
                // broken invariant inside the worker itself.
                log::error!("worker {} thread panicked", self.shared.id);
            }
        }
    }

    /// Drop every queued envelope without running it; their handles resolve
    /// to `Cancelled`. Returns the number discarded. In-flight tasks are
    /// unaffected.
    pub(crate) fn clear(&self) -> usize {
        let mut queue = self.shared.queue.lock();
        let discarded = queue.len();
        self.shared.load.fetch_sub(discarded, Ordering::Release);
        queue.clear();
        discarded
    }
}

fn worker_loop(shared: Arc<WorkerShared>) {
    log::debug!("worker {} started", shared.id);
    let mut batch: VecDeque<Task> = VecDeque::new();
    loop {
        {
            let mut queue = shared.queue.lock();
            shared
                .cvar
                .wait_while(&mut queue, |q| {
                    q.is_empty() && shared.running.load(Ordering::Acquire)
                });
            // Take the whole queue in one swap; running tasks outside the
            // lock keeps enqueues contention-free.
            mem::swap(&mut *queue, &mut batch);
        }
        run_batch(&shared, &mut batch);
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
    }

    // Drain tasks that slipped in under the lock before the stop committed.
    let mut rest = mem::take(&mut *shared.queue.lock());
    run_batch(&shared, &mut rest);
    log::debug!(
        "worker {} exited after {} tasks",
        shared.id,
        shared.executed.load(Ordering::Relaxed)
    );
}

fn run_batch(shared: &WorkerShared, batch: &mut VecDeque<Task>) {
    while let Some(task) = batch.pop_front() {
        match task.run() {
            TaskOutcome::Completed => &shared.counters.completed_tasks,
            TaskOutcome::Panicked => &shared.counters.panicked_tasks,
        }
        .fetch_add(1, Ordering::Relaxed);
        shared.load.fetch_sub(1, Ordering::Relaxed);
        shared.executed.fetch_add(1, Ordering::Relaxed);
    }
}
