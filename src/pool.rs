use super::{
    errors::SpawnError,
    handle::{self, JoinHandle},
    model::{Counters, PoolMetrics, WorkerMetrics},
    worker::Worker,
};
use parking_lot::RwLock;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Pool configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of workers; 0 means "use hardware parallelism".
    pub worker_count: usize,
    /// When true, destruction drains every accepted task. When false,
    /// queued tasks are discarded at destruction (their handles resolve to
    /// `Cancelled`) and only in-flight tasks finish.
    pub finish_before_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: 0,
            finish_before_exit: true,
        }
    }
}

impl Config {
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    fn resolved_workers(&self) -> usize {
        if self.worker_count == 0 {
            num_cpus::get().max(1)
        } else {
            self.worker_count
        }
    }
}

/// Load-balancing thread pool over independent per-worker queues
///
/// Submission picks the least-loaded running worker and hands the task to
/// its private queue; tasks never migrate afterwards. Dropping the pool
/// stops every worker and joins it, draining or discarding queued work
/// according to `finish_before_exit`.
pub struct ThreadPool {
    workers: RwLock<Vec<Worker>>,
    counters: Arc<Counters>,
    next_worker_id: AtomicUsize,
    finish_before_exit: bool,
}

impl ThreadPool {
    /// Pool with `worker_count` workers (0 = hardware parallelism) and
    /// drain-on-drop semantics.
    pub fn new(worker_count: usize) -> Self {
        Self::with_config(Config::with_workers(worker_count))
    }

    pub fn with_config(config: Config) -> Self {
        let count = config.resolved_workers();
        let counters = Arc::new(Counters::default());
        let workers = (0..count)
            .map(|id| Worker::spawn(id, counters.clone()))
            .collect::<Vec<_>>();
        log::debug!("pool started with {count} workers");
        Self {
            workers: RwLock::new(workers),
            counters,
            next_worker_id: AtomicUsize::new(count),
            finish_before_exit: config.finish_before_exit,
        }
    }

    /// Submit a callable; returns the handle its result will arrive on.
    /// Fails with `PoolShutDown` only when every worker has stopped.
    pub fn spawn<F, T>(&self, f: F) -> Result<JoinHandle<T>, SpawnError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, join_handle) = handle::pack(f);
        let mut task = task;
        loop {
            let workers = self.workers.read();
            let Some(target) = least_loaded(&workers) else {
                return Err(SpawnError::PoolShutDown);
            };
            match workers[target].enqueue(task) {
                Ok(()) => {
                    self.counters.total_spawned.fetch_add(1, Ordering::Relaxed);
                    return Ok(join_handle);
                }
                // The worker stopped between the scan and the enqueue;
                // it fails the running check on the next scan.
                Err(rejected) => task = rejected,
            }
        }
    }

    /// Current worker count. Advisory under concurrent `resize`.
    pub fn size(&self) -> usize {
        self.workers.read().len()
    }

    /// Grow or shrink the worker set to `new_size`.
    ///
    /// Shrinking stops workers from the tail and joins each one before
    /// removing it, so their queued tasks drain on the doomed worker (tasks
    /// are never migrated). Not safe to call concurrently with itself; safe
    /// concurrently with `spawn`.
    pub fn resize(&self, new_size: usize) {
        let current = self.workers.read().len();
        if new_size > current {
            let mut workers = self.workers.write();
            while workers.len() < new_size {
                let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
                workers.push(Worker::spawn(id, self.counters.clone()));
            }
            log::debug!("pool grown to {new_size} workers");
        } else if new_size < current {
            for _ in new_size..current {
                {
                    let workers = self.workers.read();
                    if let Some(worker) = workers.last() {
                        worker.request_stop();
                        worker.join();
                    }
                }
                self.workers.write().pop();
            }
            log::debug!("pool shrunk to {new_size} workers");
        }
    }

    pub fn metrics(&self) -> PoolMetrics {
        let workers = self.workers.read();
        let (total_spawned, completed_tasks, panicked_tasks) = self.counters.snapshot();
        PoolMetrics {
            workers: workers.len(),
            queued_tasks: workers.iter().map(Worker::load).sum(),
            total_spawned,
            completed_tasks,
            panicked_tasks,
        }
    }

    /// Per-worker load/executed snapshots, in insertion order.
    pub fn worker_metrics(&self) -> Vec<WorkerMetrics> {
        self.workers
            .read()
            .iter()
            .map(|w| WorkerMetrics {
                id: w.id(),
                load: w.load(),
                executed: w.executed(),
            })
            .collect()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let workers = self.workers.get_mut();
        if !self.finish_before_exit {
            let discarded: usize = workers.iter().map(Worker::clear).sum();
            if discarded > 0 {
                log::debug!("discarded {discarded} queued tasks at shutdown");
            }
        }
        for worker in workers.iter() {
            worker.request_stop();
        }
        for worker in workers.iter() {
            worker.join();
        }
        log::debug!("pool shut down");
    }
}

/// Least-load-first placement: insertion-order scan over running workers,
/// first minimum wins.
fn least_loaded(workers: &[Worker]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, worker) in workers.iter().enumerate() {
        if !worker.is_running() {
            continue;
        }
        let load = worker.load();
        match best {
            Some((_, lowest)) if load >= lowest => {}
            _ => best = Some((idx, load)),
        }
    }
    best.map(|(idx, _)| idx)
}
