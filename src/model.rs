use std::sync::atomic::{AtomicUsize, Ordering};

/// Pool-wide counters shared between the pool handle and its workers.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) total_spawned: AtomicUsize,
    pub(crate) completed_tasks: AtomicUsize,
    pub(crate) panicked_tasks: AtomicUsize,
}

impl Counters {
    pub(crate) fn snapshot(&self) -> (usize, usize, usize) {
        (
            self.total_spawned.load(Ordering::Relaxed),
            self.completed_tasks.load(Ordering::Relaxed),
            self.panicked_tasks.load(Ordering::Relaxed),
        )
    }
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub workers: usize,
    pub queued_tasks: usize,
    pub total_spawned: usize,
    pub completed_tasks: usize,
    pub panicked_tasks: usize,
}

impl PoolMetrics {
    pub fn queue_pressure(&self) -> f64 {
        if self.workers == 0 {
            return 0.0;
        }
        self.queued_tasks as f64 / self.workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let finished = self.completed_tasks + self.panicked_tasks;
        if finished == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / finished as f64
    }
}

/// Advisory snapshot of a single worker, in insertion order.
#[derive(Debug, Clone)]
pub struct WorkerMetrics {
    pub id: usize,
    pub load: usize,
    pub executed: usize,
}
