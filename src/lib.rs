//! Load-balancing thread pool built on per-worker queues
//!
//! # Features
//! - Least-loaded placement across independent per-worker FIFO queues
//! - Blocking `JoinHandle` for retrieving results, with panic transport
//! - Resizing the worker set under concurrent submission
//! - Drain-or-discard shutdown
//! - Pool-wide and per-worker metrics

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod result;
mod worker;

pub use errors::SpawnError;
pub use handle::JoinHandle;
pub use model::{PoolMetrics, WorkerMetrics};
pub use pool::{Config, ThreadPool};
pub use result::SpawnResult;
