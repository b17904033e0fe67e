#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub enum SpawnError {
    /// The submitted callable panicked; the payload is transported verbatim.
    Panic(String),
    /// Every worker has stopped; the pool accepts no more work.
    PoolShutDown,
    /// The handle's result was already taken by an earlier `get`.
    ResultAlreadyRead,
    /// The task was discarded before it ran (discard-mode shutdown).
    Cancelled,
    /// `get_timeout` expired before the task completed.
    Timeout,
}
