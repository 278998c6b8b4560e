//! Tunables for storage and transactions.

use std::path::PathBuf;
use std::time::Duration;

/// How a [`SqliteStore`](crate::store::SqliteStore) reaches its database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file, created on first open.
    pub path: PathBuf,

    /// How long a connection waits on a locked database before giving up
    /// with `Conflict`.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// Locking and retry behaviour of order-mutating transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionPolicy {
    /// Longest wait for the line-scoped lock on a single attempt.
    pub lock_timeout: Duration,

    /// Extra attempts after a `Conflict` before it is surfaced.
    pub max_retries: u32,

    /// Pause before retry `n` is `retry_backoff * n`.
    pub retry_backoff: Duration,
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            max_retries: 3,
            retry_backoff: Duration::from_millis(25),
        }
    }
}
