//! Connection tracking for admission control and graceful shutdown

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Tracks in-flight handlers
///
/// Used to:
/// - Bound the number of concurrently running handlers
/// - Count active handlers
/// - Signal shutdown and wait for handlers to drain
#[derive(Debug)]
pub struct ConnectionTracker {
    /// Admission permits, one per running handler
    permits: Arc<Semaphore>,
    /// Configured admission limit
    limit: usize,
    /// Active handler count
    active: Arc<AtomicU64>,
    /// Shutdown signal received
    shutting_down: AtomicBool,
}

impl ConnectionTracker {
    /// Create a tracker admitting at most `limit` handlers (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            active: Arc::new(AtomicU64::new(0)),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Wait for a free slot
    ///
    /// Returns `None` once the tracker has been closed by shutdown.
    pub async fn admit(&self) -> Option<ConnectionGuard> {
        let permit = self.permits.clone().acquire_owned().await.ok()?;
        self.active.fetch_add(1, Ordering::SeqCst);
        Some(ConnectionGuard {
            _permit: permit,
            active: self.active.clone(),
        })
    }

    /// Get current active handler count
    #[inline]
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Configured admission limit
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Free admission slots
    #[inline]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Signal that shutdown is in progress and stop admitting
    pub fn start_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.permits.close();
    }

    /// Check if shutdown is in progress
    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Wait for active handlers to finish
    ///
    /// Returns true if all handlers drained before `timeout` elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.active() == 0 {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Admission slot held by a running handler
///
/// Dropping the guard frees the slot.
#[derive(Debug)]
pub struct ConnectionGuard {
    _permit: OwnedSemaphorePermit,
    active: Arc<AtomicU64>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
