//! Tracking of dispatches that have not produced a response yet.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Shared counter of running dispatches.
///
/// Shutdown uses [`wait_idle`](Self::wait_idle) to give running calls a grace
/// period before the process exits.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl InFlight {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one dispatch as running until the guard is dropped.
    #[must_use]
    pub fn enter(&self) -> InFlightGuard {
        let (count, _) = &*self.state;
        *count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        InFlightGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of running dispatches.
    #[must_use]
    pub fn current(&self) -> usize {
        let (count, _) = &*self.state;
        *count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until no dispatch is running or `timeout` elapses.
    ///
    /// Returns `true` when the counter reached zero in time.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let (count, idle) = &*self.state;
        let deadline = Instant::now() + timeout;
        let mut guard = count.lock().unwrap_or_else(PoisonError::into_inner);
        while *guard > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            guard = idle
                .wait_timeout(guard, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
        true
    }
}

/// Decrements the [`InFlight`] counter when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let (count, idle) = &*self.state;
        let mut guard = count.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = guard.saturating_sub(1);
        if *guard == 0 {
            idle.notify_all();
        }
    }
}
