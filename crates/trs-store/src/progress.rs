//! Host progress reporting.
//!
//! Long-running store work (flush, reload, discovery) reports through a
//! [`ProgressMonitor`]. Cancellation is cooperative: implementations poll
//! [`ProgressMonitor::is_cancelled`] and fail with
//! [`StoreError::Cancelled`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{StoreError, StoreResult};

/// Progress sink supplied by the host environment.
pub trait ProgressMonitor: Send + Sync {
    /// Start a task with the given amount of work units.
    fn begin(&self, _task: &str, _total_work: usize) {}

    /// Report completed work units.
    fn worked(&self, _units: usize) {}

    /// Returns `true` once the host wants the running task to stop.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A monitor that reports nowhere and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {}

/// A monitor counting work units that can be cancelled from another thread.
#[derive(Debug, Default)]
pub struct CancellableProgress {
    cancelled: AtomicBool,
    worked: AtomicUsize,
}

impl CancellableProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the running task.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Work units reported so far.
    pub fn worked_units(&self) -> usize {
        self.worked.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancellableProgress {
    fn worked(&self, units: usize) {
        self.worked.fetch_add(units, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Fail with [`StoreError::Cancelled`] if the monitor was cancelled.
pub fn check_cancelled(progress: &dyn ProgressMonitor) -> StoreResult<()> {
    if progress.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    Ok(())
}
