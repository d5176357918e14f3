//! Cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flag a supervisor can raise from another thread to stop the scheduler
///
/// The scheduler polls it before every ask, reply and automated replay; a
/// raised flag makes the running action fail with `Cancelled` and roll back.
/// Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Lower the flag again so the scheduler can be reused
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
