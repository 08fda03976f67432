//! Per-call cancellation and deadline signal.
//!
//! Long batch loops poll [`CancelToken::check`] between items. A token is
//! cheap to clone; all clones observe the same cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_core::{TesseraError, TesseraResult};

struct CancelState {
    cancelled: AtomicBool,
    started: Instant,
    deadline: Option<Instant>,
}

/// Cancellation flag plus optional deadline
#[derive(Clone)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    /// Token with no deadline
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Token that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(Instant::now() + timeout))
    }

    /// Token that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    fn build(deadline: Option<Instant>) -> Self {
        Self {
            state: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                started: Instant::now(),
                deadline,
            }),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.state.deadline
    }

    /// Fail if cancelled or past the deadline
    ///
    /// # Errors
    ///
    /// `Cancelled` takes precedence over `DeadlineExceeded`.
    pub fn check(&self) -> TesseraResult<()> {
        if self.is_cancelled() {
            return Err(TesseraError::Cancelled);
        }
        if let Some(deadline) = self.state.deadline {
            if Instant::now() >= deadline {
                return Err(TesseraError::DeadlineExceeded {
                    elapsed_ms: self.state.started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.state.deadline)
            .finish()
    }
}
