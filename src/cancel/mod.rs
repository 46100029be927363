//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Requests early termination of a detection operation.
///
/// Returned synchronously by every `Detector::detect_*` call. Cloning yields a
/// handle to the same flag. [`cancel`](Self::cancel) never blocks and never
/// fails; calling it several times, from any thread, or after the operation
/// completed is harmless.
///
/// Cancelling stops further reads. It does not wait for the operation: the
/// completion callback still fires exactly once, with a best-effort result.
///
/// # Example
///
/// ```
/// use encsniff::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            tracing::debug!("detection cancellation requested");
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
