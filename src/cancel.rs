use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot abort flag shared between a run and whoever may cancel it.
///
/// Cancellation is cooperative: phases poll [`is_cancelled`] at their
/// iteration boundaries. Once tripped the token stays tripped.
///
/// [`is_cancelled`]: CancellationToken::is_cancelled
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
