//! Cooperative cancellation of a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag asking a run to stop.
///
/// Clones observe the same flag, so a signal handler or another thread can
/// hold one while the runner checks another. The runner looks at it before
/// each feature, scenario, hook and step; a step already running always
/// completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());
        let handle = std::thread::spawn(move || remote.cancel());
        assert!(handle.join().is_ok());
        assert!(token.is_cancelled());
    }
}
