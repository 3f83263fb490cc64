//! Cooperative cancellation for a single run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag for one run.
///
/// Clones observe the same flag. The flag only ever moves from unset to set;
/// there is no way to clear it, so a new run always gets a new token.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Returns `true` if this call was the one that set it.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_and_sticky() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());

        assert!(token.cancel());
        assert!(other.is_cancelled());

        // A second cancel is a no-op.
        assert!(!other.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel())
            .join()
            .unwrap();
        assert!(token.is_cancelled());
    }
}
