//! Sleeping that stays responsive to cancellation.

use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::clock::{Clock, SystemClock};

/// Granularity of cancellation checks while waiting.
pub const POLL_QUANTUM: Duration = Duration::from_millis(50);

/// Waits on a [`Clock`] in short slices, checking a token between slices.
///
/// A stop request is noticed at most one quantum after it is made, no matter
/// how long the requested wait is.
#[derive(Clone)]
pub struct Waiter {
    clock: Arc<dyn Clock>,
}

impl Waiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Block until `duration` has elapsed or `token` is cancelled.
    pub fn wait(&self, duration: Duration, token: &CancellationToken) {
        if duration.is_zero() {
            return;
        }
        let deadline = self.clock.now() + duration;
        loop {
            if token.is_cancelled() {
                return;
            }
            let now = self.clock.now();
            if now >= deadline {
                return;
            }
            self.clock.sleep(POLL_QUANTUM.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_zero_wait_returns_immediately() {
        let clock = Arc::new(ManualClock::new());
        let waiter = Waiter::new(clock.clone());
        waiter.wait(Duration::ZERO, &CancellationToken::new());
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_waits_full_duration() {
        let clock = Arc::new(ManualClock::new());
        let waiter = Waiter::new(clock.clone());
        waiter.wait(Duration::from_millis(130), &CancellationToken::new());
        // Final slice is trimmed to the deadline.
        assert_eq!(clock.now(), Duration::from_millis(130));
    }

    #[test]
    fn test_cancellation_latency_is_one_quantum() {
        let clock = Arc::new(ManualClock::new());
        let token = CancellationToken::new();
        let remote = token.clone();
        clock.at(Duration::from_millis(120), move || {
            remote.cancel();
        });

        let waiter = Waiter::new(clock.clone());
        waiter.wait(Duration::from_secs(3600), &token);

        let now = clock.now();
        assert!(now >= Duration::from_millis(120));
        assert!(now <= Duration::from_millis(120) + POLL_QUANTUM);
    }

    #[test]
    fn test_already_cancelled_does_not_sleep() {
        let clock = Arc::new(ManualClock::new());
        let token = CancellationToken::new();
        token.cancel();
        Waiter::new(clock.clone()).wait(Duration::from_secs(5), &token);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_real_clock_cancel_is_prompt() {
        let token = CancellationToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });
        let started = std::time::Instant::now();
        Waiter::system().wait(Duration::from_secs(10), &token);
        handle.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
