//! Time sources for the repeat loop.
//!
//! The loop never calls [`std::thread::sleep`] or [`Instant::now`] directly;
//! it goes through a [`Clock`] so runs can be driven by [`ManualClock`] in
//! tests without waiting on wall time.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time plus the ability to block for a while.
///
/// `now` is measured from an arbitrary per-clock origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

type Alarm = (Duration, Box<dyn FnOnce() + Send>);

/// Virtual clock whose `sleep` advances time instantly.
///
/// Callbacks registered with [`ManualClock::at`] fire from inside `sleep`
/// once virtual time reaches them, which makes "stop after 0.45 s" style
/// scenarios deterministic.
///
/// ```
/// use input_repeater::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// clock.sleep(Duration::from_millis(250));
/// assert_eq!(clock.now(), Duration::from_millis(250));
/// ```
#[derive(Default)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    alarms: Vec<Alarm>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` the first time virtual time reaches `at`.
    pub fn at(&self, at: Duration, callback: impl FnOnce() + Send + 'static) {
        let mut state = self.lock();
        state.alarms.push((at, Box::new(callback)));
    }

    /// Move time forward without going through [`Clock::sleep`].
    pub fn advance(&self, duration: Duration) {
        self.sleep(duration);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // Alarms run with the lock released, so poisoning can only come from
        // a panicking test; keep going with the inner state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let due = {
            let mut state = self.lock();
            state.now += duration;
            let now = state.now;
            let (due, pending): (Vec<Alarm>, Vec<Alarm>) =
                state.alarms.drain(..).partition(|(at, _)| *at <= now);
            state.alarms = pending;
            due
        };
        for (_, callback) in due {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_manual_clock_fires_alarms_once() {
        let clock = ManualClock::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        clock.at(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        clock.sleep(Duration::from_millis(50));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        clock.sleep(Duration::from_millis(50));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(clock.now(), Duration::from_millis(1100));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now() >= a + Duration::from_millis(5));
    }
}
