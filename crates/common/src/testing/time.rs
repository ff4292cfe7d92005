//! Mock clock for deterministic tests

// Allow missing panics docs - poisoned mutexes in test utilities should fail
// the test immediately
#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::time::Clock;

/// Mock clock for deterministic testing
///
/// Time only moves when [`MockClock::advance`] or
/// [`MockClock::set_elapsed`] is called. Clones share the same timeline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use flowstash_common::testing::MockClock;
/// use flowstash_common::Clock;
///
/// let clock = MockClock::at_millis(1_000);
///
/// // Simulate 5 seconds passing
/// clock.advance(Duration::from_secs(5));
///
/// assert_eq!(clock.millis_since_epoch(), 6_000);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    elapsed: Arc<Mutex<Duration>>,
    base_system_time: SystemTime,
}

impl MockClock {
    /// Create a new mock clock starting at the current real time
    pub fn new() -> Self {
        Self::starting_at(SystemTime::now())
    }

    /// Create a mock clock whose wall time starts at `base_system_time`
    pub fn starting_at(base_system_time: SystemTime) -> Self {
        Self { elapsed: Arc::new(Mutex::new(Duration::ZERO)), base_system_time }
    }

    /// Create a mock clock starting `millis` milliseconds after the epoch
    pub fn at_millis(millis: u64) -> Self {
        Self::starting_at(UNIX_EPOCH + Duration::from_millis(millis))
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        // Test utility: panic on poisoned mutex to fail tests early
        let mut elapsed = self.elapsed.lock().expect("mutex poisoned");
        *elapsed += duration;
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().expect("mutex poisoned");
        *elapsed = duration;
    }

    /// Get the current elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().expect("mutex poisoned")
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }
}
