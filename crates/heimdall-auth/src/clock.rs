//! Injectable clock.
//!
//! All expiry decisions in the lifecycle service go through a [`Clock`] so
//! that boundary behavior is testable without real-time waits.

use std::sync::RwLock;

use time::OffsetDateTime;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> OffsetDateTime;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock whose time is set explicitly. Intended for tests that need to
/// sit exactly on an expiry boundary.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a manual clock fixed at the given instant.
    #[must_use]
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock forward by the given duration.
    pub fn advance(&self, by: time::Duration) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now += by;
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, to: OffsetDateTime) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.read().expect("clock lock poisoned")
    }
}
