//! Injectable time source
//!
//! Cache expiry and relative-time formatting both depend on "now". Routing
//! every read of the current time through the [`Clock`] trait lets tests pin
//! time to a fixed instant instead of sleeping against the wall clock.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a settable instant.
///
/// Intended for tests that need to move time forward deterministically.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock pinned to the given instant.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Repins the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        match self.now.lock() {
            Ok(mut guard) => *guard += duration,
            Err(poisoned) => *poisoned.into_inner() += duration,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_pinned_instant() {
        let instant = Utc::now();
        let clock = FixedClock::new(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant, "Repeated reads should not drift");
    }

    #[test]
    fn test_fixed_clock_advance() {
        let start = Utc::now();
        let clock = FixedClock::new(start);

        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));

        clock.advance(Duration::hours(1));
        assert_eq!(clock.now(), start + Duration::hours(1) + Duration::minutes(5));
    }

    #[test]
    fn test_fixed_clock_set() {
        let clock = FixedClock::new(Utc::now());
        let later = Utc::now() + Duration::days(2);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
