// src/utils/time.rs
//! Monotonic clock abstraction for dependency injection and testing
//!
//! The acquisition loop spin-waits on this clock instead of sleeping, so the
//! clock must be cheap to poll. The mock advances a configurable tick on
//! every poll, which lets the spin-wait make progress in tests without any
//! wall-clock delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait MonotonicClock: Send + Sync {
    /// Microseconds since an arbitrary fixed origin.
    fn now_micros(&self) -> u64;

    /// Coarse wait, used for settle times and setup backoff only; the
    /// sampling loop never calls this.
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// System clock backed by [`Instant`].
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Clock with its origin at the moment of creation.
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

impl MonotonicClock for SystemClock {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Deterministic clock for tests.
pub struct MockClock {
    current_micros: AtomicU64,
    auto_tick_micros: u64,
}

impl MockClock {
    /// Clock frozen at `start_micros`; advances only via [`advance_by`].
    ///
    /// [`advance_by`]: MockClock::advance_by
    pub fn new(start_micros: u64) -> Self {
        Self {
            current_micros: AtomicU64::new(start_micros),
            auto_tick_micros: 0,
        }
    }

    /// Clock that advances by `tick_micros` after every poll, so spin-waits
    /// terminate.
    pub fn with_auto_tick(start_micros: u64, tick_micros: u64) -> Self {
        Self {
            current_micros: AtomicU64::new(start_micros),
            auto_tick_micros: tick_micros,
        }
    }

    /// Advance the clock manually.
    pub fn advance_by(&self, micros: u64) {
        self.current_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Jump the clock to an absolute value.
    pub fn set_time(&self, micros: u64) {
        self.current_micros.store(micros, Ordering::Relaxed);
    }
}

impl MonotonicClock for MockClock {
    fn now_micros(&self) -> u64 {
        self.current_micros
            .fetch_add(self.auto_tick_micros, Ordering::Relaxed)
    }

    fn sleep(&self, duration: Duration) {
        self.advance_by(duration.as_micros() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_micros();
        let second = clock.now_micros();
        assert!(second >= first);
    }

    #[test]
    fn test_mock_clock_advances_manually() {
        let clock = MockClock::new(1000);
        assert_eq!(clock.now_micros(), 1000);
        clock.advance_by(250);
        assert_eq!(clock.now_micros(), 1250);
        clock.set_time(40);
        assert_eq!(clock.now_micros(), 40);
    }

    #[test]
    fn test_mock_clock_auto_tick_advances_per_poll() {
        let clock = MockClock::with_auto_tick(0, 10);
        assert_eq!(clock.now_micros(), 0);
        assert_eq!(clock.now_micros(), 10);
        assert_eq!(clock.now_micros(), 20);
    }

    #[test]
    fn test_mock_clock_sleep_advances_time() {
        let clock = MockClock::new(0);
        clock.sleep(Duration::from_millis(10));
        assert_eq!(clock.now_micros(), 10_000);
    }
}
