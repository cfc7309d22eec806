//! Host time adapter.
//!
//! Provides the monotonic timebase shared by the edge callbacks and the
//! 1 Hz loop, plus an `embedded-hal` delay for the sensor driver.
//!
//! Both are backed by `std::time::Instant`.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::app::ports::ClockPort;

/// Monotonic clock started at construction.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since start (monotonic).
    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }
}

impl ClockPort for MonotonicClock {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.uptime().as_nanos()).unwrap_or(u64::MAX)
    }

    fn elapsed_secs(&self) -> u64 {
        self.uptime().as_secs()
    }

    /// Sleep to the next whole second of uptime.  The deadline is derived
    /// from the start instant, so loop overruns do not accumulate drift.
    fn sleep_until_next_second(&self) {
        let now = self.uptime();
        let next = Duration::from_secs(now.as_secs() + 1);
        std::thread::sleep(next.saturating_sub(now));
    }
}

/// Blocking delay on the host scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
