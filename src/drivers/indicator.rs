//! Pulse indicator LED.
//!
//! Each counted pulse adds a fixed on-time to an "owed" budget.  A
//! background thread lights the LED while any budget remains and blocks
//! on a condvar otherwise.  The edge path only bumps a counter and
//! notifies; it never touches the GPIO.
//!
//! ```text
//!   edge ──request_flash()──▶ owed_ms += flash ──notify──▶ run() ──▶ LED
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};

use crate::app::ports::{GpioPort, Level};

#[derive(Debug, Default)]
struct IndicatorState {
    owed_ms: u32,
    shutdown: bool,
    lit: bool,
}

pub struct Indicator {
    state: Mutex<IndicatorState>,
    wake: Condvar,
    flash_ms: u32,
    max_owed_ms: u32,
}

impl Indicator {
    pub fn new(flash_ms: u32, max_owed_ms: u32) -> Self {
        Self {
            state: Mutex::new(IndicatorState::default()),
            wake: Condvar::new(),
            flash_ms,
            max_owed_ms: max_owed_ms.max(flash_ms),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndicatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owe one more flash.  Safe to call from the edge callback.
    pub fn request_flash(&self) {
        let mut s = self.lock();
        s.owed_ms = s
            .owed_ms
            .saturating_add(self.flash_ms)
            .min(self.max_owed_ms);
        drop(s);
        self.wake.notify_one();
    }

    pub fn owed_ms(&self) -> u32 {
        self.lock().owed_ms
    }

    pub fn is_lit(&self) -> bool {
        self.lock().lit
    }

    /// Ask [`run`](Self::run) to switch the LED off and return.
    pub fn shutdown(&self) {
        self.lock().shutdown = true;
        self.wake.notify_all();
    }

    /// Indicator thread body.  Returns after [`shutdown`](Self::shutdown)
    /// with the LED off.
    pub fn run(&self, gpio: &dyn GpioPort, pin: u8) {
        loop {
            let mut s = self
                .wake
                .wait_while(self.lock(), |s| s.owed_ms == 0 && !s.shutdown)
                .unwrap_or_else(PoisonError::into_inner);
            if s.shutdown {
                break;
            }

            s.lit = true;
            drop(s);
            drive(gpio, pin, Level::High);

            // Burn down the budget, picking up flashes that arrive meanwhile.
            let mut s = self.lock();
            while s.owed_ms > 0 && !s.shutdown {
                let chunk = s.owed_ms;
                s.owed_ms = 0;
                s = self
                    .wake
                    .wait_timeout_while(s, Duration::from_millis(u64::from(chunk)), |s| {
                        !s.shutdown
                    })
                    .map(|(guard, _)| guard)
                    .unwrap_or_else(|e| e.into_inner().0);
            }
            s.lit = false;
            let stop = s.shutdown;
            drop(s);
            drive(gpio, pin, Level::Low);

            if stop {
                break;
            }
        }
        drive(gpio, pin, Level::Low);
        debug!("indicator stopped");
    }
}

fn drive(gpio: &dyn GpioPort, pin: u8, level: Level) {
    if let Err(e) = gpio.set_level(pin, level) {
        warn!("indicator: {e}");
    }
}
