//! In-memory GPIO adapter for host simulation and tests.
//!
//! Output levels are recorded per pin.  Edge callbacks are stored and
//! invoked synchronously by [`SimGpio::fire_edge`], which plays the role
//! of the interrupt controller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::ports::{EdgeCallback, EdgeTrigger, GpioPort, Level};
use crate::error::GpioError;

/// Highest pin number the simulated board exposes.
pub const MAX_PIN: u8 = 40;

#[derive(Default)]
struct Pins {
    outputs: HashMap<u8, Level>,
    high_writes: HashMap<u8, usize>,
    callbacks: HashMap<u8, (EdgeTrigger, Arc<dyn Fn(u64) + Send + Sync>)>,
}

#[derive(Default)]
pub struct SimGpio {
    pins: Mutex<Pins>,
    fail_writes: AtomicBool,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pins> {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last level written to an output pin.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.lock().outputs.get(&pin).copied()
    }

    /// Number of writes that drove `pin` high.
    pub fn writes_high(&self, pin: u8) -> usize {
        self.lock().high_writes.get(&pin).copied().unwrap_or(0)
    }

    /// Make every subsequent `set_level` fail.
    pub fn set_write_failing(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn has_callback(&self, pin: u8) -> bool {
        self.lock().callbacks.contains_key(&pin)
    }

    /// Deliver an edge at timestamp `ts_ns`.  Returns `false` if nothing
    /// is attached to `pin`.
    ///
    /// The callback runs outside the pin table lock, so it may call back
    /// into this adapter.
    pub fn fire_edge(&self, pin: u8, ts_ns: u64) -> bool {
        let callback = self.lock().callbacks.get(&pin).map(|(_, cb)| cb.clone());
        match callback {
            Some(cb) => {
                cb(ts_ns);
                true
            }
            None => false,
        }
    }
}

fn check_pin(pin: u8) -> Result<(), GpioError> {
    if pin > MAX_PIN {
        Err(GpioError::InvalidPin(pin))
    } else {
        Ok(())
    }
}

impl GpioPort for SimGpio {
    fn configure_output(&self, pin: u8) -> Result<(), GpioError> {
        check_pin(pin)?;
        self.lock().outputs.entry(pin).or_insert(Level::Low);
        Ok(())
    }

    fn set_level(&self, pin: u8, level: Level) -> Result<(), GpioError> {
        check_pin(pin)?;
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(GpioError::WriteFailed(pin));
        }
        let mut pins = self.lock();
        pins.outputs.insert(pin, level);
        if level == Level::High {
            *pins.high_writes.entry(pin).or_insert(0) += 1;
        }
        Ok(())
    }

    fn register_edge_callback(
        &self,
        pin: u8,
        trigger: EdgeTrigger,
        callback: EdgeCallback,
    ) -> Result<(), GpioError> {
        check_pin(pin)?;
        let mut pins = self.lock();
        if pins.callbacks.contains_key(&pin) {
            return Err(GpioError::ConfigureFailed(pin));
        }
        pins.callbacks.insert(pin, (trigger, Arc::from(callback)));
        Ok(())
    }
}
