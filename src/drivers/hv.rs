//! High-voltage supply switch for the Geiger tube.
//!
//! One GPIO gates the HV converter.  The recorded state lives behind its
//! own lock and only changes after a successful write.  The lock is never
//! held across the GPIO call; the 1 Hz loop is the only writer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::app::ports::{GpioPort, Level};
use crate::error::GpioError;

pub struct HvSwitch {
    gpio: Arc<dyn GpioPort>,
    pin: u8,
    on: Mutex<bool>,
}

impl HvSwitch {
    /// Configure the gate pin as an output and drive it low.
    pub fn new(gpio: Arc<dyn GpioPort>, pin: u8) -> Result<Self, GpioError> {
        gpio.configure_output(pin)?;
        gpio.set_level(pin, Level::Low)?;
        Ok(Self {
            gpio,
            pin,
            on: Mutex::new(false),
        })
    }

    /// Drive the supply.  Returns `true` if the state changed.
    ///
    /// On a failed write the recorded state is left as it was.
    pub fn set(&self, on: bool) -> Result<bool, GpioError> {
        if self.is_on() == on {
            return Ok(false);
        }
        if let Err(e) = self.gpio.set_level(self.pin, Level::from(on)) {
            warn!("HV: gate write failed: {e}");
            return Err(e);
        }
        *self.lock() = on;
        info!("HV: {}", if on { "ON" } else { "OFF" });
        Ok(true)
    }

    pub fn is_on(&self) -> bool {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.on.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
