//! MS5607 barometric pressure / temperature sensor driver.
//!
//! Owns a [`SensorTransport`] and a delay provider.  Setup resets the part,
//! waits for the PROM reload, reads and CRC-checks the calibration set.  A
//! sample is two conversions, each followed by the OSR-dependent settle
//! delay before the ADC word is read.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::app::ports::BarometerPort;
use crate::error::{SensorError, SetupError};

use super::calibration::PROM_WORDS;
use super::{Calibration, Channel, Osr, RawSample, SensorTransport};

/// Time for the PROM to reload after a reset (µs).
pub const RESET_SETTLE_US: u32 = 3_000;

pub struct Ms5607<T, D> {
    transport: T,
    delay: D,
    calibration: Calibration,
    pressure_osr: Osr,
    temperature_osr: Osr,
}

impl<T: SensorTransport, D: DelayNs> Ms5607<T, D> {
    /// Reset the sensor and load its calibration.  Fails on any transport
    /// error or on a PROM checksum mismatch.
    pub fn setup(
        mut transport: T,
        mut delay: D,
        pressure_osr: Osr,
        temperature_osr: Osr,
    ) -> Result<Self, SetupError> {
        transport.reset()?;
        delay.delay_us(RESET_SETTLE_US);

        let mut words = [0u16; PROM_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = transport.read_calibration_word(i as u8)?;
        }
        debug!("MS5607 PROM: {:?}", words);

        let calibration = Calibration::from_words(words)?;
        info!(
            "MS5607 ready: C1..C6 = {:?}, OSR P/T = {}/{}",
            &words[1..7],
            pressure_osr.ratio(),
            temperature_osr.ratio()
        );

        Ok(Self {
            transport,
            delay,
            calibration,
            pressure_osr,
            temperature_osr,
        })
    }

    /// Convert one channel and return its 24-bit word.
    pub fn read_channel(&mut self, channel: Channel, osr: Osr) -> Result<u32, SensorError> {
        self.transport.start_conversion(channel, osr)?;
        self.delay.delay_us(osr.conversion_delay_us());
        Ok(self.transport.read_converted_word()?)
    }

    pub fn read_pressure_raw(&mut self) -> Result<u32, SensorError> {
        self.read_channel(Channel::Pressure, self.pressure_osr)
    }

    pub fn read_temperature_raw(&mut self) -> Result<u32, SensorError> {
        self.read_channel(Channel::Temperature, self.temperature_osr)
    }

    /// Give back the transport, e.g. to re-run setup after a bus fault.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }
}

impl<T: SensorTransport, D: DelayNs> BarometerPort for Ms5607<T, D> {
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        let pressure = self.read_pressure_raw()?;
        let temperature = self.read_temperature_raw()?;
        Ok(RawSample {
            temperature,
            pressure,
        })
    }

    fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}
