//! MS5607 command layer over an `embedded-hal` SPI device.
//!
//! Chip select and bus locking belong to the [`SpiDevice`] implementation.
//! Mode 0 or 3, up to 20 MHz.

use embedded_hal::spi::{Operation, SpiDevice};
use log::debug;

use crate::error::TransportError;

use super::calibration::PROM_WORDS;
use super::{adc_word, Channel, Osr, SensorTransport};

pub const CMD_RESET: u8 = 0x1E;
pub const CMD_ADC_READ: u8 = 0x00;
pub const CMD_ADC_CONV: u8 = 0x40;
pub const CMD_PROM_READ: u8 = 0xA0;

/// Conversion command byte for `channel` at `osr`.
pub fn conversion_command(channel: Channel, osr: Osr) -> u8 {
    CMD_ADC_CONV | channel.command_bits() | osr.command_bits()
}

pub struct SpiTransport<S> {
    spi: S,
}

impl<S: SpiDevice> SpiTransport<S> {
    pub fn new(spi: S) -> Self {
        Self { spi }
    }

    pub fn into_inner(self) -> S {
        self.spi
    }
}

fn bus_error<E: embedded_hal::spi::Error>(e: &E) -> TransportError {
    debug!("SPI error: {:?}", e.kind());
    TransportError::Bus
}

impl<S: SpiDevice> SensorTransport for SpiTransport<S> {
    fn reset(&mut self) -> Result<(), TransportError> {
        self.spi.write(&[CMD_RESET]).map_err(|e| bus_error(&e))
    }

    fn read_calibration_word(&mut self, index: u8) -> Result<u16, TransportError> {
        if index as usize >= PROM_WORDS {
            return Err(TransportError::InvalidAddress(index));
        }
        let mut buf = [0u8; 2];
        self.spi
            .transaction(&mut [
                Operation::Write(&[CMD_PROM_READ + index * 2]),
                Operation::Read(&mut buf),
            ])
            .map_err(|e| bus_error(&e))?;
        Ok(u16::from_be_bytes(buf))
    }

    fn start_conversion(&mut self, channel: Channel, osr: Osr) -> Result<(), TransportError> {
        self.spi
            .write(&[conversion_command(channel, osr)])
            .map_err(|e| bus_error(&e))
    }

    fn read_converted_word(&mut self) -> Result<u32, TransportError> {
        let mut buf = [0u8; 3];
        self.spi
            .transaction(&mut [Operation::Write(&[CMD_ADC_READ]), Operation::Read(&mut buf)])
            .map_err(|e| bus_error(&e))?;
        Ok(adc_word(buf))
    }
}
