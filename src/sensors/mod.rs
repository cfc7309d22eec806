//! Barometric sensor subsystem: MS5607 driver, calibration and compensation.
//!
//! ```text
//!   SensorTransport (SPI / sim) ──▶ Ms5607 ──▶ RawSample ──▶ compensation
//!                                    │
//!                              Calibration (CRC-checked once)
//! ```
//!
//! The transport only moves bytes.  Settle delays after reset and after a
//! conversion command are the driver's responsibility.

pub mod calibration;
pub mod compensation;
pub mod ms5607;
pub mod sim;
pub mod spi;

use crate::error::TransportError;

pub use calibration::Calibration;
pub use compensation::Reading;
pub use ms5607::Ms5607;

// ---------------------------------------------------------------------------
// Conversion parameters
// ---------------------------------------------------------------------------

/// ADC oversampling ratio.  Higher ratios trade conversion time for noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Osr {
    X256,
    X512,
    X1024,
    X2048,
    X4096,
}

impl Osr {
    pub const ALL: [Osr; 5] = [Osr::X256, Osr::X512, Osr::X1024, Osr::X2048, Osr::X4096];

    /// Parse a numeric ratio (256, 512, ... 4096).
    pub fn from_ratio(ratio: u16) -> Option<Self> {
        match ratio {
            256 => Some(Self::X256),
            512 => Some(Self::X512),
            1024 => Some(Self::X1024),
            2048 => Some(Self::X2048),
            4096 => Some(Self::X4096),
            _ => None,
        }
    }

    pub fn ratio(self) -> u16 {
        match self {
            Self::X256 => 256,
            Self::X512 => 512,
            Self::X1024 => 1024,
            Self::X2048 => 2048,
            Self::X4096 => 4096,
        }
    }

    /// Low bits of the conversion command selecting this ratio.
    pub fn command_bits(self) -> u8 {
        match self {
            Self::X256 => 0x00,
            Self::X512 => 0x02,
            Self::X1024 => 0x04,
            Self::X2048 => 0x06,
            Self::X4096 => 0x08,
        }
    }

    /// Minimum wait between the conversion command and the ADC read (µs).
    pub fn conversion_delay_us(self) -> u32 {
        match self {
            Self::X256 => 900,
            Self::X512 => 3_000,
            Self::X1024 => 4_000,
            Self::X2048 => 6_000,
            Self::X4096 => 10_000,
        }
    }
}

/// Which quantity a conversion digitises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// D1, uncompensated pressure.
    Pressure,
    /// D2, uncompensated temperature.
    Temperature,
}

impl Channel {
    pub fn command_bits(self) -> u8 {
        match self {
            Self::Pressure => 0x00,
            Self::Temperature => 0x10,
        }
    }
}

/// One pair of 24-bit ADC words, valid only after both conversions settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// D2
    pub temperature: u32,
    /// D1
    pub pressure: u32,
}

/// Assemble a 24-bit ADC word from three register bytes, MSB first.
pub fn adc_word(bytes: [u8; 3]) -> u32 {
    65_536 * u32::from(bytes[0]) + 256 * u32::from(bytes[1]) + u32::from(bytes[2])
}

// ---------------------------------------------------------------------------
// Transport capability
// ---------------------------------------------------------------------------

/// Byte-level access to the sensor.  Implementations never sleep; the
/// caller honours the reset and conversion settle times.
pub trait SensorTransport {
    /// Issue the reset command.
    fn reset(&mut self) -> Result<(), TransportError>;

    /// Read PROM word `index` (0..8).
    fn read_calibration_word(&mut self, index: u8) -> Result<u16, TransportError>;

    /// Start a conversion of `channel` at `osr`.
    fn start_conversion(&mut self, channel: Channel, osr: Osr) -> Result<(), TransportError>;

    /// Read the result of the last conversion (24 bits).
    fn read_converted_word(&mut self) -> Result<u32, TransportError>;
}
