//! GPIO / peripheral assignments for the flight board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Geiger tube
// ---------------------------------------------------------------------------

/// Digital input: tube pulse line.  Both edges raise an interrupt.
pub const GEIGER_PIN: u8 = 3;
/// Digital output: HV converter enable (active HIGH).
pub const HV_GATE_PIN: u8 = 6;

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// Digital output: pulse indicator LED (active HIGH).
pub const LED_PIN: u8 = 4;

// ---------------------------------------------------------------------------
// Barometer (MS5607 on SPI)
// ---------------------------------------------------------------------------

/// SPI bus channel the barometer sits on.
pub const BAROMETER_SPI_CHANNEL: u8 = 0;
/// SPI mode (CPOL = 1, CPHA = 1).
pub const BAROMETER_SPI_MODE: u8 = 3;
/// SPI clock (Hz).
pub const BAROMETER_SPI_HZ: u32 = 1_000_000;
