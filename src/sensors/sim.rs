//! Simulated MS5607 for host runs and tests.
//!
//! Serves a sealed PROM (the datasheet coefficients) and raw words that can
//! be changed at runtime through a cloneable [`SimBarometerHandle`], so a
//! flight-profile thread can drive the pressure the control loop sees.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::TransportError;

use super::calibration::{seal, PROM_WORDS};
use super::{compensation, Calibration, Channel, Osr, SensorTransport};

/// Datasheet example coefficients (C0 and the CRC word are synthetic).
pub const DATASHEET_COEFFICIENTS: [u16; PROM_WORDS] =
    [0x0000, 46372, 43981, 29059, 27842, 31553, 28165, 0x0000];
/// Datasheet example D1 (≈1100 mbar).
pub const DATASHEET_D1: u32 = 6_465_444;
/// Datasheet example D2 (≈20.00 °C).
pub const DATASHEET_D2: u32 = 8_077_636;

#[derive(Debug)]
struct SimState {
    d1: AtomicU32,
    d2: AtomicU32,
    fail: AtomicBool,
    conversions: AtomicU32,
}

/// Shared control surface for a [`SimTransport`].
#[derive(Debug, Clone)]
pub struct SimBarometerHandle {
    state: Arc<SimState>,
    calibration: Calibration,
}

impl SimBarometerHandle {
    pub fn set_raw(&self, d1: u32, d2: u32) {
        self.state.d1.store(d1, Ordering::Relaxed);
        self.state.d2.store(d2, Ordering::Relaxed);
    }

    /// Choose D1 so that the first-order pressure at the current D2 is
    /// `mbar`.  At or above 20 °C this is also the second-order pressure.
    pub fn set_pressure_mbar(&self, mbar: f64) {
        let d2 = self.state.d2.load(Ordering::Relaxed);
        let off = compensation::offset(&self.calibration, d2);
        let sens = compensation::sensitivity(&self.calibration, d2);
        let d1 = ((mbar * 100.0 * 32_768.0 + off) * 2_097_152.0 / sens).round();
        self.state
            .d1
            .store(d1.clamp(0.0, f64::from(0x00FF_FFFFu32)) as u32, Ordering::Relaxed);
    }

    /// Make every transport call fail until cleared.
    pub fn set_failing(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::Relaxed);
    }

    /// Number of conversions started so far.
    pub fn conversions(&self) -> u32 {
        self.state.conversions.load(Ordering::Relaxed)
    }
}

pub struct SimTransport {
    prom: [u16; PROM_WORDS],
    state: Arc<SimState>,
    pending: Option<Channel>,
}

impl SimTransport {
    /// Transport serving `coefficients` with a valid CRC and the given raw words.
    pub fn new(coefficients: [u16; PROM_WORDS], d1: u32, d2: u32) -> (Self, SimBarometerHandle) {
        let prom = seal(coefficients);
        let state = Arc::new(SimState {
            d1: AtomicU32::new(d1),
            d2: AtomicU32::new(d2),
            fail: AtomicBool::new(false),
            conversions: AtomicU32::new(0),
        });
        let handle = SimBarometerHandle {
            state: state.clone(),
            calibration: Calibration::from_coefficients_unchecked(prom),
        };
        (
            Self {
                prom,
                state,
                pending: None,
            },
            handle,
        )
    }

    /// The datasheet example part at 20 °C / 1100 mbar.
    pub fn datasheet() -> (Self, SimBarometerHandle) {
        Self::new(DATASHEET_COEFFICIENTS, DATASHEET_D1, DATASHEET_D2)
    }

    /// Overwrite a PROM word after sealing, e.g. to corrupt the checksum.
    pub fn with_prom_word(mut self, index: usize, word: u16) -> Self {
        if let Some(w) = self.prom.get_mut(index) {
            *w = word;
        }
        self
    }

    fn check(&self) -> Result<(), TransportError> {
        if self.state.fail.load(Ordering::Relaxed) {
            Err(TransportError::Bus)
        } else {
            Ok(())
        }
    }
}

impl SensorTransport for SimTransport {
    fn reset(&mut self) -> Result<(), TransportError> {
        self.check()?;
        self.pending = None;
        Ok(())
    }

    fn read_calibration_word(&mut self, index: u8) -> Result<u16, TransportError> {
        self.check()?;
        self.prom
            .get(index as usize)
            .copied()
            .ok_or(TransportError::InvalidAddress(index))
    }

    fn start_conversion(&mut self, channel: Channel, _osr: Osr) -> Result<(), TransportError> {
        self.check()?;
        self.state.conversions.fetch_add(1, Ordering::Relaxed);
        self.pending = Some(channel);
        Ok(())
    }

    fn read_converted_word(&mut self) -> Result<u32, TransportError> {
        self.check()?;
        match self.pending.take() {
            Some(Channel::Pressure) => Ok(self.state.d1.load(Ordering::Relaxed)),
            Some(Channel::Temperature) => Ok(self.state.d2.load(Ordering::Relaxed)),
            None => Err(TransportError::NoConversion),
        }
    }
}
