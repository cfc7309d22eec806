//! MS5607 compensation and barometric altitude.
//!
//! Pure functions of the calibration set and raw ADC words.  Temperatures
//! are carried internally in hundredths of a degree (`TEMP`), as the sensor
//! datasheet defines them, and exposed in °C.  Pressures are exposed in mbar.
//!
//! ```text
//!   D2 ──▶ dT ──▶ TEMP ──────────────┐
//!           ├──▶ OFF  ─┐              ├──▶ second-order (TEMP < 20 °C)
//!           └──▶ SENS ─┴──▶ P1 (D1)   │
//!                                     └──▶ P2 ──▶ altitude(QFF)
//! ```

use crate::config::StationConfig;
use crate::error::CompensationError;

use super::{Calibration, RawSample};

/// Specific gas constant of dry air, J/(kg·K).
pub const GAS_CONSTANT: f64 = 287.05;
/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.807;
/// ISA sea-level temperature, K.
pub const SEA_LEVEL_TEMP_K: f64 = 288.15;
/// 0 °C in kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;
/// ISA sea-level pressure, mbar.  Used as QFF until one is computed.
pub const STANDARD_QFF_MBAR: f64 = 1013.25;

const TWO_POW_6: f64 = 64.0;
const TWO_POW_7: f64 = 128.0;
const TWO_POW_8: f64 = 256.0;
const TWO_POW_15: f64 = 32_768.0;
const TWO_POW_16: f64 = 65_536.0;
const TWO_POW_17: f64 = 131_072.0;
const TWO_POW_21: f64 = 2_097_152.0;
const TWO_POW_23: f64 = 8_388_608.0;
const TWO_POW_31: f64 = 2_147_483_648.0;

/// 20.00 °C in hundredths.
const TEMP_REF: f64 = 2000.0;
/// −15.00 °C in hundredths.
const TEMP_COLD: f64 = -1500.0;

// ---------------------------------------------------------------------------
// First order
// ---------------------------------------------------------------------------

/// Difference between actual and reference temperature.
pub fn delta_t(cal: &Calibration, t_raw: u32) -> f64 {
    f64::from(t_raw) - cal.c(5) * TWO_POW_8
}

/// Pressure offset at actual temperature.
pub fn offset(cal: &Calibration, t_raw: u32) -> f64 {
    cal.c(2) * TWO_POW_17 + delta_t(cal, t_raw) * cal.c(4) / TWO_POW_6
}

/// Pressure sensitivity at actual temperature.
pub fn sensitivity(cal: &Calibration, t_raw: u32) -> f64 {
    cal.c(1) * TWO_POW_16 + delta_t(cal, t_raw) * cal.c(3) / TWO_POW_7
}

/// `TEMP`, hundredths of °C.
fn temp_centi(cal: &Calibration, t_raw: u32) -> f64 {
    TEMP_REF + delta_t(cal, t_raw) * cal.c(6) / TWO_POW_23
}

/// First-order temperature, °C.
pub fn first_order_temperature(cal: &Calibration, t_raw: u32) -> f64 {
    temp_centi(cal, t_raw) / 100.0
}

fn pressure_from(p_raw: u32, off: f64, sens: f64) -> f64 {
    (f64::from(p_raw) * sens / TWO_POW_21 - off) / TWO_POW_15 / 100.0
}

/// First-order pressure, mbar.
pub fn first_order_pressure(cal: &Calibration, t_raw: u32, p_raw: u32) -> f64 {
    pressure_from(p_raw, offset(cal, t_raw), sensitivity(cal, t_raw))
}

// ---------------------------------------------------------------------------
// Second order
// ---------------------------------------------------------------------------

/// Low-temperature corrections, all zero at or above 20 °C.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SecondOrderTerms {
    /// Subtracted from `TEMP` (hundredths of °C).
    pub t2: f64,
    pub off2: f64,
    pub sens2: f64,
}

/// Datasheet nonlinear correction for `TEMP < 2000`, with the extra
/// term below `TEMP < -1500`.
pub fn second_order_terms(cal: &Calibration, t_raw: u32) -> SecondOrderTerms {
    let temp = temp_centi(cal, t_raw);
    if temp >= TEMP_REF {
        return SecondOrderTerms::default();
    }

    let dt = delta_t(cal, t_raw);
    let warm = (temp - TEMP_REF) * (temp - TEMP_REF);
    let mut off2 = 61.0 * warm / 16.0;
    let mut sens2 = 2.0 * warm;
    if temp < TEMP_COLD {
        let cold = (temp - TEMP_COLD) * (temp - TEMP_COLD);
        off2 += 15.0 * cold;
        sens2 += 8.0 * cold;
    }

    SecondOrderTerms {
        t2: dt * dt / TWO_POW_31,
        off2,
        sens2,
    }
}

/// Second-order temperature, °C.
pub fn second_order_temperature(cal: &Calibration, t_raw: u32) -> f64 {
    (temp_centi(cal, t_raw) - second_order_terms(cal, t_raw).t2) / 100.0
}

/// Second-order pressure, mbar.
pub fn second_order_pressure(cal: &Calibration, t_raw: u32, p_raw: u32) -> f64 {
    let terms = second_order_terms(cal, t_raw);
    pressure_from(
        p_raw,
        offset(cal, t_raw) - terms.off2,
        sensitivity(cal, t_raw) - terms.sens2,
    )
}

// ---------------------------------------------------------------------------
// Full reading
// ---------------------------------------------------------------------------

/// Every intermediate and output of one compensation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub raw: RawSample,
    pub dt: f64,
    pub offset: f64,
    pub sensitivity: f64,
    /// First-order temperature, °C.
    pub t1: f64,
    /// Second-order temperature, °C.
    pub t2: f64,
    /// First-order pressure, mbar.
    pub p1: f64,
    /// Second-order pressure, mbar.
    pub p2: f64,
}

/// The one canonical compensation pass.
pub fn compensate(cal: &Calibration, raw: RawSample) -> Reading {
    let terms = second_order_terms(cal, raw.temperature);
    let dt = delta_t(cal, raw.temperature);
    let off = offset(cal, raw.temperature);
    let sens = sensitivity(cal, raw.temperature);
    let temp = temp_centi(cal, raw.temperature);

    Reading {
        raw,
        dt,
        offset: off,
        sensitivity: sens,
        t1: temp / 100.0,
        t2: (temp - terms.t2) / 100.0,
        p1: pressure_from(raw.pressure, off, sens),
        p2: pressure_from(raw.pressure, off - terms.off2, sens - terms.sens2),
    }
}

// ---------------------------------------------------------------------------
// Altitude and QFF
// ---------------------------------------------------------------------------

/// Barometric altitude (m) of pressure `pressure_mbar` at `temp_c`,
/// relative to the sea-level reference `qff_mbar`.
pub fn altitude(pressure_mbar: f64, temp_c: f64, qff_mbar: f64) -> Result<f64, CompensationError> {
    if !(pressure_mbar > 0.0) {
        return Err(CompensationError::NonPositivePressure);
    }
    if !(qff_mbar > 0.0) {
        return Err(CompensationError::NonPositiveQff);
    }
    let mean_temp_k = (SEA_LEVEL_TEMP_K + temp_c + KELVIN_OFFSET) / 2.0;
    let h = (GAS_CONSTANT / GRAVITY) * mean_temp_k * (qff_mbar / pressure_mbar).ln();
    if h.is_finite() {
        Ok(h)
    } else {
        Err(CompensationError::NonFinite)
    }
}

/// Reduce a pressure measured `height_m` above the station to station level.
pub fn station_pressure(pressure_mbar: f64, temp_c: f64, height_m: f64) -> f64 {
    pressure_mbar * (GRAVITY * height_m / (GAS_CONSTANT * (temp_c + KELVIN_OFFSET))).exp()
}

/// Temperature term of the QFF reduction, piecewise linear in °C.
pub fn qff_temperature_term(temp_c: f64) -> f64 {
    if temp_c < -7.0 {
        0.5 * temp_c + 275.0
    } else if temp_c < 2.0 {
        0.535 * temp_c + 275.6
    } else {
        1.07 * temp_c + 274.5
    }
}

/// Sea-level reference pressure from a station-level sample.
///
/// `pressure_mbar` is the second-order pressure at the sensor and `temp_c`
/// the compensated temperature there.
pub fn qff(
    pressure_mbar: f64,
    temp_c: f64,
    station: &StationConfig,
) -> Result<f64, CompensationError> {
    if !(pressure_mbar > 0.0) {
        return Err(CompensationError::NonPositivePressure);
    }
    let qfe = station_pressure(pressure_mbar, temp_c, station.antenna_height_m);
    let lat = station.latitude_deg.to_radians();
    let exponent =
        station.elevation_m * 0.034_163 * (1.0 - 0.002_637_3 * lat.cos()) / qff_temperature_term(temp_c);
    let value = qfe * exponent.exp();
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CompensationError::NonFinite)
    }
}
