//! Instrument configuration parameters
//!
//! All tunable parameters for the monitor.  Values can be overridden from a
//! JSON file through the [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::Osr;

/// Ground station used to derive QFF at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Station latitude in degrees (north positive).
    pub latitude_deg: f64,
    /// Ground elevation above mean sea level (m).
    pub elevation_m: f64,
    /// Height of the sensor above ground at launch (m).
    pub antenna_height_m: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            latitude_deg: 42.29,
            elevation_m: 45.0,
            antenna_height_m: 2.0,
        }
    }
}

/// Core monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // --- Tube ---
    /// Dose-rate conversion of the installed tube (µSv/h per count/min)
    pub tube_conversion_factor: f64,
    /// Longest falling→rising interval accepted as dead time (µs)
    pub dead_time_max_us: u32,

    // --- HV control ---
    /// Altitude above which HV is switched on (m)
    pub geiger_alt_m: f64,
    /// Hysteresis margin below `geiger_alt_m` before HV is switched off (m)
    pub dead_band_m: f64,
    /// Length of the one-shot power-on self-test (s); 0 disables it
    pub post_duration_secs: u32,

    // --- Aggregation ---
    /// Number of one-second slots in the count ring
    pub ring_len_secs: usize,
    /// Trailing window used for the reported dose rate (s)
    pub dose_window_secs: usize,

    // --- Indicator ---
    /// LED on-time per counted pulse (ms)
    pub indicator_flash_ms: u32,
    /// Upper bound on accumulated LED on-time (ms)
    pub indicator_max_owed_ms: u32,

    // --- Barometer ---
    /// Oversampling ratio for the pressure conversion (256..=4096)
    pub pressure_osr: u16,
    /// Oversampling ratio for the temperature conversion (256..=4096)
    pub temperature_osr: u16,

    // --- QFF ---
    pub station: StationConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // Tube (SBM-20)
            tube_conversion_factor: 0.0057,
            dead_time_max_us: 650,

            // HV control
            geiger_alt_m: 150.0,
            dead_band_m: 5.0,
            post_duration_secs: 10,

            // Aggregation
            ring_len_secs: 60,
            dose_window_secs: 60,

            // Indicator
            indicator_flash_ms: 10,
            indicator_max_owed_ms: 1000,

            // Barometer
            pressure_osr: 256,
            temperature_osr: 4096,

            station: StationConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Altitude below which an energised tube is switched off.
    pub fn hv_off_altitude_m(&self) -> f64 {
        self.geiger_alt_m - self.dead_band_m
    }

    /// Dead-time ceiling in nanoseconds.
    pub fn dead_time_max_ns(&self) -> u64 {
        u64::from(self.dead_time_max_us) * 1_000
    }

    /// Pressure OSR, falling back to the lowest ratio if unset or invalid.
    pub fn pressure_osr(&self) -> Osr {
        Osr::from_ratio(self.pressure_osr).unwrap_or(Osr::X256)
    }

    /// Temperature OSR, falling back to the highest ratio if unset or invalid.
    pub fn temperature_osr(&self) -> Osr {
        Osr::from_ratio(self.temperature_osr).unwrap_or(Osr::X4096)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tube_conversion_factor > 0.0 && self.tube_conversion_factor <= 1.0) {
            return Err(ConfigError::ValidationFailed(
                "tube_conversion_factor must be in (0, 1]",
            ));
        }
        if !(100..=5_000).contains(&self.dead_time_max_us) {
            return Err(ConfigError::ValidationFailed(
                "dead_time_max_us must be 100–5000",
            ));
        }
        if !(self.geiger_alt_m.is_finite() && (-500.0..=40_000.0).contains(&self.geiger_alt_m)) {
            return Err(ConfigError::ValidationFailed(
                "geiger_alt_m must be -500–40000",
            ));
        }
        if !(self.dead_band_m > 0.0 && self.dead_band_m <= 1_000.0) {
            return Err(ConfigError::ValidationFailed(
                "dead_band_m must be in (0, 1000]",
            ));
        }
        if self.post_duration_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "post_duration_secs must be 0–600",
            ));
        }
        if !(2..=3_600).contains(&self.ring_len_secs) {
            return Err(ConfigError::ValidationFailed(
                "ring_len_secs must be 2–3600",
            ));
        }
        if self.dose_window_secs == 0 || self.dose_window_secs > self.ring_len_secs {
            return Err(ConfigError::ValidationFailed(
                "dose_window_secs must be 1–ring_len_secs",
            ));
        }
        if !(1..=500).contains(&self.indicator_flash_ms) {
            return Err(ConfigError::ValidationFailed(
                "indicator_flash_ms must be 1–500",
            ));
        }
        if self.indicator_max_owed_ms < self.indicator_flash_ms {
            return Err(ConfigError::ValidationFailed(
                "indicator_max_owed_ms must be >= indicator_flash_ms",
            ));
        }
        if Osr::from_ratio(self.pressure_osr).is_none() {
            return Err(ConfigError::ValidationFailed(
                "pressure_osr must be 256, 512, 1024, 2048 or 4096",
            ));
        }
        if Osr::from_ratio(self.temperature_osr).is_none() {
            return Err(ConfigError::ValidationFailed(
                "temperature_osr must be 256, 512, 1024, 2048 or 4096",
            ));
        }
        let s = &self.station;
        if !(-90.0..=90.0).contains(&s.latitude_deg) {
            return Err(ConfigError::ValidationFailed(
                "station.latitude_deg must be -90–90",
            ));
        }
        if !(-500.0..=9_000.0).contains(&s.elevation_m) {
            return Err(ConfigError::ValidationFailed(
                "station.elevation_m must be -500–9000",
            ));
        }
        if !(0.0..=1_000.0).contains(&s.antenna_height_m) {
            return Err(ConfigError::ValidationFailed(
                "station.antenna_height_m must be 0–1000",
            ));
        }
        Ok(())
    }
}
