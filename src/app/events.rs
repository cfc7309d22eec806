//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to console, append to a file,
//! hand to a downlink.

use serde::Serialize;

use crate::error::SensorError;
use crate::events::Anomaly;
use crate::fsm::StateId;
use crate::sensors::Reading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The once-per-second record.
    Record(SecondRecord),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The HV supply was switched.
    HvSwitched(bool),

    /// A sea-level reference pressure was established.
    QffSet(f64),

    /// A pulse-path anomaly drained from the interrupt queue.
    Anomaly(Anomaly),

    /// Anomalies lost because the queue was full.
    AnomaliesDropped(u32),

    /// The barometer could not be read this second.
    SensorFault(SensorError),

    /// The application service has started (carries initial state).
    Started(StateId),

    /// The 1 Hz loop has exited and HV is off.
    Stopped,
}

/// Barometer fields of a [`SecondRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarometerFields {
    pub raw_temperature: u32,
    /// First-order temperature (°C); the altitude input.
    pub temperature_c: f64,
    /// Second-order temperature (°C).
    pub temperature2_c: f64,
    pub raw_pressure: u32,
    pub pressure1_mbar: f64,
    pub pressure2_mbar: f64,
}

impl From<&Reading> for BarometerFields {
    fn from(r: &Reading) -> Self {
        Self {
            raw_temperature: r.raw.temperature,
            temperature_c: r.t1,
            temperature2_c: r.t2,
            raw_pressure: r.raw.pressure,
            pressure1_mbar: r.p1,
            pressure2_mbar: r.p2,
        }
    }
}

/// One second of telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondRecord {
    pub elapsed_secs: u64,
    /// Counts in the second just closed, `None` unless HV was on throughout it.
    pub counts: Option<u32>,
    /// `None` if the barometer read failed.
    pub barometer: Option<BarometerFields>,
    /// `None` if no valid altitude could be derived.
    pub altitude_m: Option<f64>,
    pub dead_time_s: f64,
    pub dead_counts: u32,
    pub hv_on: bool,
    /// Dose rate over the trailing window (µSv/h), `None` while HV is off.
    pub dose_rate_usv_h: Option<f64>,
}

impl SecondRecord {
    /// Render the fields as the console record line.
    pub fn to_line(&self) -> String {
        let counts = self
            .counts
            .map_or_else(|| "N/A".to_string(), |c| c.to_string());
        let baro = self.barometer.map_or_else(
            || "N/A, N/A, N/A, N/A, N/A".to_string(),
            |b| {
                format!(
                    "{}, {:.2}, {}, {:.2}, {:.2}",
                    b.raw_temperature,
                    b.temperature_c,
                    b.raw_pressure,
                    b.pressure1_mbar,
                    b.pressure2_mbar
                )
            },
        );
        let alt = self
            .altitude_m
            .map_or_else(|| "N/A".to_string(), |a| format!("{a:.1}"));
        let dose = self
            .dose_rate_usv_h
            .map_or_else(|| "N/A".to_string(), |d| format!("{d:.4}"));
        format!(
            "{}, {}, {}, {}, {:.6}, {}, {}, {}",
            self.elapsed_secs,
            counts,
            baro,
            alt,
            self.dead_time_s,
            self.dead_counts,
            if self.hv_on { "ON" } else { "OFF" },
            dose
        )
    }
}
