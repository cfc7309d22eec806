//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (console via `env_logger` on the host).  A downlink
//! adapter would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::{AppEvent, SecondRecord};
use crate::app::ports::EventSink;
use crate::units;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Record(r) => {
                info!("REC | {} | {}", units::format_elapsed(r.elapsed_secs), r.to_line());
                if let Some(imperial) = imperial_line(r) {
                    debug!("REC | {}", imperial);
                }
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::HvSwitched(on) => {
                info!("HV | {}", if *on { "ON" } else { "OFF" });
            }
            AppEvent::QffSet(qff) => {
                info!("QFF | {:.2} mbar", qff);
            }
            AppEvent::Anomaly(a) => {
                warn!("ANOMALY | {}", a);
            }
            AppEvent::AnomaliesDropped(n) => {
                warn!("ANOMALY | {} reports dropped (queue full)", n);
            }
            AppEvent::SensorFault(e) => {
                warn!("SENSOR | {}", e);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::Stopped => {
                info!("STOP | HV off");
            }
        }
    }
}

/// Barometer fields in °F and inHg, rounded up for display.
fn imperial_line(r: &SecondRecord) -> Option<String> {
    let b = r.barometer?;
    Some(format!(
        "{:.2} F, {:.2} inHg",
        units::round_up(units::celsius_to_fahrenheit(b.temperature_c), 2),
        units::round_up(units::mbar_to_inhg(b.pressure2_mbar), 2)
    ))
}

/// Sink that keeps every event in memory, for tests and the simulator.
#[derive(Debug, Default)]
pub struct VecEventSink {
    pub events: Vec<AppEvent>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every per-second record emitted so far.
    pub fn records(&self) -> impl Iterator<Item = &SecondRecord> {
        self.events.iter().filter_map(|e| match e {
            AppEvent::Record(r) => Some(r),
            _ => None,
        })
    }
}

impl EventSink for VecEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
