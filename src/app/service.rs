//! Application service: the hexagonal core.
//!
//! [`MonitorService`] owns the HV state machine, the barometer and the
//! sea-level reference.  Each call to [`step`](MonitorService::step) is
//! one 1 Hz cycle.  All I/O flows through port traits, so the whole
//! cycle is testable with a simulated barometer and GPIO.
//!
//! ```text
//!  BarometerPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                    │     MonitorService     │
//!  SharedState   ◀──▶│  FSM · QFF · records   │
//!                    └────────────────────────┘
//! ```

use std::sync::Arc;

use log::{info, warn};

use crate::config::{MonitorConfig, StationConfig};
use crate::counter::cps_to_dose_rate;
use crate::error::Error;
use crate::fsm::context::ControlContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::sensors::compensation::{self, STANDARD_QFF_MBAR};
use crate::sensors::Reading;
use crate::shared::SharedState;

use super::commands::AppCommand;
use super::events::{AppEvent, BarometerFields, SecondRecord};
use super::ports::{BarometerPort, EventSink};

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

pub struct MonitorService<B: BarometerPort> {
    fsm: Fsm,
    ctx: ControlContext,
    barometer: B,
    /// Sea-level reference (mbar).  Fixed after setup unless recomputed.
    qff: f64,
    shared: Arc<SharedState>,
}

impl<B: BarometerPort> MonitorService<B> {
    /// Construct the service.  Does **not** start the FSM; call
    /// [`start`](Self::start) next.
    pub fn new(config: MonitorConfig, barometer: B, shared: Arc<SharedState>) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), StateId::AwaitingAltitude),
            ctx: ControlContext::new(config),
            barometer,
            qff: STANDARD_QFF_MBAR,
            shared,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.apply_hv(sink);
        self.shared.counter.mark_hv(self.shared.hv_on());
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("MonitorService started in {:?}", self.fsm.current_state());
    }

    /// Read one sample and derive QFF from it for `station`.
    pub fn set_qff(&mut self, station: &StationConfig) -> Result<f64, Error> {
        let reading = self.read_compensated()?;
        let qff = compensation::qff(reading.p2, reading.t1, station)?;
        info!(
            "QFF set to {:.2} mbar (P={:.2} mbar, T={:.2} C)",
            qff, reading.p2, reading.t1
        );
        self.qff = qff;
        Ok(qff)
    }

    pub fn qff(&self) -> f64 {
        self.qff
    }

    // ── Per-second orchestration ──────────────────────────────

    /// Run one 1 Hz cycle and return its record.
    ///
    /// 1. Close the second in progress and make `elapsed` current.
    /// 2. Read and compensate the barometer; derive altitude.
    /// 3. Tick the FSM and apply its HV command.
    /// 4. Emit the record for the closed second.
    /// 5. Drain anomalies reported by the edge path.
    pub fn step(&mut self, elapsed: u64, sink: &mut impl EventSink) -> SecondRecord {
        let (closed_second, sample) = self.shared.counter.roll(elapsed);
        // Counts are only meaningful for seconds the tube was powered throughout.
        let hv_during = sample.hv_on;
        let dose_rate = if hv_during {
            self.shared
                .counter
                .average_completed(self.ctx.config.dose_window_secs)
                .map(|cps| cps_to_dose_rate(cps, self.ctx.config.tube_conversion_factor))
        } else {
            None
        };

        let reading = match self.read_compensated() {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("barometer read failed: {e}");
                if let Error::Sensor(se) = e {
                    sink.emit(&AppEvent::SensorFault(se));
                }
                None
            }
        };
        let altitude = reading.as_ref().and_then(|r| {
            compensation::altitude(r.p2, r.t1, self.qff)
                .map_err(|e| warn!("altitude: {e}"))
                .ok()
        });

        let prev = self.fsm.current_state();
        self.ctx.altitude_m = altitude;
        self.fsm.tick(&mut self.ctx);
        let next = self.fsm.current_state();
        if next != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to: next });
        }
        self.apply_hv(sink);
        self.shared.counter.mark_hv(self.shared.hv_on());

        let record = SecondRecord {
            elapsed_secs: closed_second,
            counts: hv_during.then_some(sample.counts),
            barometer: reading.as_ref().map(BarometerFields::from),
            altitude_m: altitude,
            dead_time_s: sample.dead_time_secs(),
            dead_counts: sample.dead_counts,
            hv_on: hv_during,
            dose_rate_usv_h: dose_rate,
        };
        sink.emit(&AppEvent::Record(record.clone()));

        self.drain_anomalies(sink);
        record
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::ForceState(StateId::PostActive) if !self.ctx.post_pending() => {
                warn!("POST already run or cancelled, ignoring forced POST");
            }
            AppCommand::ForceState(target) => {
                let prev = self.fsm.current_state();
                self.fsm.force_transition(target, &mut self.ctx);
                if target != prev {
                    sink.emit(&AppEvent::StateChanged { from: prev, to: target });
                }
                self.apply_hv(sink);
            }
            AppCommand::RecomputeQff => {
                let station = self.ctx.config.station;
                match self.set_qff(&station) {
                    Ok(qff) => sink.emit(&AppEvent::QffSet(qff)),
                    Err(e) => {
                        warn!("QFF recompute failed, keeping {:.2} mbar: {e}", self.qff);
                        if let Error::Sensor(se) = e {
                            sink.emit(&AppEvent::SensorFault(se));
                        }
                    }
                }
            }
            AppCommand::Shutdown => {
                info!("shutdown requested");
                self.shared.stop();
            }
        }
    }

    /// Switch HV off regardless of state.  Used on the way out.
    pub fn shutdown(&mut self, sink: &mut impl EventSink) {
        self.ctx.hv_command = false;
        self.apply_hv(sink);
        self.drain_anomalies(sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn hv_on(&self) -> bool {
        self.shared.hv_on()
    }

    pub fn second_index(&self) -> usize {
        self.shared.second_index()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.ctx.config
    }

    pub fn barometer_mut(&mut self) -> &mut B {
        &mut self.barometer
    }

    // ── Internal ──────────────────────────────────────────────

    fn read_compensated(&mut self) -> Result<Reading, Error> {
        let raw = self.barometer.read_raw()?;
        Ok(compensation::compensate(self.barometer.calibration(), raw))
    }

    fn apply_hv(&mut self, sink: &mut impl EventSink) {
        match self.shared.hv.set(self.ctx.hv_command) {
            Ok(true) => {
                if !self.ctx.hv_command {
                    self.shared.counter.mark_hv(false);
                }
                sink.emit(&AppEvent::HvSwitched(self.ctx.hv_command));
            }
            Ok(false) => {}
            // Retried on the next cycle; the switch kept its old state.
            Err(e) => warn!("HV switch failed: {e}"),
        }
    }

    fn drain_anomalies(&mut self, sink: &mut impl EventSink) {
        self.shared.anomalies.drain(|a| {
            warn!("pulse anomaly: {a}");
            sink.emit(&AppEvent::Anomaly(a));
        });
        let dropped = self.shared.anomalies.take_dropped();
        if dropped > 0 {
            sink.emit(&AppEvent::AnomaliesDropped(dropped));
        }
    }
}
