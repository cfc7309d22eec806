//! State shared between the edge callback, the 1 Hz loop and the
//! indicator thread.
//!
//! ```text
//!   edge callback ──▶ counter ─┐
//!         │                    ├──▶ 1 Hz loop ──▶ HV switch
//!         ├──▶ indicator       │
//!         └──▶ anomaly queue ──┘
//! ```
//!
//! Each member synchronises itself; `SharedState` only groups them behind
//! one `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app::ports::GpioPort;
use crate::config::MonitorConfig;
use crate::counter::{EdgeOutcome, PulseCounter};
use crate::drivers::hv::HvSwitch;
use crate::drivers::indicator::Indicator;
use crate::error::GpioError;
use crate::events::{Anomaly, AnomalyQueue};
use crate::pins;

pub struct SharedState {
    pub counter: PulseCounter,
    pub hv: HvSwitch,
    pub indicator: Indicator,
    pub anomalies: AnomalyQueue,
    running: AtomicBool,
}

impl SharedState {
    /// Build the shared state and claim the HV gate and LED outputs.
    pub fn new(config: &MonitorConfig, gpio: Arc<dyn GpioPort>) -> Result<Self, GpioError> {
        gpio.configure_output(pins::LED_PIN)?;
        let hv = HvSwitch::new(gpio, pins::HV_GATE_PIN)?;
        Ok(Self {
            counter: PulseCounter::new(config.ring_len_secs, config.dead_time_max_ns()),
            hv,
            indicator: Indicator::new(config.indicator_flash_ms, config.indicator_max_owed_ms),
            anomalies: AnomalyQueue::new(),
            running: AtomicBool::new(true),
        })
    }

    pub fn hv_on(&self) -> bool {
        self.hv.is_on()
    }

    /// Ring slot of the second in progress.
    pub fn second_index(&self) -> usize {
        self.counter.second_index()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the 1 Hz loop to exit after its current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Edge-callback body.  Counts, arms the indicator and queues anomalies.
/// Never blocks beyond the counting lock and never logs.
pub fn handle_edge(shared: &SharedState, now_ns: u64) -> EdgeOutcome {
    let outcome = shared.counter.on_edge(now_ns);
    if outcome == EdgeOutcome::Counted {
        shared.indicator.request_flash();
    } else if let Some(anomaly) = Anomaly::from_outcome(outcome) {
        shared.anomalies.push(anomaly);
    }
    outcome
}
