//! Shared mutable context threaded through every FSM handler.
//!
//! `ControlContext` is the blackboard the HV state handlers read from and
//! write to: the latest altitude, the HV command output, timing, and the
//! configuration the thresholds come from.

use crate::config::MonitorConfig;

#[derive(Debug, Clone)]
pub struct ControlContext {
    // --- Inputs (written by the service before each tick) ---
    /// Altitude derived this second, `None` if no valid sample.
    pub altitude_m: Option<f64>,

    // --- Outputs (written by state handlers) ---
    /// Desired HV supply state.  Applied to the switch after the tick.
    pub hv_command: bool,

    // --- Timing ---
    /// Ticks since entering the current state.
    pub ticks_in_state: u64,
    /// Total ticks since the FSM started.
    pub total_ticks: u64,
    /// Nominal tick period (s).
    pub tick_period_secs: f64,

    // --- Latches ---
    /// Set once the power-on self-test has run or a climb above the on
    /// threshold has cancelled it.  Never cleared.
    pub post_done: bool,

    pub config: MonitorConfig,
}

impl ControlContext {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            altitude_m: None,
            hv_command: false,
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_secs: 1.0,
            post_done: false,
            config,
        }
    }

    /// A ground self-test is configured and has not yet run or been cancelled.
    pub fn post_pending(&self) -> bool {
        !self.post_done && self.config.post_duration_secs > 0
    }

    /// Seconds spent in the current state.
    pub fn secs_in_state(&self) -> f64 {
        self.ticks_in_state as f64 * self.tick_period_secs
    }

    /// Valid altitude strictly above the switch-on threshold.
    pub fn above_on_threshold(&self) -> bool {
        self.altitude_m.is_some_and(|a| a > self.config.geiger_alt_m)
    }

    /// Valid altitude strictly below the switch-off threshold.
    pub fn below_off_threshold(&self) -> bool {
        self.altitude_m
            .is_some_and(|a| a < self.config.hv_off_altitude_m())
    }
}
