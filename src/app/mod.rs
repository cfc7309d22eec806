//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the monitor's per-second cycle: rolling the pulse
//! counter, compensating the barometer, driving the HV state machine and
//! emitting records. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
