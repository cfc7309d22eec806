//! Actuator drivers and thread helpers.

pub mod hv;
pub mod indicator;
pub mod threads;
