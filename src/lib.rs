//! STAR radiation monitor core.
//!
//! Geiger pulse counting with dead-time measurement, MS5607 barometric
//! compensation, and altitude-gated control of the tube's HV supply.
//! Hardware is reached only through the port traits in [`app::ports`],
//! so everything here runs on the host against simulated adapters.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod counter;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
pub mod runtime;
pub mod sensors;
pub mod shared;
pub mod units;

pub use error::{Error, Result};
