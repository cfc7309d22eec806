//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem against
//! simulated adapters.  All tests run on the host with no real hardware.

mod mock_hw;
mod runtime_tests;
mod sensor_pipeline_tests;
mod service_tests;
