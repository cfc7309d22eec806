//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements   | Connects to                 |
//! |---------------|--------------|-----------------------------|
//! | `config_file` | ConfigPort   | JSON document on disk       |
//! | `log_sink`    | EventSink    | `log` facade / in-memory    |
//! | `sim_gpio`    | GpioPort     | In-memory pins + edge fan-in|
//! | `time`        | ClockPort    | `std::time::Instant`        |
//! |               | DelayNs      | `std::thread::sleep`        |

pub mod config_file;
pub mod log_sink;
pub mod sim_gpio;
pub mod time;
