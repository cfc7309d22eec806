//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (barometer, GPIO, clock, event sinks, storage) implement
//! these traits.  The [`MonitorService`](super::service::MonitorService)
//! and [`Monitor`](crate::runtime::Monitor) consume them, so the domain
//! core never touches hardware directly.
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed.

use crate::config::MonitorConfig;
use crate::error::{GpioError, SensorError};
use crate::sensors::{Calibration, RawSample};

// ───────────────────────────────────────────────────────────────
// Barometer port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// A calibrated barometric sensor that yields raw ADC pairs.
pub trait BarometerPort {
    /// Convert and read one raw `(D1, D2)` pair.
    fn read_raw(&mut self) -> Result<RawSample, SensorError>;

    /// Calibration read at setup.
    fn calibration(&self) -> &Calibration;
}

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ pins)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrigger {
    Rising,
    Falling,
    Both,
}

/// Interrupt-context callback.  Receives a monotonic timestamp in ns.
///
/// Must not block, allocate or log.
pub type EdgeCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Output lines and edge interrupts.
///
/// Shared between the 1 Hz loop, the indicator thread and the edge path,
/// so implementations take `&self` and synchronise internally.
pub trait GpioPort: Send + Sync {
    /// Configure `pin` as a push-pull output.
    fn configure_output(&self, pin: u8) -> Result<(), GpioError>;

    fn set_level(&self, pin: u8, level: Level) -> Result<(), GpioError>;

    /// Attach `callback` to edges on `pin`.  One callback per pin.
    fn register_edge_callback(
        &self,
        pin: u8,
        trigger: EdgeTrigger,
        callback: EdgeCallback,
    ) -> Result<(), GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: monotonic time)
// ───────────────────────────────────────────────────────────────

pub trait ClockPort: Send + Sync {
    /// Monotonic timestamp in ns, same timebase as edge callbacks.
    fn now_ns(&self) -> u64;

    /// Whole seconds since the clock was started.
    fn elapsed_secs(&self) -> u64;

    /// Block until the next whole-second boundary.
    fn sleep_until_next_second(&self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (console, file,
/// downlink).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists monitor configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<MonitorConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &MonitorConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::IoError => Self::Config("config I/O error"),
        }
    }
}
