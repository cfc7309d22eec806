//! Unified error types for the monitor core.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! setup path's error handling uniform.  All variants are `Copy` so they can
//! be passed through the FSM, the service and the event sink without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Startup could not complete; the control loop must not run.
    Setup(SetupError),
    /// The barometric sensor could not be read.
    Sensor(SensorError),
    /// Compensated values fell outside the formula's domain.
    Compensation(CompensationError),
    /// A GPIO line could not be configured or driven.
    Gpio(GpioError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(e) => write!(f, "setup: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Compensation(e) => write!(f, "compensation: {e}"),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`SensorTransport`](crate::sensors::SensorTransport).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The bus transaction failed.
    Bus,
    /// A calibration word outside `0..8` was requested.
    InvalidAddress(u8),
    /// A converted word was read before any conversion was started.
    NoConversion,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "bus transaction failed"),
            Self::InvalidAddress(i) => write!(f, "invalid PROM address {i}"),
            Self::NoConversion => write!(f, "no conversion pending"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Setup errors (fatal)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// The sensor transport could not be opened or reset.
    Transport(TransportError),
    /// PROM checksum does not match the recomputed CRC-4.
    CalibrationCrc { stored: u8, computed: u8 },
    /// An output or edge-interrupt line could not be configured.
    Gpio(GpioError),
    /// A worker thread could not be spawned.
    Thread,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::CalibrationCrc { stored, computed } => write!(
                f,
                "calibration CRC mismatch (stored 0x{stored:X}, computed 0x{computed:X})"
            ),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Thread => write!(f, "thread spawn failed"),
        }
    }
}

impl std::error::Error for SetupError {}

impl From<SetupError> for Error {
    fn from(e: SetupError) -> Self {
        Self::Setup(e)
    }
}

impl From<TransportError> for SetupError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<GpioError> for SetupError {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors (recoverable, per second)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The transport failed while converting or reading.
    Transport(TransportError),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<TransportError> for SensorError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Compensation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationError {
    /// Pressure was zero or negative; `ln(QFF / P)` is undefined.
    NonPositivePressure,
    /// The reference sea-level pressure was zero or negative.
    NonPositiveQff,
    /// The result was NaN or infinite.
    NonFinite,
}

impl fmt::Display for CompensationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositivePressure => write!(f, "pressure must be positive"),
            Self::NonPositiveQff => write!(f, "QFF must be positive"),
            Self::NonFinite => write!(f, "non-finite result"),
        }
    }
}

impl std::error::Error for CompensationError {}

impl From<CompensationError> for Error {
    fn from(e: CompensationError) -> Self {
        Self::Compensation(e)
    }
}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The pin number is not available on this board.
    InvalidPin(u8),
    /// Direction or edge configuration failed.
    ConfigureFailed(u8),
    /// Level write failed.
    WriteFailed(u8),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(p) => write!(f, "invalid pin {p}"),
            Self::ConfigureFailed(p) => write!(f, "configure pin {p} failed"),
            Self::WriteFailed(p) => write!(f, "write pin {p} failed"),
        }
    }
}

impl std::error::Error for GpioError {}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
