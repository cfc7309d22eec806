//! Inbound commands to the application service.
//!
//! Actions requested by the outside world (ground console, test harness)
//! that the [`MonitorService`](super::service::MonitorService) interprets.

use crate::fsm::StateId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Force the FSM into a specific state (ground testing only).
    ForceState(StateId),

    /// Re-derive QFF from a fresh sample, e.g. after moving the station.
    RecomputeQff,

    /// Stop the 1 Hz loop.  HV is switched off on the way out.
    Shutdown,
}
