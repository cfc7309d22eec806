//! Interrupt-safe anomaly reporting.
//!
//! The edge callback must not log.  When the pulse timer reports a clock
//! anomaly or an impossible state the callback pushes an [`Anomaly`] here
//! and the 1 Hz loop drains and logs it.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Edge        │────▶│ AnomalyQueue │────▶│ 1 Hz driver  │──▶ log / sink
//! │ callback    │     │ (lock-free)  │     │ (consumer)   │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::Q32;

use crate::counter::EdgeOutcome;

/// Pulse-path anomalies, reported out of interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// An edge timestamp was at or before the armed edge.
    ClockAnomaly { t1_ns: u64, now_ns: u64 },
    /// The pulse timer held an inconsistent `(t1, t2)`.
    ImpossibleTimerState { t1_ns: u64, t2_ns: u64 },
}

impl Anomaly {
    /// Map a pulse-timer outcome to an anomaly, if it is one.
    pub fn from_outcome(outcome: EdgeOutcome) -> Option<Self> {
        match outcome {
            EdgeOutcome::ClockAnomaly { t1_ns, now_ns } => Some(Self::ClockAnomaly { t1_ns, now_ns }),
            EdgeOutcome::ImpossibleState { t1_ns, t2_ns } => {
                Some(Self::ImpossibleTimerState { t1_ns, t2_ns })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockAnomaly { t1_ns, now_ns } => {
                write!(f, "non-monotonic edge: now={now_ns}ns <= t1={t1_ns}ns")
            }
            Self::ImpossibleTimerState { t1_ns, t2_ns } => {
                write!(f, "impossible timer state: t1={t1_ns}ns t2={t2_ns}ns")
            }
        }
    }
}

/// Bounded multi-producer queue plus a count of reports that did not fit.
pub struct AnomalyQueue {
    queue: Q32<Anomaly>,
    dropped: AtomicU32,
}

impl Default for AnomalyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyQueue {
    pub const fn new() -> Self {
        Self {
            queue: Q32::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue without blocking.  Returns `false` if the queue was full.
    pub fn push(&self, anomaly: Anomaly) -> bool {
        if self.queue.enqueue(anomaly).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn pop(&self) -> Option<Anomaly> {
        self.queue.dequeue()
    }

    /// Hand every pending anomaly to `handler` in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Anomaly)) {
        while let Some(a) = self.pop() {
            handler(a);
        }
    }

    /// Reports lost to a full queue since the last call.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}
