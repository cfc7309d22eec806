//! Two-phase pulse timer for Geiger tube dead-time measurement.
//!
//! Every edge of the tube's pulse line calls [`PulseTimer::on_edge`] with a
//! monotonic timestamp.  The falling edge counts the pulse and arms the
//! timer; the matching rising edge closes the dead-time interval.
//!
//! ```text
//!            ┌───── counted ─────┐
//!            ▼                   │
//!   IDLE (t1 = 0) ──edge──▶ ARMED (t1 = t2 ≠ 0)
//!        ▲                   │  │
//!        └─ 0 < dt ≤ max ────┘  └─ dt > max: t1 = t2 = now (stay armed)
//! ```
//!
//! The timer is plain data.  Callers hold the counting lock around
//! `on_edge` together with the ring update so the pair is one atomic step.

/// Decoded `(t1, t2)` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Waiting for a falling edge.
    Idle,
    /// Falling edge seen at `t1`; waiting for the rising edge.
    Armed,
    /// `t1 != 0` and `t1 != t2`.  Never produced by `on_edge`.
    Invalid,
}

/// What a single edge did to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Falling edge: one pulse counted, timer armed.
    Counted,
    /// Rising edge closed a valid dead-time interval.
    DeadTime { dt_ns: u64 },
    /// Interval longer than the ceiling; timer re-armed at this edge.
    Resync { dt_ns: u64 },
    /// Timestamp at or before the armed edge.  State untouched.
    ClockAnomaly { t1_ns: u64, now_ns: u64 },
    /// `(t1, t2)` was inconsistent.  State untouched.
    ImpossibleState { t1_ns: u64, t2_ns: u64 },
}

impl EdgeOutcome {
    /// True for outcomes that must be reported out of the interrupt path.
    pub fn is_anomaly(self) -> bool {
        matches!(self, Self::ClockAnomaly { .. } | Self::ImpossibleState { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PulseTimer {
    t1: u64,
    t2: u64,
}

impl PulseTimer {
    pub const fn new() -> Self {
        Self { t1: 0, t2: 0 }
    }

    /// Restore a timer from raw timestamps (diagnostics and tests).
    pub const fn from_timestamps(t1: u64, t2: u64) -> Self {
        Self { t1, t2 }
    }

    pub fn timestamps(&self) -> (u64, u64) {
        (self.t1, self.t2)
    }

    pub fn phase(&self) -> TimerPhase {
        if self.t1 == 0 {
            TimerPhase::Idle
        } else if self.t1 == self.t2 {
            TimerPhase::Armed
        } else {
            TimerPhase::Invalid
        }
    }

    /// Advance the timer by one edge at `now_ns`.
    pub fn on_edge(&mut self, now_ns: u64, dead_max_ns: u64) -> EdgeOutcome {
        match self.phase() {
            TimerPhase::Idle => {
                // t1 = 0 means idle, so a zero timestamp is stored as 1 ns.
                let stamp = now_ns.max(1);
                self.t1 = stamp;
                self.t2 = stamp;
                EdgeOutcome::Counted
            }
            TimerPhase::Armed => {
                if now_ns <= self.t1 {
                    return EdgeOutcome::ClockAnomaly {
                        t1_ns: self.t1,
                        now_ns,
                    };
                }
                let dt_ns = now_ns - self.t1;
                if dt_ns <= dead_max_ns {
                    self.t1 = 0;
                    self.t2 = 0;
                    EdgeOutcome::DeadTime { dt_ns }
                } else {
                    self.t1 = now_ns;
                    self.t2 = now_ns;
                    EdgeOutcome::Resync { dt_ns }
                }
            }
            TimerPhase::Invalid => EdgeOutcome::ImpossibleState {
                t1_ns: self.t1,
                t2_ns: self.t2,
            },
        }
    }
}
