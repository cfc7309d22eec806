//! Geiger pulse counting: dead-time timer plus per-second ring.
//!
//! The timer and the ring share one lock.  An edge's timer transition and
//! its count/dead-time update happen in the same critical section, and the
//! 1 Hz roll takes the same lock, so a pulse can never land in a slot while
//! it is being zeroed.
//!
//! Nothing under the lock allocates, logs or sleeps.

pub mod pulse;
pub mod ring;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use pulse::{EdgeOutcome, PulseTimer, TimerPhase};
pub use ring::{cps_to_dose_rate, CountRing, SecondSample};

/// Everything guarded by the counting lock.
#[derive(Debug)]
pub struct CounterState {
    pub ring: CountRing,
    pub timer: PulseTimer,
}

pub struct PulseCounter {
    state: Mutex<CounterState>,
    dead_max_ns: u64,
}

impl PulseCounter {
    pub fn new(ring_len: usize, dead_max_ns: u64) -> Self {
        Self {
            state: Mutex::new(CounterState {
                ring: CountRing::new(ring_len),
                timer: PulseTimer::new(),
            }),
            dead_max_ns,
        }
    }

    // A panic elsewhere must not take the edge path down with it.
    fn lock(&self) -> MutexGuard<'_, CounterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Edge-callback body: advance the timer and account the result in the
    /// current second.
    pub fn on_edge(&self, now_ns: u64) -> EdgeOutcome {
        let mut state = self.lock();
        let outcome = state.timer.on_edge(now_ns, self.dead_max_ns);
        match outcome {
            EdgeOutcome::Counted => {
                let slot = state.ring.current_mut();
                slot.counts = slot.counts.saturating_add(1);
            }
            EdgeOutcome::DeadTime { dt_ns } => {
                let slot = state.ring.current_mut();
                slot.dead_counts = slot.dead_counts.saturating_add(1);
                slot.dead_time_ns = slot.dead_time_ns.saturating_add(dt_ns);
            }
            EdgeOutcome::Resync { .. }
            | EdgeOutcome::ClockAnomaly { .. }
            | EdgeOutcome::ImpossibleState { .. } => {}
        }
        outcome
    }

    /// Close the current second and return its final sample, then make
    /// `elapsed` current.  Both happen under one lock acquisition.
    pub fn roll(&self, elapsed: u64) -> (u64, SecondSample) {
        let mut state = self.lock();
        let closed = (state.ring.current_second(), *state.ring.current());
        state.ring.set_current_second(elapsed);
        closed
    }

    /// Sample of the second in progress.
    pub fn current(&self) -> SecondSample {
        *self.lock().ring.current()
    }

    pub fn current_second(&self) -> u64 {
        self.lock().ring.current_second()
    }

    /// Slot index of the second in progress.
    pub fn second_index(&self) -> usize {
        self.lock().ring.current_index()
    }

    pub fn timer_phase(&self) -> TimerPhase {
        self.lock().timer.phase()
    }

    /// Mean counts per second over the trailing window.
    pub fn average_counts(&self, window: usize) -> f64 {
        self.lock().ring.average_counts(window)
    }

    /// Mean counts per second over completed seconds that had HV on.
    pub fn average_completed(&self, window: usize) -> Option<f64> {
        self.lock().ring.average_completed(window)
    }

    /// Record whether HV is on for the second in progress.
    pub fn mark_hv(&self, on: bool) {
        self.lock().ring.current_mut().hv_on = on;
    }

    /// Run `f` against the ring under the counting lock.  `f` must be short.
    pub fn with_ring<R>(&self, f: impl FnOnce(&CountRing) -> R) -> R {
        f(&self.lock().ring)
    }

    pub fn dead_max_ns(&self) -> u64 {
        self.dead_max_ns
    }
}
