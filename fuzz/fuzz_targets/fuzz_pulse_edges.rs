//! Fuzz target: pulse timer + count ring
//!
//! Interprets the input as a stream of (timestamp delta, roll) records and
//! drives `PulseCounter` with it, verifying:
//! - No panics, including on non-monotonic and zero timestamps
//! - The timer never reaches the invalid `(t1, t2)` phase
//! - Counted and dead-time outcomes all land in some closed second
//!
//! cargo fuzz run fuzz_pulse_edges

#![no_main]

use libfuzzer_sys::fuzz_target;
use star::counter::{EdgeOutcome, PulseCounter, TimerPhase};

fuzz_target!(|data: &[u8]| {
    let counter = PulseCounter::new(3_600, 650_000);
    let mut now: u64 = 0;
    let mut second: u64 = 0;
    let (mut counted, mut dead) = (0u64, 0u64);
    let (mut seen_counts, mut seen_dead) = (0u64, 0u64);

    for chunk in data.chunks_exact(4) {
        let delta = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if delta == i32::MIN {
            // Roll to the next second.
            second += 1;
            let (_, closed) = counter.roll(second);
            seen_counts += u64::from(closed.counts);
            seen_dead += u64::from(closed.dead_counts);
            continue;
        }
        now = now.saturating_add_signed(i64::from(delta));
        match counter.on_edge(now) {
            EdgeOutcome::Counted => counted += 1,
            EdgeOutcome::DeadTime { .. } => dead += 1,
            _ => {}
        }
        assert_ne!(counter.timer_phase(), TimerPhase::Invalid);
    }

    let (_, last) = counter.roll(second + 1);
    seen_counts += u64::from(last.counts);
    seen_dead += u64::from(last.dead_counts);
    assert_eq!(seen_counts, counted);
    assert_eq!(seen_dead, dead);
});
