//! Per-second count history.
//!
//! A fixed ring of one-second slots addressed by `elapsed_seconds mod N`.
//! Each slot carries the elapsed second it was last zeroed for, so a slot
//! left over from an earlier lap reads as "not visited" rather than as a
//! quiet second.  Windowed sums only include slots whose stamp matches
//! the second they are expected to hold.

/// Accumulators for one second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SecondSample {
    /// Falling edges counted.
    pub counts: u32,
    /// Total measured dead time (ns).
    pub dead_time_ns: u64,
    /// Number of dead-time intervals measured.
    pub dead_counts: u32,
    /// HV was on from the start of this second and never switched off.
    pub hv_on: bool,
}

impl SecondSample {
    pub fn dead_time_secs(&self) -> f64 {
        self.dead_time_ns as f64 * 1e-9
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    sample: SecondSample,
    /// Elapsed second this slot was last rolled to.
    second: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CountRing {
    slots: Box<[Slot]>,
    current_second: u64,
}

impl CountRing {
    /// A ring of `len` slots (at least one) positioned at second 0.
    pub fn new(len: usize) -> Self {
        let mut slots = vec![Slot::default(); len.max(1)].into_boxed_slice();
        slots[0].second = Some(0);
        Self {
            slots,
            current_second: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Normalise any signed slot offset into `[0, len)`.
    pub fn index_of(&self, k: i64) -> usize {
        k.rem_euclid(self.slots.len() as i64) as usize
    }

    pub fn current_second(&self) -> u64 {
        self.current_second
    }

    pub fn current_index(&self) -> usize {
        self.slot_for(self.current_second)
    }

    fn slot_for(&self, second: u64) -> usize {
        (second % self.slots.len() as u64) as usize
    }

    /// Make `elapsed` the current second, zeroing its slot first.
    ///
    /// Returns `false` (and touches nothing) if `elapsed` is already
    /// current.
    pub fn set_current_second(&mut self, elapsed: u64) -> bool {
        if elapsed == self.current_second {
            return false;
        }
        let idx = self.slot_for(elapsed);
        self.slots[idx] = Slot {
            sample: SecondSample::default(),
            second: Some(elapsed),
        };
        self.current_second = elapsed;
        true
    }

    pub fn current(&self) -> &SecondSample {
        &self.slots[self.current_index()].sample
    }

    pub fn current_mut(&mut self) -> &mut SecondSample {
        let idx = self.current_index();
        &mut self.slots[idx].sample
    }

    /// Sample recorded `seconds_ago` seconds before the current one, if
    /// that second was visited and its slot has not been reused since.
    pub fn sample_at(&self, seconds_ago: u64) -> Option<SecondSample> {
        let second = self.current_second.checked_sub(seconds_ago)?;
        let slot = &self.slots[self.slot_for(second)];
        (slot.second == Some(second)).then_some(slot.sample)
    }

    /// Window length actually used: at most one full lap.
    pub fn clamp_window(&self, window: usize) -> usize {
        window.min(self.slots.len())
    }

    fn window(&self, window: usize) -> impl Iterator<Item = SecondSample> + '_ {
        (0..self.clamp_window(window) as u64).filter_map(|i| self.sample_at(i))
    }

    /// Counts over the trailing `window` seconds, current second included.
    pub fn sum_counts(&self, window: usize) -> u64 {
        self.window(window).map(|s| u64::from(s.counts)).sum()
    }

    /// Dead time (ns) over the trailing `window` seconds.
    pub fn sum_dead_time_ns(&self, window: usize) -> u64 {
        self.window(window).map(|s| s.dead_time_ns).sum()
    }

    /// Seconds in the trailing window that hold live data.
    pub fn coverage(&self, window: usize) -> usize {
        self.window(window).count()
    }

    /// Mean counts per second over the trailing window, divided by the
    /// seconds actually covered.  Zero when nothing is covered.
    pub fn average_counts(&self, window: usize) -> f64 {
        let covered = self.coverage(window);
        if covered == 0 {
            return 0.0;
        }
        self.sum_counts(window) as f64 / covered as f64
    }

    /// Mean count rate over the completed seconds in the `window` before the
    /// current one that were visited with HV on.  At most `len - 1` seconds
    /// are available.  `None` when no such second exists.
    pub fn average_completed(&self, window: usize) -> Option<f64> {
        let w = window.min(self.slots.len() - 1) as u64;
        let (covered, sum) = (1..=w)
            .filter_map(|i| self.sample_at(i))
            .filter(|s| s.hv_on)
            .fold((0u64, 0u64), |(n, sum), s| (n + 1, sum + u64::from(s.counts)));
        (covered > 0).then(|| sum as f64 / covered as f64)
    }
}

/// Dose rate (µSv/h) from a mean count rate (counts/s).
pub fn cps_to_dose_rate(counts_per_sec: f64, tube_conversion_factor: f64) -> f64 {
    counts_per_sec * 60.0 * tube_conversion_factor
}
