//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌────────────────────┬──────────┬─────────┬─────────────────┐ │
//! │  │ StateId            │ on_enter │ on_exit │ on_update       │ │
//! │  ├────────────────────┼──────────┼─────────┼─────────────────┤ │
//! │  │ AwaitingAltitude   │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option │ │
//! │  │ PostActive         │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option │ │
//! │  │ HvOffBelowThreshold│ fn(ctx)  │    -    │ fn(ctx)->Option │ │
//! │  │ HvOnAboveThreshold │ fn(ctx)  │    -    │ fn(ctx)->Option │ │
//! │  └────────────────────┴──────────┴─────────┴─────────────────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each 1 Hz tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the current
//! pointer.  Handlers only write the HV command into [`ControlContext`];
//! the service applies it to the switch after the tick.

pub mod context;
pub mod states;

use context::ControlContext;
use log::info;
use serde::Serialize;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all control states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum StateId {
    AwaitingAltitude = 0,
    PostActive = 1,
    HvOffBelowThreshold = 2,
    HvOnAboveThreshold = 3,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Out-of-range indices assert in
    /// debug builds and fall back to the HV-off state in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::AwaitingAltitude,
            1 => Self::PostActive,
            2 => Self::HvOffBelowThreshold,
            3 => Self::HvOnAboveThreshold,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::HvOffBelowThreshold
            }
        }
    }

    /// Whether this state commands the high-voltage supply on.
    pub fn hv_commanded(self) -> bool {
        matches!(self, Self::PostActive | Self::HvOnAboveThreshold)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut ControlContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut ControlContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ControlContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    pub fn tick(&mut self, ctx: &mut ControlContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (operator command or shutdown).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut ControlContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut ControlContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::ControlContext;
    use super::*;
    use crate::config::MonitorConfig;

    fn config(post_secs: u32) -> MonitorConfig {
        MonitorConfig {
            geiger_alt_m: 100.0,
            dead_band_m: 10.0,
            post_duration_secs: post_secs,
            ..MonitorConfig::default()
        }
    }

    fn make(post_secs: u32) -> (Fsm, ControlContext) {
        let mut fsm = Fsm::new(states::build_state_table(), StateId::AwaitingAltitude);
        let mut ctx = ControlContext::new(config(post_secs));
        fsm.start(&mut ctx);
        (fsm, ctx)
    }

    fn feed(fsm: &mut Fsm, ctx: &mut ControlContext, altitude: Option<f64>) -> bool {
        ctx.altitude_m = altitude;
        fsm.tick(ctx);
        ctx.hv_command
    }

    #[test]
    fn starts_awaiting_with_hv_off() {
        let (fsm, ctx) = make(10);
        assert_eq!(fsm.current_state(), StateId::AwaitingAltitude);
        assert!(!ctx.hv_command);
    }

    #[test]
    fn waits_for_first_valid_altitude() {
        let (mut fsm, mut ctx) = make(10);
        for _ in 0..5 {
            assert!(!feed(&mut fsm, &mut ctx, None));
        }
        assert_eq!(fsm.current_state(), StateId::AwaitingAltitude);
    }

    #[test]
    fn threshold_scenario_without_post() {
        let (mut fsm, mut ctx) = make(0);
        let hv: Vec<bool> = [50.0, 80.0, 105.0, 95.0, 91.0]
            .iter()
            .map(|a| feed(&mut fsm, &mut ctx, Some(*a)))
            .collect();
        assert_eq!(hv, vec![false, false, true, true, true]);
        // 88 m is below 100 - 10.
        assert!(!feed(&mut fsm, &mut ctx, Some(88.0)));
        assert_eq!(fsm.current_state(), StateId::HvOffBelowThreshold);
    }

    #[test]
    fn post_runs_once_on_ground_start() {
        let (mut fsm, mut ctx) = make(3);
        assert!(feed(&mut fsm, &mut ctx, Some(10.0)));
        assert_eq!(fsm.current_state(), StateId::PostActive);
        assert!(feed(&mut fsm, &mut ctx, Some(10.0)));
        assert!(feed(&mut fsm, &mut ctx, Some(10.0)));
        // Third second in POST completes it.
        assert!(!feed(&mut fsm, &mut ctx, Some(10.0)));
        assert_eq!(fsm.current_state(), StateId::HvOffBelowThreshold);
        assert!(ctx.post_done);
        for _ in 0..10 {
            assert!(!feed(&mut fsm, &mut ctx, Some(10.0)));
        }
    }

    #[test]
    fn ascent_above_threshold_cancels_post() {
        let (mut fsm, mut ctx) = make(30);
        feed(&mut fsm, &mut ctx, Some(10.0));
        assert_eq!(fsm.current_state(), StateId::PostActive);
        assert!(feed(&mut fsm, &mut ctx, Some(150.0)));
        assert_eq!(fsm.current_state(), StateId::HvOnAboveThreshold);
        // Descending never restarts POST.
        assert!(!feed(&mut fsm, &mut ctx, Some(10.0)));
        assert_eq!(fsm.current_state(), StateId::HvOffBelowThreshold);
    }

    #[test]
    fn start_inside_band_defers_post_until_below() {
        let (mut fsm, mut ctx) = make(2);
        assert!(!feed(&mut fsm, &mut ctx, Some(95.0)));
        assert_eq!(fsm.current_state(), StateId::HvOffBelowThreshold);
        assert!(ctx.post_pending());
        assert!(feed(&mut fsm, &mut ctx, Some(20.0)));
        assert_eq!(fsm.current_state(), StateId::PostActive);
        assert!(feed(&mut fsm, &mut ctx, Some(20.0)));
        assert!(!feed(&mut fsm, &mut ctx, Some(20.0)));
        assert_eq!(fsm.current_state(), StateId::HvOffBelowThreshold);
        assert!(!ctx.post_pending());
        for _ in 0..5 {
            assert!(!feed(&mut fsm, &mut ctx, Some(20.0)));
        }
    }

    #[test]
    fn climb_from_dead_band_cancels_post() {
        let (mut fsm, mut ctx) = make(10);
        feed(&mut fsm, &mut ctx, Some(95.0));
        assert!(feed(&mut fsm, &mut ctx, Some(150.0)));
        assert!(ctx.post_done);
        assert!(!feed(&mut fsm, &mut ctx, Some(20.0)));
        assert!(!feed(&mut fsm, &mut ctx, Some(20.0)));
        assert_eq!(fsm.current_state(), StateId::HvOffBelowThreshold);
    }

    #[test]
    fn disabled_post_never_runs() {
        let (mut fsm, mut ctx) = make(0);
        feed(&mut fsm, &mut ctx, Some(95.0));
        for _ in 0..5 {
            assert!(!feed(&mut fsm, &mut ctx, Some(20.0)));
        }
        assert_eq!(fsm.current_state(), StateId::HvOffBelowThreshold);
    }

    #[test]
    fn start_above_threshold_goes_straight_on() {
        let (mut fsm, mut ctx) = make(10);
        assert!(feed(&mut fsm, &mut ctx, Some(500.0)));
        assert_eq!(fsm.current_state(), StateId::HvOnAboveThreshold);
    }

    #[test]
    fn invalid_altitude_holds_state() {
        let (mut fsm, mut ctx) = make(0);
        feed(&mut fsm, &mut ctx, Some(150.0));
        assert!(feed(&mut fsm, &mut ctx, None));
        assert_eq!(fsm.current_state(), StateId::HvOnAboveThreshold);
    }

    #[test]
    fn exactly_at_threshold_does_not_switch() {
        let (mut fsm, mut ctx) = make(0);
        assert!(!feed(&mut fsm, &mut ctx, Some(100.0)));
        assert!(feed(&mut fsm, &mut ctx, Some(100.1)));
        assert!(feed(&mut fsm, &mut ctx, Some(90.0)));
        assert!(!feed(&mut fsm, &mut ctx, Some(89.9)));
    }

    #[test]
    fn force_transition_runs_enter() {
        let (mut fsm, mut ctx) = make(0);
        fsm.force_transition(StateId::HvOnAboveThreshold, &mut ctx);
        assert!(ctx.hv_command);
        fsm.force_transition(StateId::HvOffBelowThreshold, &mut ctx);
        assert!(!ctx.hv_command);
    }

    #[test]
    fn state_id_from_index_roundtrip() {
        for i in 0..StateId::COUNT {
            assert_eq!(StateId::from_index(i) as usize, i);
        }
    }

    #[test]
    fn hv_command_matches_state() {
        let (mut fsm, mut ctx) = make(5);
        for a in [10.0, 10.0, 200.0, 95.0, 80.0, 120.0] {
            feed(&mut fsm, &mut ctx, Some(a));
            assert_eq!(ctx.hv_command, fsm.current_state().hv_commanded());
        }
    }
}
