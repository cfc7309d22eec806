//! Concrete state handler functions and table builder.
//!
//! Each state is three plain `fn` pointers.  No closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!                       ┌──[a > on]──────────────────────────┐
//!                       │                                    ▼
//!  AWAITING ──[a < off, POST enabled]──▶ POST ──[a > on]──▶ HV_ON
//!     │                                   │                  │  ▲
//!     │                          [POST elapsed]     [a < off]   [a > on]
//!     │                                   ▼                  ▼  │
//!     └──────[otherwise]─────────────▶ HV_OFF ◀──────────────────┘
//! ```
//!
//! `on = geiger_alt`, `off = geiger_alt - dead_band`.  An invalid altitude
//! never causes a transition.

use super::context::ControlContext;
use super::{StateDescriptor, StateId};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: AwaitingAltitude
        StateDescriptor {
            id: StateId::AwaitingAltitude,
            name: "AwaitingAltitude",
            on_enter: Some(awaiting_enter),
            on_exit: None,
            on_update: awaiting_update,
        },
        // Index 1: PostActive
        StateDescriptor {
            id: StateId::PostActive,
            name: "PostActive",
            on_enter: Some(post_enter),
            on_exit: Some(post_exit),
            on_update: post_update,
        },
        // Index 2: HvOffBelowThreshold
        StateDescriptor {
            id: StateId::HvOffBelowThreshold,
            name: "HvOffBelowThreshold",
            on_enter: Some(hv_off_enter),
            on_exit: None,
            on_update: hv_off_update,
        },
        // Index 3: HvOnAboveThreshold
        StateDescriptor {
            id: StateId::HvOnAboveThreshold,
            name: "HvOnAboveThreshold",
            on_enter: Some(hv_on_enter),
            on_exit: None,
            on_update: hv_on_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING ALTITUDE: HV off until the first valid sample
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_enter(ctx: &mut ControlContext) {
    ctx.hv_command = false;
}

fn awaiting_update(ctx: &mut ControlContext) -> Option<StateId> {
    let altitude = ctx.altitude_m?;

    if ctx.above_on_threshold() {
        info!(
            "AWAITING: first altitude {:.1} m above {:.1} m",
            altitude, ctx.config.geiger_alt_m
        );
        return Some(StateId::HvOnAboveThreshold);
    }

    if ctx.below_off_threshold() && ctx.post_pending() {
        return Some(StateId::PostActive);
    }

    Some(StateId::HvOffBelowThreshold)
}

// ═══════════════════════════════════════════════════════════════════════════
//  POST: tube energised on the ground for a fixed time
// ═══════════════════════════════════════════════════════════════════════════

fn post_enter(ctx: &mut ControlContext) {
    ctx.hv_command = true;
    ctx.post_done = true;
    info!(
        "POST: HV on for {}s ground self-test",
        ctx.config.post_duration_secs
    );
}

fn post_exit(_ctx: &mut ControlContext) {
    info!("POST: complete");
}

fn post_update(ctx: &mut ControlContext) -> Option<StateId> {
    if ctx.above_on_threshold() {
        return Some(StateId::HvOnAboveThreshold);
    }

    if ctx.secs_in_state() >= f64::from(ctx.config.post_duration_secs) {
        return Some(StateId::HvOffBelowThreshold);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HV OFF
// ═══════════════════════════════════════════════════════════════════════════

fn hv_off_enter(ctx: &mut ControlContext) {
    ctx.hv_command = false;
}

fn hv_off_update(ctx: &mut ControlContext) -> Option<StateId> {
    if ctx.above_on_threshold() {
        return Some(StateId::HvOnAboveThreshold);
    }
    // Started inside the dead band: the self-test waits for the ground.
    (ctx.below_off_threshold() && ctx.post_pending()).then_some(StateId::PostActive)
}

// ═══════════════════════════════════════════════════════════════════════════
//  HV ON
// ═══════════════════════════════════════════════════════════════════════════

fn hv_on_enter(ctx: &mut ControlContext) {
    ctx.hv_command = true;
    if ctx.post_pending() {
        info!("HV ON: pending POST cancelled");
    }
    ctx.post_done = true;
}

fn hv_on_update(ctx: &mut ControlContext) -> Option<StateId> {
    ctx.below_off_threshold()
        .then_some(StateId::HvOffBelowThreshold)
}
