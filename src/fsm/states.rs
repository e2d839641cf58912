//! Concrete state handler functions and table builder.
//!
//! ```text
//!  NORMAL ──[relay already on,  T > target + 2]──▶ HIGH TEMP
//!  NORMAL ──[relay already off, T < target - 2]──▶ LOW TEMP
//!
//!  HIGH TEMP / LOW TEMP ──[relay flipped or target off]──▶ NORMAL
//! ```

use super::context::FsmContext;
use super::{AlertState, StateDescriptor};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; AlertState::COUNT] {
    [
        // Index 0: Normal
        StateDescriptor {
            id: AlertState::Normal,
            name: "Normal",
            on_enter: Some(normal_enter),
            on_update: normal_update,
        },
        // Index 1: HighTemp
        StateDescriptor {
            id: AlertState::HighTemp,
            name: "HighTemp",
            on_enter: Some(high_temp_enter),
            on_update: excursion_update,
        },
        // Index 2: LowTemp
        StateDescriptor {
            id: AlertState::LowTemp,
            name: "LowTemp",
            on_enter: Some(low_temp_enter),
            on_update: excursion_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL
// ═══════════════════════════════════════════════════════════════════════════

fn normal_enter(ctx: &FsmContext) {
    info!("NORMAL: {:.2}F, target {}", ctx.temp, ctx.target);
}

fn normal_update(ctx: &FsmContext) -> Option<AlertState> {
    if ctx.resets_alert() {
        return None;
    }
    if ctx.is_high_excursion() {
        return Some(AlertState::HighTemp);
    }
    if ctx.is_low_excursion() {
        return Some(AlertState::LowTemp);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HIGH TEMP / LOW TEMP
// ═══════════════════════════════════════════════════════════════════════════

fn high_temp_enter(ctx: &FsmContext) {
    warn!("HIGH TEMP: {:.2}F with cooling already on, target {}", ctx.temp, ctx.target);
}

fn low_temp_enter(ctx: &FsmContext) {
    warn!("LOW TEMP: {:.2}F with cooling already off, target {}", ctx.temp, ctx.target);
}

/// Shared by both alert states: a relay edge or a disabled target clears
/// the alert; a further excursion on the other side is possible only after
/// the relay has flipped, which already returned us to Normal.
fn excursion_update(ctx: &FsmContext) -> Option<AlertState> {
    if ctx.resets_alert() {
        return Some(AlertState::Normal);
    }
    if ctx.is_high_excursion() {
        return Some(AlertState::HighTemp);
    }
    if ctx.is_low_excursion() {
        return Some(AlertState::LowTemp);
    }
    None
}
