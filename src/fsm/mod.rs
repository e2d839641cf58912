//! Function-pointer alert state machine.
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │  StateTable                                    │
//! │  ┌───────────┬───────────┬──────────────────┐  │
//! │  │ State     │ on_enter  │ on_update        │  │
//! │  ├───────────┼───────────┼──────────────────┤  │
//! │  │ Normal    │ fn(ctx)   │ fn(ctx)->Option<>│  │
//! │  │ HighTemp  │ fn(ctx)   │ fn(ctx)->Option<>│  │
//! │  │ LowTemp   │ fn(ctx)   │ fn(ctx)->Option<>│  │
//! │  └───────────┴───────────┴──────────────────┘  │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! Each control tick the engine calls `on_update` for the current state with
//! the tick's [`FsmContext`].  A returned state different from the current
//! one is a transition: the transition time is stamped and `on_enter` runs.
//! Staying in the same state never touches the transition time.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

pub use context::{RelayCommand, Thresholds, decide_relay};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Alert state of the vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertState {
    Normal = 0,
    HighTemp = 1,
    LowTemp = 2,
}

impl AlertState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 3;

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::HighTemp => "HighTemp",
            Self::LowTemp => "LowTemp",
        }
    }

    pub fn is_alert(self) -> bool {
        self != Self::Normal
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Runs once when a state is entered.
pub type StateActionFn = fn(&FsmContext);

/// Per-tick update handler.  Returns `Some(next)` to request a state.
pub type StateUpdateFn = fn(&FsmContext) -> Option<AlertState>;

/// Static descriptor for a single state.
pub struct StateDescriptor {
    pub id: AlertState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// A state change, stamped with the tick time it happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: AlertState,
    pub to: AlertState,
    pub at: i64,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    table: [StateDescriptor; AlertState::COUNT],
    current: usize,
    /// Wall-clock seconds of the last real state change.
    last_transition: i64,
}

impl Fsm {
    /// A machine in `Normal`, with the transition time set to `start_time`.
    pub fn new(start_time: i64) -> Self {
        Self {
            table: states::build_state_table(),
            current: AlertState::Normal as usize,
            last_transition: start_time,
        }
    }

    /// Evaluate one tick.  Returns the change, if the state moved.
    pub fn tick(&mut self, ctx: &FsmContext, now: i64) -> Option<StateChange> {
        let next = (self.table[self.current].on_update)(ctx)?;
        if next as usize == self.current {
            return None;
        }
        let from = self.current_state();
        self.transition(next, ctx, now);
        Some(StateChange { from, to: next, at: now })
    }

    pub fn current_state(&self) -> AlertState {
        self.table[self.current].id
    }

    pub fn last_transition(&self) -> i64 {
        self.last_transition
    }

    fn transition(&mut self, next: AlertState, ctx: &FsmContext, now: i64) {
        let next_idx = next as usize;
        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );
        self.current = next_idx;
        self.last_transition = now;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    const T: Target = Target::Value(70.0);

    fn ctx(temp: f64, target: Target, command: RelayCommand, changed: bool) -> FsmContext {
        FsmContext::new(temp, target, command, changed, Thresholds::default())
    }

    #[test]
    fn starts_normal_at_start_time() {
        let fsm = Fsm::new(1_000);
        assert_eq!(fsm.current_state(), AlertState::Normal);
        assert_eq!(fsm.last_transition(), 1_000);
    }

    #[test]
    fn relay_turning_on_stays_normal() {
        let mut fsm = Fsm::new(0);
        assert_eq!(fsm.tick(&ctx(72.0, T, RelayCommand::On, true), 60), None);
        assert_eq!(fsm.current_state(), AlertState::Normal);
    }

    #[test]
    fn already_on_and_hot_goes_high() {
        let mut fsm = Fsm::new(0);
        let change = fsm.tick(&ctx(73.0, T, RelayCommand::On, false), 120).unwrap();
        assert_eq!(change, StateChange { from: AlertState::Normal, to: AlertState::HighTemp, at: 120 });
        assert_eq!(fsm.last_transition(), 120);
    }

    #[test]
    fn already_on_but_within_two_degrees_stays_normal() {
        let mut fsm = Fsm::new(0);
        assert_eq!(fsm.tick(&ctx(71.5, T, RelayCommand::On, false), 60), None);
    }

    #[test]
    fn already_off_and_cold_goes_low() {
        let mut fsm = Fsm::new(0);
        let change = fsm.tick(&ctx(67.9, T, RelayCommand::Off, false), 60).unwrap();
        assert_eq!(change.to, AlertState::LowTemp);
    }

    #[test]
    fn staying_in_state_keeps_transition_time() {
        let mut fsm = Fsm::new(0);
        fsm.tick(&ctx(73.0, T, RelayCommand::On, false), 60);
        for now in [120, 180, 240] {
            assert_eq!(fsm.tick(&ctx(74.0, T, RelayCommand::On, false), now), None);
        }
        assert_eq!(fsm.current_state(), AlertState::HighTemp);
        assert_eq!(fsm.last_transition(), 60);
    }

    #[test]
    fn relay_edge_returns_to_normal() {
        let mut fsm = Fsm::new(0);
        fsm.tick(&ctx(73.0, T, RelayCommand::On, false), 60);
        let change = fsm.tick(&ctx(69.0, T, RelayCommand::Off, true), 600).unwrap();
        assert_eq!(change.from, AlertState::HighTemp);
        assert_eq!(change.to, AlertState::Normal);
    }

    #[test]
    fn disabled_target_forces_normal() {
        let mut fsm = Fsm::new(0);
        fsm.tick(&ctx(60.0, T, RelayCommand::Off, false), 60);
        assert_eq!(fsm.current_state(), AlertState::LowTemp);
        let change = fsm.tick(&ctx(60.0, Target::Off, RelayCommand::Off, false), 120).unwrap();
        assert_eq!(change.to, AlertState::Normal);
    }

    #[test]
    fn dead_band_holds_alert_state() {
        let mut fsm = Fsm::new(0);
        fsm.tick(&ctx(60.0, T, RelayCommand::Off, false), 60);
        assert_eq!(fsm.tick(&ctx(70.5, T, RelayCommand::Hold, false), 120), None);
        assert_eq!(fsm.current_state(), AlertState::LowTemp);
    }

    #[test]
    fn table_ids_match_indices() {
        for (i, d) in states::build_state_table().iter().enumerate() {
            assert_eq!(d.id as usize, i);
            assert_eq!(d.name, d.id.name());
        }
    }
}
