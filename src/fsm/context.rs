//! Per-tick inputs threaded through every FSM handler.
//!
//! `FsmContext` carries the reading, the target, and the outcome of the
//! relay command for one control tick.  Handlers only read it; the relay
//! itself has already been driven by the time the FSM runs, so handlers can
//! tell "just switched" from "already on" through `relay_changed`.

use crate::config::FermenterConfig;
use crate::target::Target;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Hysteresis offsets in °F, all relative to the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Relay on above `target + relay_on`.
    pub relay_on: f64,
    /// Relay off below `target - relay_off`.
    pub relay_off: f64,
    /// HighTemp above `target + high_alert` while already cooling.
    pub high_alert: f64,
    /// LowTemp below `target - low_alert` while already idle.
    pub low_alert: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            relay_on: 1.0,
            relay_off: 0.25,
            high_alert: 2.0,
            low_alert: 2.0,
        }
    }
}

impl From<&FermenterConfig> for Thresholds {
    fn from(c: &FermenterConfig) -> Self {
        Self {
            relay_on: c.relay_on_offset_f,
            relay_off: c.relay_off_offset_f,
            high_alert: c.high_alert_offset_f,
            low_alert: c.low_alert_offset_f,
        }
    }
}

// ---------------------------------------------------------------------------
// Relay decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    On,
    Off,
    /// Inside the dead band: leave the relay as it is.
    Hold,
}

/// Hysteresis rule for the relay.  A disabled target always forces off.
pub fn decide_relay(temp: f64, target: Target, th: &Thresholds) -> RelayCommand {
    match target {
        Target::Off => RelayCommand::Off,
        Target::Value(t) if temp > t + th.relay_on => RelayCommand::On,
        Target::Value(t) if temp < t - th.relay_off => RelayCommand::Off,
        Target::Value(_) => RelayCommand::Hold,
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The context passed to every state handler function.
#[derive(Debug, Clone, Copy)]
pub struct FsmContext {
    /// Measured temperature (°F).
    pub temp: f64,
    pub target: Target,
    /// Command issued to the relay this tick.
    pub command: RelayCommand,
    /// Whether that command actually flipped the relay.
    pub relay_changed: bool,
    pub thresholds: Thresholds,
}

impl FsmContext {
    pub fn new(temp: f64, target: Target, command: RelayCommand, relay_changed: bool, thresholds: Thresholds) -> Self {
        Self {
            temp,
            target,
            command,
            relay_changed,
            thresholds,
        }
    }

    /// Cooling without effect: relay was already on and the vessel is
    /// still well above target.
    pub fn is_high_excursion(&self) -> bool {
        match (self.target, self.command) {
            (Target::Value(t), RelayCommand::On) => {
                !self.relay_changed && self.temp > t + self.thresholds.high_alert
            }
            _ => false,
        }
    }

    /// Relay already off and the vessel still well below target.
    pub fn is_low_excursion(&self) -> bool {
        match (self.target, self.command) {
            (Target::Value(t), RelayCommand::Off) => {
                !self.relay_changed && self.temp < t - self.thresholds.low_alert
            }
            _ => false,
        }
    }

    /// The relay flipped this tick, or the controller is disabled.
    pub fn resets_alert(&self) -> bool {
        self.target.is_off() || (self.relay_changed && self.command != RelayCommand::Hold)
    }
}
