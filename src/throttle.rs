//! Notification throttle.
//!
//! While the vessel sits in an alert state, reports go out at widening
//! checkpoints measured from the last state change: minutes 0, 5, 10 and 20,
//! every 30 minutes through the sixth hour, every hour through the first
//! day, then once a day.

use crate::fsm::AlertState;

const MINUTES_PER_DAY: u64 = 1440;

/// Checkpoints within the first day, precomputed at compile time.
static CHECKPOINTS: [bool; MINUTES_PER_DAY as usize] = build_checkpoints();

const fn build_checkpoints() -> [bool; MINUTES_PER_DAY as usize] {
    let mut table = [false; MINUTES_PER_DAY as usize];
    table[0] = true;
    table[5] = true;
    table[10] = true;
    table[20] = true;
    let mut m = 30;
    while m < 360 {
        table[m] = true;
        m += 30;
    }
    while m < MINUTES_PER_DAY as usize {
        table[m] = true;
        m += 60;
    }
    table
}

/// Whole minutes between the last transition and `now`.  Clock steps
/// backwards clamp to zero.
pub fn minutes_since(last_transition: i64, now: i64) -> u64 {
    u64::try_from(now.saturating_sub(last_transition)).unwrap_or(0) / 60
}

/// Whether a report is due `minutes` after a transition.
pub fn is_checkpoint(minutes: u64) -> bool {
    if minutes < MINUTES_PER_DAY {
        CHECKPOINTS[minutes as usize]
    } else {
        minutes % MINUTES_PER_DAY == 0
    }
}

/// Remembers the last checkpoint that fired so two ticks landing in the same
/// minute after the same transition produce one report.
#[derive(Debug, Default)]
pub struct NotificationThrottle {
    last_fired: Option<(i64, u64)>,
}

impl NotificationThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether this tick reports.  Only alert states and the tick a
    /// state change back to Normal happens on are eligible.
    pub fn should_report(&mut self, state: AlertState, just_changed: bool, last_transition: i64, now: i64) -> bool {
        if !state.is_alert() && !just_changed {
            return false;
        }
        let minutes = minutes_since(last_transition, now);
        if !is_checkpoint(minutes) {
            return false;
        }
        let key = (last_transition, minutes);
        if self.last_fired == Some(key) {
            return false;
        }
        self.last_fired = Some(key);
        true
    }
}
