//! Timer/scheduler engine.
//!
//! Drives the two timed activities of the control loop, the control tick
//! and the periodic report, on wall-clock time.  The scheduler notifies a
//! [`SchedulerDelegate`] when a schedule fires; the runtime implements the
//! delegate to push events into its queue.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │        ┌────────────────┐           ┌────────────────┐       │
//! │        │ Control tick   │           │ Periodic report│       │
//! │        │ (60 s)         │           │ (12 h)         │       │
//! │        └───────┬────────┘           └───────┬────────┘       │
//! │                ▼                            ▼                │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate                         │  │
//! │  │       (runtime pushes into its EventQueue)             │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │          AppService.tick()  /  report worker                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The heartbeat LED is not scheduled here: it runs on its own thread.

use crate::app::ports::SchedulerDelegate;
use log::{info, warn};

/// Label of the control-tick schedule.
pub const CONTROL_SCHEDULE: &str = "control";
/// Label of the periodic report schedule.
pub const REPORT_SCHEDULE: &str = "periodic-report";

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A recurring schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub label: &'static str,
    /// Seconds between fires.
    pub interval_secs: u64,
    /// Fire on the first tick instead of one interval later.
    pub run_at_start: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Absolute time of the next fire; set on the first tick.
    next_due: Option<i64>,
}

pub struct Scheduler {
    schedules: heapless::Vec<ScheduleEntry, MAX_SCHEDULES>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: heapless::Vec::new(),
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        let label = schedule.label;
        let interval = schedule.interval_secs;
        self.schedules
            .push(ScheduleEntry {
                schedule,
                next_due: None,
            })
            .ok()?;
        let slot = self.schedules.len() - 1;
        info!("Scheduler: added '{}' every {}s at slot {}", label, interval, slot);
        Some(slot)
    }

    /// Seconds until the earliest pending fire, or `None` before the first
    /// tick or with nothing scheduled.
    pub fn secs_until_next(&self, now: i64) -> Option<u64> {
        self.schedules
            .iter()
            .filter_map(|e| e.next_due)
            .min()
            .map(|due| u64::try_from(due.saturating_sub(now)).unwrap_or(0))
    }

    /// Fire every schedule that is due at `now`.
    ///
    /// A schedule that fell several intervals behind (suspend, clock step)
    /// fires once and is realigned rather than replaying every missed fire.
    pub fn tick(&mut self, now: i64, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.schedules.iter_mut() {
            let interval = entry.schedule.interval_secs.max(1) as i64;
            let due = *entry.next_due.get_or_insert(if entry.schedule.run_at_start {
                now
            } else {
                now + interval
            });
            if now < due {
                continue;
            }

            delegate.on_schedule_fired(entry.schedule.label);

            let missed = (now - due) / interval;
            if missed > 0 {
                warn!(
                    "Scheduler: '{}' skipped {} missed fire(s)",
                    entry.schedule.label, missed
                );
            }
            entry.next_due = Some(due + (missed + 1) * interval);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
