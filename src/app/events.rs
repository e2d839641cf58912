//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log a line, queue a message for the
//! mailer, render a graph.

use crate::error::{SensorError, StoreError};
use crate::fsm::{AlertState, StateChange};
use crate::target::Target;

/// Subject used when a message has none of its own.
pub const DEFAULT_SUBJECT: &str = "A message from your fermenter";

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started with this target.
    Started { target: Target },

    /// The operator changed the target between ticks.
    TargetChanged { from: Target, to: Target },

    /// The thermometer could not be read this tick.
    SensorFailed(SensorError),

    /// The alert state machine moved.
    StateChanged(StateChange),

    /// One line per successful tick.
    Status(TickStatus),

    /// A report (message + graph) should be produced.
    ReportDue(ReportRequest),

    /// The tick's sample could not be stored.
    StoreFailed(StoreError),
}

/// Snapshot of one successful control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickStatus {
    pub now: i64,
    pub temp: f64,
    pub target: Target,
    pub relay_on: bool,
    pub relay_changed: bool,
    pub state: AlertState,
}

/// A labelled vertical marker on a report graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMarker {
    pub time: i64,
    pub label: &'static str,
}

/// Everything a report worker needs to build and send one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub subject: String,
    pub title: String,
    pub message: String,
    /// Window start, absolute seconds, never negative.
    pub window_start: i64,
    /// Window end, or `None` for "up to the latest sample".
    pub window_end: Option<i64>,
    pub markers: Vec<EventMarker>,
}

impl ReportRequest {
    /// Alert report for the current state, covering `lookback_secs` before
    /// the transition up to the latest sample.
    pub fn for_state(state: AlertState, last_transition: i64, lookback_secs: u64, status: &TickStatus) -> Self {
        let (subject, title, marker) = match state {
            AlertState::Normal => ("Returned to Normal Operation", "State: Normal Operation", None),
            AlertState::HighTemp => ("Warning: High Temp", "State: High Temp", Some("High Temp Begun")),
            AlertState::LowTemp => ("Warning: Low Temp", "State: Low Temp", Some("Low Temp Begun")),
        };
        Self {
            subject: subject.to_string(),
            title: title.to_string(),
            message: format!("{}: {:.2}F with target {}", title, status.temp, status.target),
            window_start: last_transition.saturating_sub(lookback_secs as i64).max(0),
            window_end: None,
            markers: marker
                .map(|label| EventMarker {
                    time: last_transition,
                    label,
                })
                .into_iter()
                .collect(),
        }
    }

    /// The unconditional twelve-hourly report.
    pub fn periodic(now: i64, window_secs: u64) -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            title: "Latest temperature readings".to_string(),
            message: "It's been twelve hours. Here are the latest temperature readings from your new brew"
                .to_string(),
            window_start: now.saturating_sub(window_secs as i64).max(0),
            window_end: None,
            markers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> TickStatus {
        TickStatus {
            now: 100_000,
            temp: 73.0,
            target: Target::Value(70.0),
            relay_on: true,
            relay_changed: false,
            state: AlertState::HighTemp,
        }
    }

    #[test]
    fn high_temp_report_marks_transition() {
        let req = ReportRequest::for_state(AlertState::HighTemp, 100_000, 43_200, &status());
        assert_eq!(req.subject, "Warning: High Temp");
        assert_eq!(req.title, "State: High Temp");
        assert_eq!(req.window_start, 100_000 - 43_200);
        assert_eq!(req.markers, vec![EventMarker { time: 100_000, label: "High Temp Begun" }]);
    }

    #[test]
    fn normal_report_has_no_marker() {
        let req = ReportRequest::for_state(AlertState::Normal, 5_000, 43_200, &status());
        assert_eq!(req.subject, "Returned to Normal Operation");
        assert!(req.markers.is_empty());
    }

    #[test]
    fn periodic_window_trails_now() {
        let req = ReportRequest::periodic(50_000, 43_200);
        assert_eq!(req.window_start, 6_800);
        assert!(req.message.starts_with("It's been twelve hours"));
    }
}
