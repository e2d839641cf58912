//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! structured line through the `log` facade.  The per-tick status line
//! reads like `72.00 (70) off->on`.

use log::{info, warn};

use crate::app::events::{AppEvent, TickStatus};
use crate::app::ports::EventSink;
use crate::fsm::AlertState;
use crate::target::Target;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// `<temp> (<target>) <relay>` plus a warning suffix while alerting.
pub fn format_status(s: &TickStatus) -> String {
    let target = match s.target {
        Target::Value(v) => format!("{v}"),
        Target::Off => "off".to_string(),
    };
    let relay = match (s.relay_on, s.relay_changed) {
        (true, true) => "off->on",
        (false, true) => "on->off",
        (true, false) => "on",
        (false, false) => "off",
    };
    let warning = match s.state {
        AlertState::HighTemp => "\tWarning: High Temperatures",
        AlertState::LowTemp => "\tWarning: Low Temperatures",
        AlertState::Normal => "",
    };
    format!("{:.2} ({}) {}{}", s.temp, target, relay, warning)
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { target } => {
                info!("START | target={}", target);
            }
            AppEvent::TargetChanged { from, to } => {
                info!("TARGET | {} -> {}", from, to);
            }
            AppEvent::SensorFailed(e) => {
                warn!("SENSOR | {}", e);
            }
            AppEvent::StateChanged(change) => {
                info!("STATE | {} -> {}", change.from.name(), change.to.name());
            }
            AppEvent::Status(status) => {
                info!("{}", format_status(status));
            }
            AppEvent::ReportDue(req) => {
                info!("REPORT | '{}' from t={}", req.subject, req.window_start);
            }
            AppEvent::StoreFailed(e) => {
                warn!("STORE | {}", e);
            }
        }
    }
}
