//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (thermometer, relay, target file, history store, report
//! outbox) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the control logic never touches a file or
//! a GPIO line directly.

use std::path::Path;

use crate::config::FermenterConfig;
use crate::error::{ActuatorError, ReportError, SensorError, StoreError, TargetError};
use crate::store::Record;
use crate::target::Target;

use super::events::EventMarker;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One blocking, bounded temperature read.
pub trait SensorPort {
    /// Vessel temperature in °F.
    fn read_temperature(&mut self) -> Result<f64, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The cooling relay.  Only the control tick drives it.
pub trait ActuatorPort {
    /// Drive the relay.  Returns `true` only if the output actually changed.
    fn set_relay(&mut self, on: bool) -> Result<bool, ActuatorError>;

    fn relay_is_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Operator input
// ───────────────────────────────────────────────────────────────

/// Out-of-band target source, polled once per control tick.
pub trait TargetPort {
    fn poll(&mut self) -> Result<Target, TargetError>;
}

// ───────────────────────────────────────────────────────────────
// History
// ───────────────────────────────────────────────────────────────

/// Write side of the series store as seen by the control tick.
pub trait SampleLog {
    fn append_sample(&mut self, t: i64, temp: f64, target: f64, relay_on: bool) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Wall-clock seconds since the Unix epoch.
pub trait ClockPort {
    fn now_secs(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / reports)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Reports
// ───────────────────────────────────────────────────────────────

/// A rendered report attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Notification transport.  May block on external I/O; never called from
/// the control tick.
pub trait ReportSink {
    fn send(&mut self, subject: &str, message: &str, attachment: Option<&Attachment>) -> Result<(), ReportError>;
}

/// Turns a window of history into an attachment.
pub trait Renderer {
    fn render(&self, records: &[Record], title: &str, markers: &[EventMarker]) -> Result<Attachment, ReportError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration.  Returns [`FermenterConfig::default()`] if no
    /// stored config exists.
    fn load(&self) -> Result<FermenterConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &FermenterConfig) -> Result<(), ConfigError>;

    /// Where the configuration lives, for log messages.
    fn location(&self) -> &Path;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from event system)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
///
/// The runtime implements this by pushing into its event queue; the
/// scheduler itself knows nothing about events.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, label: &str);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found.
    NotFound,
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
