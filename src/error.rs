//! Unified error types for the fermenter controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through events and the report channel without allocation;
//! I/O failures are reduced to their [`io::ErrorKind`].
//!
//! | Kind            | Policy                                            |
//! |-----------------|---------------------------------------------------|
//! | `Sensor`        | recoverable: skip the tick, alert, retry          |
//! | `Store`         | caller error on the query API, fatal at startup   |
//! | `Actuator`      | fatal: cannot regulate without the relay          |
//! | `Target`        | recoverable: previous target is kept              |
//! | `Report`        | contained within one report cycle                 |

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thermometer could not be read.
    Sensor(SensorError),
    /// The relay or an indicator pin could not be driven.
    Actuator(ActuatorError),
    /// The series store rejected an operation or is corrupted.
    Store(StoreError),
    /// The operator target could not be read or written.
    Target(TargetError),
    /// A report could not be rendered or delivered.
    Report(ReportError),
    /// Startup could not complete.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Target(e) => write!(f, "target: {e}"),
            Self::Report(e) => write!(f, "report: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No 1-Wire thermometer was found on the bus.
    DeviceNotFound,
    /// The device file could not be read.
    Io(io::ErrorKind),
    /// The CRC flag never reported `YES` within the retry budget.
    NotReady,
    /// The device output could not be parsed.
    Malformed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => write!(f, "no thermometer found"),
            Self::Io(kind) => write!(f, "read failed ({kind})"),
            Self::NotReady => write!(f, "CRC check never passed"),
            Self::Malformed => write!(f, "malformed device output"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// GPIO state could not be read back.
    GpioReadFailed,
    /// Pin export or direction setup failed.
    GpioSetupFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::GpioSetupFailed => write!(f, "GPIO setup failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The slot was never written, or the store holds no samples yet.
    NotFound,
    /// Range bounds are reversed, the step is zero, or a relative
    /// timestamp resolves before the epoch.
    InvalidRange,
    /// An absolute append landed before the most recent sample.
    OutOfOrder,
    /// The target value quantizes to the unwritten-slot sentinel.
    ReservedValue,
    /// On-disk layout does not match the metadata.
    Corruption(&'static str),
    /// Underlying file I/O failed.
    Io(io::ErrorKind),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no sample at that position"),
            Self::InvalidRange => write!(f, "invalid range"),
            Self::OutOfOrder => write!(f, "append before the latest sample"),
            Self::ReservedValue => write!(f, "target collides with the unwritten sentinel"),
            Self::Corruption(msg) => write!(f, "corrupted store: {msg}"),
            Self::Io(kind) => write!(f, "I/O error ({kind})"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind())
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Target errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    /// No target has been set yet.
    Missing,
    /// The target file could not be read or written.
    Io(io::ErrorKind),
    /// Neither a number nor `off`.
    Malformed,
    /// Outside the permitted [45, 80] °F band.
    OutOfRange,
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no target set"),
            Self::Io(kind) => write!(f, "I/O error ({kind})"),
            Self::Malformed => write!(f, "expected a temperature or 'off'"),
            Self::OutOfRange => write!(f, "target out of range [45, 80]"),
        }
    }
}

impl std::error::Error for TargetError {}

impl From<TargetError> for Error {
    fn from(e: TargetError) -> Self {
        Self::Target(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    /// The renderer could not produce an attachment.
    Render(&'static str),
    /// The outbox could not be written.
    Io(io::ErrorKind),
    /// The report queue is full; the job was dropped.
    QueueFull,
    /// The report worker has already shut down.
    WorkerGone,
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "render failed: {msg}"),
            Self::Io(kind) => write!(f, "I/O error ({kind})"),
            Self::QueueFull => write!(f, "report queue full"),
            Self::WorkerGone => write!(f, "report worker stopped"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<io::Error> for ReportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind())
    }
}

impl From<ReportError> for Error {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
