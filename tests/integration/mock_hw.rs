//! Mock hardware and port adapters for integration tests.
//!
//! Records every relay call so tests can assert on the full command history
//! without touching real GPIO.  State lives behind an `Arc<Mutex<_>>` so a
//! test keeps a handle after moving the mock into a `Runtime`.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fermenter::app::events::AppEvent;
use fermenter::app::ports::{
    ActuatorPort, Attachment, ClockPort, EventSink, ReportSink, SampleLog, SensorPort, TargetPort,
};
use fermenter::error::{ActuatorError, ReportError, SensorError, StoreError, TargetError};
use fermenter::target::Target;

// ── Relay call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCall {
    pub on: bool,
    pub changed: bool,
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct HwState {
    /// Scripted readings, consumed front first.
    pub readings: VecDeque<Result<f64, SensorError>>,
    /// Returned once the script runs out.
    pub steady: f64,
    pub relay_on: bool,
    pub relay_fault: bool,
    pub calls: Vec<RelayCall>,
    pub reads: usize,
    /// Raise this flag once `reads` reaches the count.
    pub stop_after: Option<(usize, Arc<AtomicBool>)>,
}

#[derive(Clone, Default)]
pub struct MockHardware(pub Arc<Mutex<HwState>>);

#[allow(dead_code)]
impl MockHardware {
    pub fn new(steady: f64) -> Self {
        let hw = Self::default();
        hw.state().steady = steady;
        hw
    }

    pub fn with_relay_on(self) -> Self {
        self.state().relay_on = true;
        self
    }

    pub fn script(self, readings: impl IntoIterator<Item = Result<f64, SensorError>>) -> Self {
        self.state().readings.extend(readings);
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, HwState> {
        self.0.lock().unwrap()
    }

    pub fn set_reading(&self, temp: f64) {
        self.state().steady = temp;
    }

    pub fn is_relay_on(&self) -> bool {
        self.state().relay_on
    }

    pub fn last_call(&self) -> Option<RelayCall> {
        self.state().calls.last().copied()
    }

    pub fn stop_after(&self, reads: usize, flag: Arc<AtomicBool>) {
        self.state().stop_after = Some((reads, flag));
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        let mut s = self.state();
        s.reads += 1;
        if let Some((after, flag)) = &s.stop_after {
            if s.reads >= *after {
                flag.store(true, Ordering::SeqCst);
            }
        }
        let steady = s.steady;
        s.readings.pop_front().unwrap_or(Ok(steady))
    }
}

impl ActuatorPort for MockHardware {
    fn set_relay(&mut self, on: bool) -> Result<bool, ActuatorError> {
        let mut s = self.state();
        if s.relay_fault {
            return Err(ActuatorError::GpioWriteFailed);
        }
        let changed = s.relay_on != on;
        s.relay_on = on;
        s.calls.push(RelayCall { on, changed });
        Ok(changed)
    }

    fn relay_is_on(&self) -> bool {
        self.state().relay_on
    }
}

// ── MockTarget ────────────────────────────────────────────────

pub struct MockTarget {
    pub current: Result<Target, TargetError>,
}

#[allow(dead_code)]
impl MockTarget {
    pub fn new(target: Target) -> Self {
        Self { current: Ok(target) }
    }

    pub fn set(&mut self, target: Target) {
        self.current = Ok(target);
    }
}

impl TargetPort for MockTarget {
    fn poll(&mut self) -> Result<Target, TargetError> {
        self.current
    }
}

// ── MemLog ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemLog {
    pub samples: Vec<(i64, f64, f64, bool)>,
}

impl SampleLog for MemLog {
    fn append_sample(&mut self, t: i64, temp: f64, target: f64, relay_on: bool) -> Result<(), StoreError> {
        self.samples.push((t, temp, target, relay_on));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Advances by `step` seconds on every read.
pub struct MockClock {
    now: Cell<i64>,
    step: i64,
}

impl MockClock {
    pub fn new(start: i64, step: i64) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }
}

impl ClockPort for MockClock {
    fn now_secs(&self) -> i64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

// ── Report capture ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SentReport {
    pub subject: String,
    pub message: String,
    pub attachment: Option<Attachment>,
}

#[derive(Clone, Default)]
pub struct CapturingReports(pub Arc<Mutex<Vec<SentReport>>>);

#[allow(dead_code)]
impl CapturingReports {
    pub fn sent(&self) -> Vec<SentReport> {
        self.0.lock().unwrap().clone()
    }
}

impl ReportSink for CapturingReports {
    fn send(&mut self, subject: &str, message: &str, attachment: Option<&Attachment>) -> Result<(), ReportError> {
        self.0.lock().unwrap().push(SentReport {
            subject: subject.to_string(),
            message: message.to_string(),
            attachment: attachment.cloned(),
        });
        Ok(())
    }
}
