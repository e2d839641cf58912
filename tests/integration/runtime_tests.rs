//! Runtime loop tests: scheduling, report hand-off, and the shutdown
//! guarantee (heartbeat stopped, relay released) on every exit path.

use core::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use embedded_hal::digital::{ErrorType, OutputPin};

use fermenter::adapters::csv_renderer::CsvRenderer;
use fermenter::adapters::report::ReportWorker;
use fermenter::config::FermenterConfig;
use fermenter::drivers::heartbeat::Heartbeat;
use fermenter::error::{ActuatorError, Error, SensorError};
use fermenter::runtime::Runtime;
use fermenter::store::{SeriesStore, SharedStore};
use fermenter::target::Target;

use crate::mock_hw::{CapturingReports, MockClock, MockHardware, MockTarget};

const T0: i64 = 1_700_000_040;

fn fast_config() -> FermenterConfig {
    FermenterConfig {
        loop_poll_ms: 1,
        sensor_retry_pause_ms: 1,
        heartbeat_interval_ms: 1,
        ..FermenterConfig::default()
    }
}

fn open_store(dir: &tempfile::TempDir) -> SharedStore {
    SharedStore::new(SeriesStore::open(dir.path(), 86_400).unwrap())
}

/// LED pin whose level the test can observe after the thread is gone.
#[derive(Clone, Default)]
struct Led {
    lit: Arc<AtomicBool>,
    toggles: Arc<AtomicUsize>,
}

impl ErrorType for Led {
    type Error = Infallible;
}

impl OutputPin for Led {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.lit.store(false, Ordering::SeqCst);
        self.toggles.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.lit.store(true, Ordering::SeqCst);
        self.toggles.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn stop_signal_releases_relay_and_stops_heartbeat() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let hw = MockHardware::new(75.0);
    let led = Led::default();
    let reports = CapturingReports::default();

    let worker = ReportWorker::start(store.clone(), CsvRenderer::default(), reports.clone()).unwrap();
    let heartbeat = Heartbeat::start(led.clone(), Duration::from_millis(1)).unwrap();
    let mut runtime = Runtime::new(
        fast_config(),
        hw.clone(),
        MockTarget::new(Target::Value(70.0)),
        MockClock::new(T0, 60),
        store.clone(),
        Target::Value(70.0),
    )
    .with_reports(worker)
    .with_heartbeat(heartbeat);
    hw.stop_after(3, runtime.stop_handle());

    runtime.run().unwrap();
    assert!(hw.is_relay_on(), "relay stays on until the runtime is dropped");
    assert_eq!(runtime.app().tick_count(), 3);
    drop(runtime);

    assert!(!hw.is_relay_on());
    assert!(!led.lit.load(Ordering::SeqCst));
    let toggles = led.toggles.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(led.toggles.load(Ordering::SeqCst), toggles, "heartbeat thread still running");

    // Three control ticks, one sample each.
    assert_eq!(hw.state().reads, 3);
    assert_eq!(store.lock().range(None, None, 1).unwrap().len(), 3);

    // Startup message, then the high temperature alert queued on tick two.
    let sent = reports.sent();
    assert_eq!(sent[0].message, "Starting fermenter at 70F");
    assert!(sent.iter().any(|r| r.subject == "Warning: High Temp" && r.attachment.is_some()));
}

#[test]
fn actuator_fault_ends_run_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let hw = MockHardware::new(75.0);
    hw.state().relay_fault = true;

    let mut runtime = Runtime::new(
        fast_config(),
        hw.clone(),
        MockTarget::new(Target::Value(70.0)),
        MockClock::new(T0, 60),
        open_store(&dir),
        Target::Value(70.0),
    );
    let err = runtime.run().unwrap_err();
    assert_eq!(err, Error::Actuator(ActuatorError::GpioWriteFailed));

    // Once the fault clears, dropping still releases the relay.
    {
        let mut s = hw.state();
        s.relay_fault = false;
        s.relay_on = true;
    }
    drop(runtime);
    assert!(!hw.is_relay_on());
}

#[test]
fn sensor_failure_is_announced_once_and_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let hw = MockHardware::new(70.0).script([Err(SensorError::NotReady)]);
    let reports = CapturingReports::default();
    let worker = ReportWorker::start(store.clone(), CsvRenderer::default(), reports.clone()).unwrap();

    let mut runtime = Runtime::new(
        fast_config(),
        hw.clone(),
        MockTarget::new(Target::Value(70.0)),
        MockClock::new(T0, 60),
        store.clone(),
        Target::Value(70.0),
    )
    .with_reports(worker);
    hw.stop_after(3, runtime.stop_handle());

    runtime.run().unwrap();
    drop(runtime);

    let failures = reports
        .sent()
        .iter()
        .filter(|r| r.message == "can't read the temperature")
        .count();
    assert_eq!(failures, 1);
    assert_eq!(store.lock().range(None, None, 1).unwrap().len(), 2);
}

#[test]
fn periodic_report_fires_on_its_own_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let hw = MockHardware::new(70.0);
    let reports = CapturingReports::default();
    let worker = ReportWorker::start(store.clone(), CsvRenderer::default(), reports.clone()).unwrap();

    let config = FermenterConfig {
        report_interval_secs: 180,
        ..fast_config()
    };
    let mut runtime = Runtime::new(
        config,
        hw.clone(),
        MockTarget::new(Target::Value(70.0)),
        MockClock::new(T0, 60),
        store,
        Target::Value(70.0),
    )
    .with_reports(worker);
    hw.stop_after(7, runtime.stop_handle());

    runtime.run().unwrap();
    drop(runtime);

    let periodic = reports
        .sent()
        .iter()
        .filter(|r| r.message.starts_with("It's been twelve hours"))
        .count();
    assert_eq!(periodic, 2);
}
