//! Integration tests for the control tick: target → sensor → relay → FSM →
//! history → throttle, against mock ports and a real on-disk store.

use fermenter::app::events::AppEvent;
use fermenter::app::service::{AppService, TickOutcome};
use fermenter::config::FermenterConfig;
use fermenter::error::SensorError;
use fermenter::fsm::AlertState;
use fermenter::store::{SeriesStore, SharedStore, TARGET_DISABLED};
use fermenter::target::Target;

use crate::mock_hw::{MemLog, MockHardware, MockTarget, RecordingSink, RelayCall};

const T0: i64 = 1_700_000_040;
const MIN: i64 = 60;

fn make_app(target: Target) -> (AppService, MockTarget, MemLog, RecordingSink) {
    let mut app = AppService::new(&FermenterConfig::default(), T0, target);
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, MockTarget::new(target), MemLog::default(), sink)
}

fn reports_due(sink: &RecordingSink) -> usize {
    sink.count(|e| matches!(e, AppEvent::ReportDue(_)))
}

// ── Scenario A: 72F against 70F turns the relay on ────────────

#[test]
fn warm_reading_turns_relay_on() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(72.0);

    let outcome = app.tick(T0, &mut hw, &mut target, &mut log, &mut sink).unwrap();

    let TickOutcome::Regulated(status) = outcome else {
        panic!("expected a regulated tick, got {:?}", outcome);
    };
    assert!(status.relay_on);
    assert!(status.relay_changed);
    assert_eq!(status.state, AlertState::Normal);
    assert_eq!(hw.last_call(), Some(RelayCall { on: true, changed: true }));
    assert_eq!(log.samples, vec![(T0, 72.0, 70.0, true)]);
    assert_eq!(reports_due(&sink), 0);
}

// ── Scenario B: still hot with the relay already on ───────────

#[test]
fn hot_with_relay_on_enters_high_temp_and_reports_immediately() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(73.0).with_relay_on();
    let now = T0 + 10 * MIN;

    app.tick(now, &mut hw, &mut target, &mut log, &mut sink).unwrap();

    assert_eq!(app.state(), AlertState::HighTemp);
    assert_eq!(app.last_transition(), now);
    let due: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ReportDue(req) => Some(req),
            _ => None,
        })
        .collect();
    assert_eq!(due.len(), 1, "throttle must fire at minute 0");
    assert_eq!(due[0].subject, "Warning: High Temp");
    assert_eq!(due[0].markers[0].time, now);
}

#[test]
fn high_temp_reports_follow_checkpoints() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(73.0).with_relay_on();
    let start = T0;

    // One tick a minute for the first half hour.
    for m in 0..=30 {
        app.tick(start + m * MIN, &mut hw, &mut target, &mut log, &mut sink).unwrap();
    }
    // Minutes 0, 5, 10, 20, 30.
    assert_eq!(reports_due(&sink), 5);
    assert_eq!(app.state(), AlertState::HighTemp);
}

#[test]
fn cooling_back_down_returns_to_normal_with_report() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(73.0).with_relay_on();
    app.tick(T0, &mut hw, &mut target, &mut log, &mut sink).unwrap();
    assert_eq!(app.state(), AlertState::HighTemp);
    sink.clear();

    hw.set_reading(69.5);
    app.tick(T0 + 7 * MIN, &mut hw, &mut target, &mut log, &mut sink).unwrap();

    assert_eq!(app.state(), AlertState::Normal);
    assert!(!hw.is_relay_on());
    let subjects: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ReportDue(req) => Some(req.subject.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(subjects, ["Returned to Normal Operation"]);

    // Staying normal never reports again.
    sink.clear();
    for m in 8..20 {
        app.tick(T0 + m * MIN, &mut hw, &mut target, &mut log, &mut sink).unwrap();
    }
    assert_eq!(reports_due(&sink), 0);
}

#[test]
fn cold_with_relay_off_enters_low_temp() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(67.5);

    app.tick(T0, &mut hw, &mut target, &mut log, &mut sink).unwrap();

    assert_eq!(app.state(), AlertState::LowTemp);
    assert_eq!(hw.last_call(), Some(RelayCall { on: false, changed: false }));
    assert_eq!(reports_due(&sink), 1);
}

// ── Scenario C: target switched off while cooling ─────────────

#[test]
fn target_off_forces_relay_off_and_records_disabled_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SharedStore::new(SeriesStore::open(dir.path(), 86_400).unwrap());

    let (mut app, mut target, _, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(73.0).with_relay_on();
    app.tick(T0, &mut hw, &mut target, &mut store, &mut sink).unwrap();
    assert_eq!(app.state(), AlertState::HighTemp);

    target.set(Target::Off);
    sink.clear();
    app.tick(T0 + MIN, &mut hw, &mut target, &mut store, &mut sink).unwrap();

    assert!(!hw.is_relay_on());
    assert_eq!(hw.last_call(), Some(RelayCall { on: false, changed: true }));
    assert_eq!(app.state(), AlertState::Normal);
    assert!(matches!(
        sink.events.first(),
        Some(AppEvent::TargetChanged {
            from: Target::Value(_),
            to: Target::Off
        })
    ));

    let record = store.lock().get(T0 + MIN).unwrap();
    assert!(record.is_disabled());
    assert_eq!((record.target * 100.0).round() as i32, TARGET_DISABLED);
    assert!(!record.relay_on);
}

#[test]
fn target_change_is_announced_before_regulation() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(66.5);

    target.set(Target::Value(65.0));
    sink.clear();
    app.tick(T0, &mut hw, &mut target, &mut log, &mut sink).unwrap();

    assert!(matches!(sink.events[0], AppEvent::TargetChanged { .. }));
    // 66.5 > 65 + 1: regulation used the new target.
    assert!(hw.is_relay_on());
    assert_eq!(app.target(), Target::Value(65.0));
}

// ── Scenario D: one failed sensor read ────────────────────────

#[test]
fn sensor_failure_skips_tick_and_alerts_once() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(70.5).script([Err(SensorError::NotReady)]);

    let outcome = app.tick(T0, &mut hw, &mut target, &mut log, &mut sink).unwrap();
    assert_eq!(outcome, TickOutcome::SensorFailed(SensorError::NotReady));
    assert!(log.samples.is_empty());
    assert!(hw.state().calls.is_empty(), "relay must not be commanded");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFailed(_))), 1);

    // Next tick recovers.
    app.tick(T0 + MIN, &mut hw, &mut target, &mut log, &mut sink).unwrap();
    assert_eq!(log.samples.len(), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFailed(_))), 1);
}

// ── Control idempotence ───────────────────────────────────────

#[test]
fn steady_input_reports_a_relay_edge_only_once() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(71.5);

    for m in 0..10 {
        app.tick(T0 + m * MIN, &mut hw, &mut target, &mut log, &mut sink).unwrap();
    }
    let edges = hw.state().calls.iter().filter(|c| c.changed).count();
    assert_eq!(edges, 1);
}

#[test]
fn out_of_order_store_write_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SharedStore::new(SeriesStore::open(dir.path(), 86_400).unwrap());
    let (mut app, mut target, _, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(72.0);

    app.tick(T0 + 10 * MIN, &mut hw, &mut target, &mut store, &mut sink).unwrap();
    let outcome = app.tick(T0, &mut hw, &mut target, &mut store, &mut sink).unwrap();

    assert!(matches!(outcome, TickOutcome::Regulated(_)));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::StoreFailed(_))), 1);
    assert!(store.lock().get(T0).is_err());
}

// ── Scenario E: open range over a single sample ───────────────

#[test]
fn open_range_on_fresh_store_returns_the_one_sample() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SeriesStore::open(dir.path(), 86_400).unwrap();
    store.append(T0, 70.25, 70.0, false).unwrap();

    let records = store.range(None, None, 1).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp, T0);
    assert_eq!(records[0].temp, 70.25);
}

#[test]
fn actuator_fault_is_returned() {
    let (mut app, mut target, mut log, mut sink) = make_app(Target::Value(70.0));
    let mut hw = MockHardware::new(75.0);
    hw.state().relay_fault = true;

    let err = app.tick(T0, &mut hw, &mut target, &mut log, &mut sink).unwrap_err();
    assert!(matches!(err, fermenter::error::Error::Actuator(_)));
    assert!(log.samples.is_empty());
}
