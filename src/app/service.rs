//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the alert FSM, the notification throttle, and the
//! current target.  One call to [`AppService::tick`] is one control tick,
//! strictly in this order:
//!
//! ```text
//!  TargetPort ─▶ SensorPort ─▶ hysteresis ─▶ ActuatorPort
//!                                  │
//!                                  ▼
//!                         FSM ─▶ SampleLog ─▶ throttle ─▶ EventSink
//! ```

use log::{info, warn};

use crate::config::FermenterConfig;
use crate::error::{Result, SensorError};
use crate::fsm::context::FsmContext;
use crate::fsm::{AlertState, Fsm, RelayCommand, Thresholds, decide_relay};
use crate::target::Target;
use crate::throttle::NotificationThrottle;

use super::events::{AppEvent, ReportRequest, TickStatus};
use super::ports::{ActuatorPort, EventSink, SampleLog, SensorPort, TargetPort};

/// What one control tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A reading was taken, the relay driven, and a sample recorded.
    Regulated(TickStatus),
    /// The thermometer failed; nothing was driven or recorded.
    SensorFailed(SensorError),
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    fsm: Fsm,
    throttle: NotificationThrottle,
    thresholds: Thresholds,
    target: Target,
    alert_lookback_secs: u64,
    tick_count: u64,
}

impl AppService {
    /// Construct the service.  The alert state starts `Normal` at `now`.
    pub fn new(config: &FermenterConfig, now: i64, initial_target: Target) -> Self {
        Self {
            fsm: Fsm::new(now),
            throttle: NotificationThrottle::new(),
            thresholds: Thresholds::from(config),
            target: initial_target,
            alert_lookback_secs: config.alert_lookback_secs,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started { target: self.target });
        info!("AppService started, target {}", self.target);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control tick.
    ///
    /// Sensor failures are reported and skip the tick.  Store failures are
    /// reported and regulation carries on.  Only an actuator fault is
    /// returned as an error.
    pub fn tick(
        &mut self,
        now: i64,
        hw: &mut (impl SensorPort + ActuatorPort),
        target_port: &mut impl TargetPort,
        log: &mut impl SampleLog,
        sink: &mut impl EventSink,
    ) -> Result<TickOutcome> {
        self.tick_count += 1;

        // 1. Operator target
        match target_port.poll() {
            Ok(target) if target != self.target => {
                info!("Target changed: {} -> {}", self.target, target);
                sink.emit(&AppEvent::TargetChanged {
                    from: self.target,
                    to: target,
                });
                self.target = target;
            }
            Ok(_) => {}
            Err(e) => warn!("Target unreadable ({}), keeping {}", e, self.target),
        }

        // 2. Measurement
        let temp = match hw.read_temperature() {
            Ok(t) => t,
            Err(e) => {
                warn!("Can't read the temperature: {}", e);
                sink.emit(&AppEvent::SensorFailed(e));
                return Ok(TickOutcome::SensorFailed(e));
            }
        };

        // 3. Hysteresis → relay
        let command = decide_relay(temp, self.target, &self.thresholds);
        let relay_changed = match command {
            RelayCommand::On => hw.set_relay(true)?,
            RelayCommand::Off => hw.set_relay(false)?,
            RelayCommand::Hold => false,
        };

        // 4. Alert state
        let ctx = FsmContext::new(temp, self.target, command, relay_changed, self.thresholds);
        let change = self.fsm.tick(&ctx, now);
        if let Some(change) = change {
            sink.emit(&AppEvent::StateChanged(change));
        }

        let status = TickStatus {
            now,
            temp,
            target: self.target,
            relay_on: hw.relay_is_on(),
            relay_changed,
            state: self.fsm.current_state(),
        };
        sink.emit(&AppEvent::Status(status));

        // 5. History
        if let Err(e) = log.append_sample(now, temp, self.target.stored_value(), status.relay_on) {
            warn!("STORE | sample at {} not recorded: {}", now, e);
            sink.emit(&AppEvent::StoreFailed(e));
        }

        // 6. Throttled report
        let last_transition = self.fsm.last_transition();
        if self
            .throttle
            .should_report(status.state, change.is_some(), last_transition, now)
        {
            sink.emit(&AppEvent::ReportDue(ReportRequest::for_state(
                status.state,
                last_transition,
                self.alert_lookback_secs,
                &status,
            )));
        }

        Ok(TickOutcome::Regulated(status))
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> AlertState {
        self.fsm.current_state()
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn last_transition(&self) -> i64 {
        self.fsm.last_transition()
    }

    /// Total control ticks executed since startup, failed reads included.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
