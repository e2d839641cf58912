//! Control loop runtime.
//!
//! Owns every long-lived resource of a running controller and drives the
//! application core from the scheduler:
//!
//! ```text
//!   ClockPort ─▶ Scheduler ─▶ EventQueue ─▶ run()
//!                                             │ ControlTick    ─▶ AppService::tick
//!                                             │ PeriodicReport ─▶ ReportRequest::periodic
//!                                             │ Shutdown       ─▶ return
//!   stop flag (Ctrl-C) ─────────▶ Shutdown
//! ```
//!
//! The relay, store writes and sensor reads happen only on the thread that
//! calls [`Runtime::run`].  Reports render on the report worker and the
//! heartbeat blinks on its own thread.
//!
//! Whatever way `run` ends (stop signal, actuator fault, panic unwinding),
//! dropping the runtime stops the heartbeat, drives the relay off, and then
//! lets the report worker drain its queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::report::{ReportDispatch, ReportWorker};
use crate::app::events::{AppEvent, ReportRequest};
use crate::app::ports::{ActuatorPort, ClockPort, EventSink, SchedulerDelegate, SensorPort, TargetPort};
use crate::app::service::{AppService, TickOutcome};
use crate::config::FermenterConfig;
use crate::drivers::heartbeat::Heartbeat;
use crate::error::Result;
use crate::events::{Event, EventQueue};
use crate::scheduler::{CONTROL_SCHEDULE, REPORT_SCHEDULE, Schedule, Scheduler};
use crate::store::SharedStore;
use crate::target::Target;

// ── Scheduler delegate ────────────────────────────────────────
//
// Translates schedule labels into loop events.

struct QueueDelegate<'a> {
    queue: &'a mut EventQueue,
}

impl SchedulerDelegate for QueueDelegate<'_> {
    fn on_schedule_fired(&mut self, label: &str) {
        let event = match label {
            CONTROL_SCHEDULE => Event::ControlTick,
            REPORT_SCHEDULE => Event::PeriodicReport,
            other => {
                warn!("Scheduler: unknown schedule '{}'", other);
                return;
            }
        };
        if !self.queue.push(event) {
            warn!("Event queue full, dropped {:?}", event);
        }
    }
}

// ── Event fan-out ─────────────────────────────────────────────

/// Every event is logged; report-worthy ones also go to the report worker.
pub struct RuntimeSink {
    log: LogEventSink,
    reports: Option<ReportDispatch>,
}

impl EventSink for RuntimeSink {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        if let Some(reports) = self.reports.as_mut() {
            reports.emit(event);
        }
    }
}

// ── Runtime ───────────────────────────────────────────────────

pub struct Runtime<H, T, C>
where
    H: SensorPort + ActuatorPort,
    T: TargetPort,
    C: ClockPort,
{
    config: FermenterConfig,
    app: AppService,
    hw: H,
    target: T,
    clock: C,
    store: SharedStore,
    queue: EventQueue,
    scheduler: Scheduler,
    sink: RuntimeSink,
    heartbeat: Option<Heartbeat>,
    reports: Option<ReportWorker>,
    stop: Arc<AtomicBool>,
}

impl<H, T, C> Runtime<H, T, C>
where
    H: SensorPort + ActuatorPort,
    T: TargetPort,
    C: ClockPort,
{
    pub fn new(config: FermenterConfig, hw: H, target: T, clock: C, store: SharedStore, initial_target: Target) -> Self {
        let now = clock.now_secs();
        let mut scheduler = Scheduler::new();
        for schedule in [
            Schedule {
                label: CONTROL_SCHEDULE,
                interval_secs: config.control_interval_secs,
                run_at_start: true,
            },
            Schedule {
                label: REPORT_SCHEDULE,
                interval_secs: config.report_interval_secs,
                run_at_start: false,
            },
        ] {
            if scheduler.add(schedule).is_none() {
                warn!("Scheduler full");
            }
        }

        Self {
            app: AppService::new(&config, now, initial_target),
            config,
            hw,
            target,
            clock,
            store,
            queue: EventQueue::new(),
            scheduler,
            sink: RuntimeSink {
                log: LogEventSink::new(),
                reports: None,
            },
            heartbeat: None,
            reports: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Hand the runtime its heartbeat; it is stopped before the relay is
    /// released.
    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// Route notifications and reports to this worker.
    pub fn with_reports(mut self, worker: ReportWorker) -> Self {
        self.sink.reports = Some(worker.dispatch());
        self.reports = Some(worker);
        self
    }

    /// Flag checked at every loop boundary; set it to stop [`run`](Self::run).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn app(&self) -> &AppService {
        &self.app
    }

    /// Run until stopped.  Returns `Err` only on an actuator fault.
    pub fn run(&mut self) -> Result<()> {
        self.app.start(&mut self.sink);
        info!("Runtime ready. Entering control loop.");

        loop {
            if self.stop.load(Ordering::SeqCst) {
                self.queue.push(Event::Shutdown);
            }

            let now = self.clock.now_secs();
            self.scheduler.tick(
                now,
                &mut QueueDelegate {
                    queue: &mut self.queue,
                },
            );

            let mut batch: heapless::Vec<Event, 8> = heapless::Vec::new();
            self.queue.drain(|e| {
                let _ = batch.push(e);
            });

            for event in batch {
                match event {
                    Event::Shutdown => {
                        info!("Stop requested, leaving control loop");
                        return Ok(());
                    }
                    Event::ControlTick => self.control_tick(now)?,
                    Event::PeriodicReport => {
                        let req = ReportRequest::periodic(now, self.config.report_window_secs);
                        self.sink.emit(&AppEvent::ReportDue(req));
                    }
                }
            }

            self.idle(now);
        }
    }

    fn control_tick(&mut self, now: i64) -> Result<()> {
        let mut store = self.store.clone();
        let outcome = self
            .app
            .tick(now, &mut self.hw, &mut self.target, &mut store, &mut self.sink)
            .inspect_err(|e| error!("Control tick aborted: {}", e))?;
        if let TickOutcome::SensorFailed(_) = outcome {
            thread::sleep(Duration::from_millis(self.config.sensor_retry_pause_ms));
        }
        Ok(())
    }

    /// Sleep until the next schedule is due, waking at least every
    /// `loop_poll_ms` to notice a stop request.
    fn idle(&self, now: i64) {
        let poll = Duration::from_millis(self.config.loop_poll_ms);
        let pause = match self.scheduler.secs_until_next(now) {
            Some(0) => return,
            Some(secs) => poll.min(Duration::from_secs(secs)),
            None => poll,
        };
        thread::sleep(pause);
    }

    /// Stop the heartbeat, release the relay, flush reports.  Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(mut heartbeat) = self.heartbeat.take() {
            heartbeat.stop();
        }
        match self.hw.set_relay(false) {
            Ok(true) => info!("Relay released on shutdown"),
            Ok(false) => {}
            Err(e) => error!("Relay could not be released: {}", e),
        }
        self.sink.reports = None;
        if let Some(mut reports) = self.reports.take() {
            reports.shutdown();
        }
    }
}

impl<H, T, C> Drop for Runtime<H, T, C>
where
    H: SensorPort + ActuatorPort,
    T: TargetPort,
    C: ClockPort,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
