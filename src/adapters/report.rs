//! Report pipeline.
//!
//! Reports leave the control loop through a channel and are rendered and
//! sent on a dedicated worker thread, so a slow mailer or renderer never
//! stalls a control tick.
//!
//! ```text
//!  AppService ──AppEvent──▶ ReportDispatch ──ReportJob──▶ ReportWorker
//!                                                          │ lock store, read range
//!                                                          │ Renderer
//!                                                          ▼
//!                                                         ReportSink
//! ```
//!
//! Failures inside the worker are logged and the job dropped; the control
//! loop never sees them.  The queue holds at most [`QUEUE_DEPTH`] jobs; while
//! it is full (stalled outbox or mailer) new jobs are dropped with a warning
//! instead of blocking the control tick.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::app::events::{AppEvent, DEFAULT_SUBJECT, ReportRequest};
use crate::app::ports::{EventSink, Renderer, ReportSink};
use crate::error::{ReportError, Result, StoreError};
use crate::store::{Record, SharedStore};

const STACK_KB: usize = 64;

/// Jobs waiting for the worker before new ones are dropped.
pub const QUEUE_DEPTH: usize = 16;

/// Work items for the report thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportJob {
    /// Plain text notification, no attachment.
    Message { subject: String, body: String },
    /// Read the window from the store, render, and send.
    Graph(ReportRequest),
    /// Finish queued jobs, then exit.
    Shutdown,
}

// ───────────────────────────────────────────────────────────────
// One-shot delivery
// ───────────────────────────────────────────────────────────────

/// Written samples inside the request window.  A window lying entirely
/// after the latest sample is empty rather than an error.
pub fn collect_window(store: &SharedStore, req: &ReportRequest) -> core::result::Result<Vec<Record>, StoreError> {
    let mut guard = store.lock();
    let records = match guard.range(Some(req.window_start), req.window_end, 1) {
        Ok(r) => r,
        Err(StoreError::InvalidRange | StoreError::NotFound) => Vec::new(),
        Err(e) => return Err(e),
    };
    drop(guard);
    Ok(records.into_iter().filter(|r| !r.is_padding()).collect())
}

/// Render the request's window and hand it to the sink.
pub fn deliver_report(
    store: &SharedStore,
    renderer: &impl Renderer,
    sink: &mut impl ReportSink,
    req: &ReportRequest,
) -> Result<()> {
    let records = collect_window(store, req)?;
    let attachment = renderer.render(&records, &req.title, &req.markers)?;
    sink.send(&req.subject, &req.message, Some(&attachment))?;
    info!("REPORT | sent '{}' ({} samples)", req.subject, records.len());
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Worker thread
// ───────────────────────────────────────────────────────────────

pub struct ReportWorker {
    tx: SyncSender<ReportJob>,
    handle: Option<JoinHandle<()>>,
}

impl ReportWorker {
    /// Spawn the worker.  Renderer and sink move into the thread.
    pub fn start<R, S>(store: SharedStore, renderer: R, sink: S) -> core::result::Result<Self, ReportError>
    where
        R: Renderer + Send + 'static,
        S: ReportSink + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<ReportJob>(QUEUE_DEPTH);
        info!("Spawning 'reports' (stack={}KB)", STACK_KB);
        let handle = thread::Builder::new()
            .name("reports".into())
            .stack_size(STACK_KB * 1024)
            .spawn(move || run_worker(&rx, &store, &renderer, sink))
            .map_err(ReportError::from)?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Queue a job without blocking.
    pub fn submit(&self, job: ReportJob) -> core::result::Result<(), ReportError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => ReportError::QueueFull,
            TrySendError::Disconnected(_) => ReportError::WorkerGone,
        })
    }

    /// An [`EventSink`] that forwards report-worthy events to this worker.
    pub fn dispatch(&self) -> ReportDispatch {
        ReportDispatch { tx: self.tx.clone() }
    }

    /// Drain queued jobs and join the thread.  Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Blocks only until the worker frees a queue slot.
            let _ = self.tx.send(ReportJob::Shutdown);
            if handle.join().is_err() {
                warn!("REPORT | worker panicked");
            }
            info!("Report worker stopped");
        }
    }
}

impl Drop for ReportWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<R: Renderer, S: ReportSink>(rx: &Receiver<ReportJob>, store: &SharedStore, renderer: &R, mut sink: S) {
    // Ends on Shutdown or once every sender is gone.
    while let Ok(job) = rx.recv() {
        match job {
            ReportJob::Message { subject, body } => {
                if let Err(e) = sink.send(&subject, &body, None) {
                    warn!("REPORT | '{}' not sent: {}", subject, e);
                }
            }
            ReportJob::Graph(req) => {
                if let Err(e) = deliver_report(store, renderer, &mut sink, &req) {
                    warn!("REPORT | '{}' not sent: {}", req.subject, e);
                }
            }
            ReportJob::Shutdown => break,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event → job mapping
// ───────────────────────────────────────────────────────────────

/// Event sink side of the pipeline.  Never blocks.
#[derive(Clone)]
pub struct ReportDispatch {
    tx: SyncSender<ReportJob>,
}

fn describe(job: &ReportJob) -> &str {
    match job {
        ReportJob::Message { body, .. } => body.as_str(),
        ReportJob::Graph(req) => req.subject.as_str(),
        ReportJob::Shutdown => "shutdown",
    }
}

/// The job an event turns into, if any.
pub fn job_for(event: &AppEvent) -> Option<ReportJob> {
    let message = |body: String| ReportJob::Message {
        subject: DEFAULT_SUBJECT.to_string(),
        body,
    };
    match event {
        AppEvent::Started { target } => Some(message(format!("Starting fermenter at {target}"))),
        AppEvent::TargetChanged { from, to } => Some(message(format!("Changing temperature from {from} to {to}"))),
        AppEvent::SensorFailed(_) => Some(message("can't read the temperature".to_string())),
        AppEvent::ReportDue(req) => Some(ReportJob::Graph(req.clone())),
        AppEvent::StateChanged(_) | AppEvent::Status(_) | AppEvent::StoreFailed(_) => None,
    }
}

impl EventSink for ReportDispatch {
    fn emit(&mut self, event: &AppEvent) {
        let Some(job) = job_for(event) else {
            return;
        };
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => warn!("REPORT | queue full, dropping {}", describe(&job)),
            Err(TrySendError::Disconnected(_)) => warn!("REPORT | worker gone, dropping notification"),
        }
    }
}
