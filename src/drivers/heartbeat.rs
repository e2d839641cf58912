//! Heartbeat LED.
//!
//! A named background thread toggles an output pin at a fixed period as a
//! liveness indicator.  The runtime owns the [`Heartbeat`] handle and stops
//! it before releasing the relay; stopping joins the thread and leaves the
//! LED dark.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::error::ActuatorError;

const STACK_KB: usize = 16;

pub struct Heartbeat {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// Spawn the blink thread.  The pin moves into the thread.
    pub fn start<P>(mut pin: P, interval: Duration) -> Result<Self, ActuatorError>
    where
        P: OutputPin + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        info!(
            "Spawning 'heartbeat' (period={}ms, stack={}KB)",
            interval.as_millis(),
            STACK_KB
        );

        let handle = thread::Builder::new()
            .name("heartbeat".into())
            .stack_size(STACK_KB * 1024)
            .spawn(move || {
                let mut lit = false;
                loop {
                    lit = !lit;
                    let res = if lit { pin.set_high() } else { pin.set_low() };
                    if res.is_err() {
                        warn!("Heartbeat: pin write failed, stopping");
                        break;
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                let _ = pin.set_low();
            })
            .map_err(|_| ActuatorError::GpioSetupFailed)?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop blinking and wait for the thread.  Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Heartbeat: thread panicked");
            }
            info!("Heartbeat stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}
