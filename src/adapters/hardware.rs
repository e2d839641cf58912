//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the thermometer and the relay driver, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  Holding both in one value lets the
//! control tick borrow them together while the port boundary stays explicit.

use embedded_hal::digital::StatefulOutputPin;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::relay::Relay;
use crate::error::{ActuatorError, SensorError};

/// Concrete adapter that combines the control hardware behind port traits.
pub struct HardwareAdapter<S, P: StatefulOutputPin> {
    sensor: S,
    relay: Relay<P>,
}

impl<S: SensorPort, P: StatefulOutputPin> HardwareAdapter<S, P> {
    pub fn new(sensor: S, relay: Relay<P>) -> Self {
        Self { sensor, relay }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: SensorPort, P: StatefulOutputPin> SensorPort for HardwareAdapter<S, P> {
    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        self.sensor.read_temperature()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<S: SensorPort, P: StatefulOutputPin> ActuatorPort for HardwareAdapter<S, P> {
    fn set_relay(&mut self, on: bool) -> Result<bool, ActuatorError> {
        self.relay.set(on)
    }

    fn relay_is_on(&self) -> bool {
        self.relay.is_on()
    }
}
