//! Cooling relay driver.
//!
//! Edge-detecting on/off control over any [`StatefulOutputPin`].  `set`
//! reports whether the output actually changed, which is how the control
//! loop tells "just switched on" from "already on".
//!
//! ## Safety contract
//!
//! The relay is driven off when the driver is dropped.  The runtime also
//! drives it off explicitly on shutdown; the drop is the last line for
//! every other exit path.

use embedded_hal::digital::StatefulOutputPin;
use log::{error, info};

use crate::error::ActuatorError;

pub struct Relay<P: StatefulOutputPin> {
    pin: P,
    on: bool,
}

impl<P: StatefulOutputPin> Relay<P> {
    /// Take the pin and drive it off.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_low().map_err(|_| ActuatorError::GpioSetupFailed)?;
        Ok(Self { pin, on: false })
    }

    /// Drive the relay.  Returns `true` only on a genuine transition.
    pub fn set(&mut self, on: bool) -> Result<bool, ActuatorError> {
        let was_on = self
            .pin
            .is_set_high()
            .map_err(|_| ActuatorError::GpioReadFailed)?;
        if was_on == on {
            self.on = on;
            return Ok(false);
        }
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        info!("Relay {}", if on { "ON" } else { "OFF" });
        Ok(true)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl<P: StatefulOutputPin> Drop for Relay<P> {
    fn drop(&mut self) {
        if self.pin.set_low().is_err() {
            error!("Relay: failed to drive off on drop");
        }
    }
}
