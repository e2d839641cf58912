//! Linux sysfs GPIO output pin.
//!
//! Exposes a pin under `<root>/gpio<N>/` as an [`embedded_hal`] output so
//! the relay and heartbeat drivers stay generic over the pin type.  The pin
//! is exported and configured as an output on open; the value file is
//! written on every set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin, StatefulOutputPin};
use log::{debug, info};

/// Export can lag udev setting permissions on the new directory.
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub io::ErrorKind);

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sysfs GPIO I/O error ({})", self.0)
    }
}

impl std::error::Error for GpioError {}

impl digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl From<io::Error> for GpioError {
    fn from(e: io::Error) -> Self {
        Self(e.kind())
    }
}

pub struct SysfsPin {
    number: u32,
    value_path: PathBuf,
    high: bool,
}

impl SysfsPin {
    /// Export `number` under `root` (if needed), make it an output, and
    /// drive it low.
    pub fn open(root: &Path, number: u32) -> Result<Self, GpioError> {
        let dir = root.join(format!("gpio{number}"));
        if !dir.exists() {
            fs::write(root.join("export"), number.to_string())?;
            thread::sleep(EXPORT_SETTLE);
            info!("GPIO{} exported", number);
        }
        fs::write(dir.join("direction"), "out")?;

        let mut pin = Self {
            number,
            value_path: dir.join("value"),
            high: false,
        };
        pin.write(false)?;
        debug!("GPIO{} ready as output", number);
        Ok(pin)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        fs::write(&self.value_path, if high { "1" } else { "0" })?;
        self.high = high;
        Ok(())
    }
}

impl ErrorType for SysfsPin {
    type Error = GpioError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

impl StatefulOutputPin for SysfsPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}
