//! DS18B20 1-Wire thermometer via the Linux `w1-therm` driver.
//!
//! The kernel exposes each probe as `<w1 dir>/28-xxxxxxxxxxxx/w1_slave`:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! The first line ends in `YES` once the CRC checked out; the second carries
//! the temperature in millidegrees Celsius.  A read polls until `YES` shows
//! up, bounded by [`CRC_RETRIES`].

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::app::ports::SensorPort;
use crate::error::SensorError;

/// Family code prefix of DS18B20 device directories.
const FAMILY_PREFIX: &str = "28";
const SLAVE_FILE: &str = "w1_slave";
const CRC_RETRIES: u32 = 10;
const CRC_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Datasheet operating range.
const MIN_C: f64 = -55.0;
const MAX_C: f64 = 125.0;

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Parse `w1_slave` contents into °C.  `Ok(None)` means the CRC line has
/// not reported `YES` yet.
pub fn parse_w1_slave(text: &str) -> Result<Option<f64>, SensorError> {
    let mut lines = text.lines();
    let crc_line = lines.next().ok_or(SensorError::Malformed)?;
    if !crc_line.trim_end().ends_with("YES") {
        return Ok(None);
    }
    let data_line = lines.next().ok_or(SensorError::Malformed)?;
    let raw = data_line
        .split_once("t=")
        .map(|(_, t)| t.trim())
        .ok_or(SensorError::Malformed)?;
    let milli: i64 = raw.parse().map_err(|_| SensorError::Malformed)?;
    let celsius = milli as f64 / 1000.0;
    if !(MIN_C..=MAX_C).contains(&celsius) {
        return Err(SensorError::OutOfRange);
    }
    Ok(Some(celsius))
}

pub struct Ds18b20 {
    slave_path: PathBuf,
    retries: u32,
    retry_delay: Duration,
}

impl Ds18b20 {
    /// Use the first DS18B20 found under `w1_dir`.
    pub fn discover(w1_dir: &Path) -> Result<Self, SensorError> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(w1_dir)
            .map_err(|e| SensorError::Io(e.kind()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FAMILY_PREFIX))
            })
            .collect();
        candidates.sort();
        let device = candidates.into_iter().next().ok_or(SensorError::DeviceNotFound)?;
        info!("DS18B20 found at {}", device.display());
        Ok(Self::at(device.join(SLAVE_FILE)))
    }

    /// Read from an explicit `w1_slave` path.
    pub fn at(slave_path: PathBuf) -> Self {
        Self {
            slave_path,
            retries: CRC_RETRIES,
            retry_delay: CRC_RETRY_DELAY,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn read_celsius(&self) -> Result<f64, SensorError> {
        for attempt in 0..=self.retries {
            let text = fs::read_to_string(&self.slave_path).map_err(|e| SensorError::Io(e.kind()))?;
            if let Some(c) = parse_w1_slave(&text)? {
                return Ok(c);
            }
            debug!("DS18B20: CRC not ready (attempt {})", attempt + 1);
            if attempt < self.retries {
                thread::sleep(self.retry_delay);
            }
        }
        Err(SensorError::NotReady)
    }
}

impl SensorPort for Ds18b20 {
    fn read_temperature(&mut self) -> Result<f64, SensorError> {
        self.read_celsius().map(celsius_to_fahrenheit)
    }
}
