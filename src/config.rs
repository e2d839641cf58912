//! Controller configuration parameters
//!
//! All tunable parameters for the fermenter.  Values are loaded from a JSON
//! file through [`ConfigPort`](crate::app::ports::ConfigPort); any field
//! missing from the file takes its default.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::store::{DEFAULT_SECONDS_PER_PARTITION, SLOT_SECS};

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FermenterConfig {
    // --- History ---
    /// Directory holding the series store
    pub store_path: PathBuf,
    /// Partition width for newly created stores (seconds)
    pub seconds_per_partition: u64,

    // --- Operator input ---
    /// File the target temperature is polled from
    pub target_path: PathBuf,

    // --- Hysteresis (°F relative to target) ---
    /// Relay turns on above target + this
    pub relay_on_offset_f: f64,
    /// Relay turns off below target - this
    pub relay_off_offset_f: f64,
    /// HighTemp alert above target + this with the relay already on
    pub high_alert_offset_f: f64,
    /// LowTemp alert below target - this with the relay already off
    pub low_alert_offset_f: f64,

    // --- Timing ---
    /// Control tick period (seconds)
    pub control_interval_secs: u64,
    /// Periodic report period (seconds)
    pub report_interval_secs: u64,
    /// Trailing window covered by the periodic report (seconds)
    pub report_window_secs: u64,
    /// History shown before a transition in alert reports (seconds)
    pub alert_lookback_secs: u64,
    /// Heartbeat LED toggle period (milliseconds)
    pub heartbeat_interval_ms: u64,
    /// Pause after a failed sensor read (milliseconds)
    pub sensor_retry_pause_ms: u64,
    /// Main loop poll period (milliseconds)
    pub loop_poll_ms: u64,

    // --- Hardware ---
    /// sysfs GPIO root
    pub gpio_root: PathBuf,
    /// Relay output pin
    pub relay_pin: u32,
    /// Heartbeat LED pin, if fitted
    pub led_pin: Option<u32>,
    /// 1-Wire device directory
    pub w1_devices_dir: PathBuf,

    // --- Reports ---
    /// Directory reports are written to for the mailer
    pub outbox_dir: PathBuf,
}

impl Default for FermenterConfig {
    fn default() -> Self {
        Self {
            // History
            store_path: PathBuf::from("fermenter-history"),
            seconds_per_partition: DEFAULT_SECONDS_PER_PARTITION, // 100 days

            // Operator input
            target_path: PathBuf::from(".target_temp"),

            // Hysteresis
            relay_on_offset_f: 1.0,
            relay_off_offset_f: 0.25,
            high_alert_offset_f: 2.0,
            low_alert_offset_f: 2.0,

            // Timing
            control_interval_secs: 60,
            report_interval_secs: 12 * 3600,
            report_window_secs: 12 * 3600,
            alert_lookback_secs: 12 * 3600,
            heartbeat_interval_ms: 1000, // 1 Hz
            sensor_retry_pause_ms: 2000,
            loop_poll_ms: 1000,

            // Hardware
            gpio_root: PathBuf::from("/sys/class/gpio"),
            relay_pin: 17,
            led_pin: Some(18),
            w1_devices_dir: PathBuf::from("/sys/bus/w1/devices"),

            // Reports
            outbox_dir: PathBuf::from("outbox"),
        }
    }
}

impl FermenterConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let offsets = [
            self.relay_on_offset_f,
            self.relay_off_offset_f,
            self.high_alert_offset_f,
            self.low_alert_offset_f,
        ];
        if offsets.iter().any(|o| !o.is_finite() || *o < 0.0 || *o > 20.0) {
            return Err(ConfigError::ValidationFailed("hysteresis offsets must be in [0, 20] F"));
        }
        if self.high_alert_offset_f < self.relay_on_offset_f {
            return Err(ConfigError::ValidationFailed(
                "high alert offset must not be below the relay-on offset",
            ));
        }
        if self.low_alert_offset_f < self.relay_off_offset_f {
            return Err(ConfigError::ValidationFailed(
                "low alert offset must not be below the relay-off offset",
            ));
        }
        if self.seconds_per_partition == 0 || self.seconds_per_partition % SLOT_SECS != 0 {
            return Err(ConfigError::ValidationFailed(
                "seconds_per_partition must be a positive multiple of 60",
            ));
        }
        if self.seconds_per_partition / SLOT_SECS > u64::from(u32::MAX) {
            return Err(ConfigError::ValidationFailed("seconds_per_partition too large"));
        }
        if self.control_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("control_interval_secs must be > 0"));
        }
        if self.report_interval_secs == 0 || self.report_window_secs == 0 {
            return Err(ConfigError::ValidationFailed("report interval and window must be > 0"));
        }
        if self.heartbeat_interval_ms == 0 || self.loop_poll_ms == 0 {
            return Err(ConfigError::ValidationFailed("heartbeat and poll periods must be > 0"));
        }
        if self.loop_poll_ms > self.control_interval_secs * 1000 {
            return Err(ConfigError::ValidationFailed(
                "loop_poll_ms must not exceed the control interval",
            ));
        }
        if self.led_pin == Some(self.relay_pin) {
            return Err(ConfigError::ValidationFailed("LED and relay share a pin"));
        }
        Ok(())
    }
}
