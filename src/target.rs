//! Operator target temperature: a bounded value in °F, or off.

use core::fmt;
use core::str::FromStr;

use crate::error::TargetError;

pub const MIN_TARGET_F: f64 = 45.0;
pub const MAX_TARGET_F: f64 = 80.0;

/// Stored in place of a target while the controller is off.
pub const DISABLED_MARKER: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Regulate to this temperature (°F).
    Value(f64),
    /// Controller disabled: relay held off.
    Off,
}

impl Target {
    /// Bounds-checked constructor.
    pub fn value(f: f64) -> Result<Self, TargetError> {
        if f.is_finite() && (MIN_TARGET_F..=MAX_TARGET_F).contains(&f) {
            Ok(Self::Value(f))
        } else {
            Err(TargetError::OutOfRange)
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Off => None,
        }
    }

    /// Value written to the history for this target.
    pub fn stored_value(&self) -> f64 {
        self.as_value().unwrap_or(DISABLED_MARKER)
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("off") {
            return Ok(Self::Off);
        }
        let v: f64 = s.parse().map_err(|_| TargetError::Malformed)?;
        Self::value(v)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{}` on f64 prints 70 for 70.0 and 68.5 for 68.5
            Self::Value(v) => write!(f, "{v}F"),
            Self::Off => write!(f, "off"),
        }
    }
}
