//! Fixed-point sample rows.
//!
//! Temperatures and targets are stored as centi-degrees (`round(100 * v)`),
//! three little-endian `i32` columns per row.  A target of `0` marks a slot
//! that was never written; `-100` marks a sample taken while the controller
//! was switched off.

/// Seconds covered by one slot.
pub const SLOT_SECS: u64 = 60;

/// Bytes per on-disk row: temp, target, relay.
pub const ROW_BYTES: usize = 12;

/// Target value of a slot that was never written.
pub const TARGET_UNWRITTEN: i32 = 0;

/// Target value recorded while the controller is disabled (-1.00 °F).
pub const TARGET_DISABLED: i32 = -100;

/// Convert a physical value to centi-units, rounding half away from zero.
pub fn quantize(value: f64) -> i32 {
    (value * 100.0).round() as i32
}

pub fn dequantize(centi: i32) -> f64 {
    f64::from(centi) / 100.0
}

/// One slot of a partition, in its stored fixed-point form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Slot index within the partition.
    pub minute_index: u32,
    pub temp_centi: i32,
    pub target_centi: i32,
    pub relay_on: bool,
}

impl Sample {
    pub fn new(minute_index: u32, temp: f64, target: f64, relay_on: bool) -> Self {
        Self {
            minute_index,
            temp_centi: quantize(temp),
            target_centi: quantize(target),
            relay_on,
        }
    }

    /// A padding slot at `minute_index`.
    pub fn unwritten(minute_index: u32) -> Self {
        Self {
            minute_index,
            temp_centi: 0,
            target_centi: TARGET_UNWRITTEN,
            relay_on: false,
        }
    }

    pub fn is_unwritten(&self) -> bool {
        self.target_centi == TARGET_UNWRITTEN
    }

    pub fn to_row(&self) -> [u8; ROW_BYTES] {
        let mut row = [0u8; ROW_BYTES];
        row[0..4].copy_from_slice(&self.temp_centi.to_le_bytes());
        row[4..8].copy_from_slice(&self.target_centi.to_le_bytes());
        row[8..12].copy_from_slice(&i32::from(self.relay_on).to_le_bytes());
        row
    }

    /// Decode a row.  `row` must be exactly [`ROW_BYTES`] long.
    pub fn from_row(minute_index: u32, row: &[u8]) -> Option<Self> {
        if row.len() != ROW_BYTES {
            return None;
        }
        let col = |i: usize| i32::from_le_bytes([row[i], row[i + 1], row[i + 2], row[i + 3]]);
        Some(Self {
            minute_index,
            temp_centi: col(0),
            target_centi: col(4),
            relay_on: col(8) != 0,
        })
    }
}

/// A dequantized sample with its absolute timestamp, as returned by queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    /// Start of the slot, in seconds since the epoch.
    pub timestamp: i64,
    pub temp: f64,
    pub target: f64,
    pub relay_on: bool,
}

impl Record {
    pub(crate) fn from_sample(timestamp: i64, sample: &Sample) -> Self {
        Self {
            timestamp,
            temp: dequantize(sample.temp_centi),
            target: dequantize(sample.target_centi),
            relay_on: sample.relay_on,
        }
    }

    /// Slot was never written.
    pub fn is_padding(&self) -> bool {
        quantize(self.target) == TARGET_UNWRITTEN
    }

    /// Sample was taken with the controller switched off.
    pub fn is_disabled(&self) -> bool {
        quantize(self.target) == TARGET_DISABLED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_rounds_half_away_from_zero() {
        assert_eq!(quantize(70.005), 7001);
        assert_eq!(quantize(-0.005), -1);
        assert_eq!(quantize(72.0), 7200);
        assert_eq!(quantize(-1.0), TARGET_DISABLED);
    }

    #[test]
    fn dequantize_divides_by_hundred() {
        assert!((dequantize(7125) - 71.25).abs() < f64::EPSILON);
        assert!((dequantize(-100) + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn row_layout_is_little_endian_columns() {
        let s = Sample::new(3, 72.5, 70.0, true);
        let row = s.to_row();
        assert_eq!(&row[0..4], &7250i32.to_le_bytes());
        assert_eq!(&row[4..8], &7000i32.to_le_bytes());
        assert_eq!(&row[8..12], &1i32.to_le_bytes());
        assert_eq!(Sample::from_row(3, &row), Some(s));
    }

    #[test]
    fn zeroed_row_is_unwritten() {
        let s = Sample::from_row(0, &[0u8; ROW_BYTES]).unwrap();
        assert!(s.is_unwritten());
        assert_eq!(s, Sample::unwritten(0));
    }

    #[test]
    fn short_row_is_rejected() {
        assert!(Sample::from_row(0, &[0u8; 8]).is_none());
    }

    #[test]
    fn record_flags() {
        let padding = Record::from_sample(0, &Sample::unwritten(0));
        assert!(padding.is_padding());
        assert!(!padding.is_disabled());

        let off = Record::from_sample(60, &Sample::new(1, 65.0, -1.0, false));
        assert!(off.is_disabled());
        assert!(!off.is_padding());
    }
}
