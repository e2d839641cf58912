//! Fuzz target: DS18B20 `w1_slave` parser
//!
//! The kernel driver's output is read verbatim from sysfs; a flaky bus can
//! produce truncated or garbled text.  Checks:
//! - No panics on any UTF-8 input
//! - Every accepted reading lies in the sensor's rated range
//!
//! cargo fuzz run fuzz_w1_slave

#![no_main]

use fermenter::sensors::ds18b20::parse_w1_slave;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(Some(celsius)) = parse_w1_slave(text) {
        assert!((-55.0..=125.0).contains(&celsius));
    }
});
