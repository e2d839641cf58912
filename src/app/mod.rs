//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the control rules for the fermenter: target
//! polling, hysteresis, alert state, history recording, and report
//! throttling.  All interaction with hardware and files happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
