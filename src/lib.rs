//! Fermenter controller library.
//!
//! Hysteresis relay control with throttled alerts over a fixed-rate
//! on-disk history.  The binary in `main.rs` wires these modules to the
//! Linux sysfs GPIO and 1-Wire interfaces; everything here is also usable
//! on a host with mock ports, which is how the integration tests drive it.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod runtime;
pub mod scheduler;
pub mod sensors;
pub mod store;
pub mod target;
pub mod throttle;
