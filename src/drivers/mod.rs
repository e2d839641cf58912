//! Output drivers: the cooling relay, the heartbeat LED, and the sysfs
//! GPIO pin they sit on.

pub mod gpio;
pub mod heartbeat;
pub mod relay;
