//! Temperature sensing.

pub mod ds18b20;
