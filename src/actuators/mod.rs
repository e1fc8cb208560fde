//! Actuator drivers

pub mod color;
pub mod status_led;
pub mod tone;
