//! Sensor drivers

pub mod position;
pub mod range;
