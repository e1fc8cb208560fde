//! Hardware access seam
//!
//! Sensors and actuators talk to pins only through the small traits below,
//! which keeps the sampling and gesture logic independent of the physical
//! backend. [`pi`] wires the traits to the Raspberry Pi header through
//! rppal; [`mock`] provides scripted pins and a simulated rig for tests and
//! hardware-free runs.

pub mod pi;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

use crate::config::HardwareConfig;
use crate::error::{Error, Result};

/// Digital input line
pub trait DigitalInput: Send {
    /// Current electrical level, true = high
    fn is_high(&mut self) -> bool;
}

/// Digital output line
pub trait DigitalOutput: Send {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

/// PWM-capable output line
pub trait PwmOutput: Send {
    /// Drive the line at `frequency_hz` with `duty` in [0, 1]
    fn set(&mut self, frequency_hz: f64, duty: f64) -> Result<()>;

    /// Stop the PWM signal and leave the line low
    fn clear(&mut self) -> Result<()>;
}

/// Analog input channel
pub trait AnalogInput: Send {
    /// Normalized reading in [0, 1]
    fn read_ratio(&mut self) -> Result<f64>;
}

/// Every line the monitoring rig uses, ready to be handed to components
pub struct Rig {
    pub button: Box<dyn DigitalInput>,
    pub trigger: Box<dyn DigitalOutput>,
    pub echo: Box<dyn DigitalInput>,
    pub buzzer: Box<dyn PwmOutput>,
    pub red: Box<dyn PwmOutput>,
    pub green: Box<dyn PwmOutput>,
    pub blue: Box<dyn PwmOutput>,
    pub status_led: Box<dyn DigitalOutput>,
    pub adc: Box<dyn AnalogInput>,
}

/// Open the pin backend named by the configuration
pub fn open_rig(config: &HardwareConfig) -> Result<Rig> {
    match config.backend.as_str() {
        "gpio" => pi::open(config),
        #[cfg(any(test, feature = "mock"))]
        "mock" => Ok(mock::simulated_rig()),
        other => Err(Error::UnknownBackend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_is_rejected() {
        let config = HardwareConfig {
            backend: "i2c".to_string(),
            ..HardwareConfig::default()
        };
        match open_rig(&config) {
            Err(Error::UnknownBackend(name)) => assert_eq!(name, "i2c"),
            other => panic!("expected UnknownBackend, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_mock_backend_opens() {
        let config = HardwareConfig {
            backend: "mock".to_string(),
            ..HardwareConfig::default()
        };
        assert!(open_rig(&config).is_ok());
    }
}
