//! Potentiometer position behind the MCP3008

use crate::error::Result;
use crate::gpio::AnalogInput;
use crate::types::round2;

/// Potentiometer reader reporting percent of full scale
pub struct PositionSensor {
    adc: Box<dyn AnalogInput>,
}

impl PositionSensor {
    pub fn new(adc: Box<dyn AnalogInput>) -> Self {
        Self { adc }
    }

    /// Read the position as a percentage in [0, 100]
    pub fn read(&mut self) -> Result<f64> {
        let ratio = self.adc.read_ratio()?;
        Ok(percent_from_ratio(ratio))
    }
}

/// Scale a normalized ADC ratio to a clamped two-decimal percentage
pub fn percent_from_ratio(ratio: f64) -> f64 {
    round2((ratio * 100.0).clamp(0.0, 100.0))
}
