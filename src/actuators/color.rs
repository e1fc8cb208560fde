//! Position-to-color mapping for the RGB LED

use crate::constants::{LED_PWM_HZ, VIOLET_RATIO};
use crate::error::Result;
use crate::gpio::PwmOutput;

/// An RGB triple with channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    /// Truncated 8-bit channels for console and file reporting
    pub fn to_bytes(self) -> (u8, u8, u8) {
        (
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
        )
    }
}

/// Map a position percentage onto the red-to-violet sweep
///
/// The percentage is scaled by `VIOLET_RATIO` so full scale lands on
/// violet instead of wrapping back to red, then swept through six linear
/// segments: red, yellow, green, cyan, blue, violet.
pub fn color_for(percent: f64) -> Rgb {
    const SEGMENT: f64 = 100.0 / 6.0;
    let scaled = percent * VIOLET_RATIO;
    let step = |offset: f64| (scaled - offset) / SEGMENT;

    if scaled < SEGMENT {
        // Red to yellow: green rises
        Rgb {
            r: 1.0,
            g: step(0.0),
            b: 0.0,
        }
    } else if scaled < 2.0 * SEGMENT {
        // Yellow to green: red falls
        Rgb {
            r: 1.0 - step(SEGMENT),
            g: 1.0,
            b: 0.0,
        }
    } else if scaled < 3.0 * SEGMENT {
        // Green to cyan: blue rises
        Rgb {
            r: 0.0,
            g: 1.0,
            b: step(2.0 * SEGMENT),
        }
    } else if scaled < 4.0 * SEGMENT {
        // Cyan to blue: green falls
        Rgb {
            r: 0.0,
            g: 1.0 - step(3.0 * SEGMENT),
            b: 1.0,
        }
    } else if scaled < 5.0 * SEGMENT {
        // Blue to violet: red rises
        Rgb {
            r: step(4.0 * SEGMENT),
            g: 0.0,
            b: 1.0,
        }
    } else {
        // Violet onward: blue falls back toward red
        Rgb {
            r: 1.0,
            g: 0.0,
            b: (1.0 - step(5.0 * SEGMENT)).max(0.0),
        }
    }
}

/// RGB LED driver over three PWM channels
pub struct ColorActuator {
    red: Box<dyn PwmOutput>,
    green: Box<dyn PwmOutput>,
    blue: Box<dyn PwmOutput>,
}

impl ColorActuator {
    pub fn new(
        red: Box<dyn PwmOutput>,
        green: Box<dyn PwmOutput>,
        blue: Box<dyn PwmOutput>,
    ) -> Self {
        Self { red, green, blue }
    }

    /// Show the color for a position percentage, returning it for reporting
    pub fn apply(&mut self, percent: f64) -> Result<Rgb> {
        let rgb = color_for(percent);
        self.red.set(LED_PWM_HZ, rgb.r)?;
        self.green.set(LED_PWM_HZ, rgb.g)?;
        self.blue.set(LED_PWM_HZ, rgb.b)?;
        Ok(rgb)
    }

    /// Turn the LED off
    pub fn off(&mut self) -> Result<()> {
        self.red.clear()?;
        self.green.clear()?;
        self.blue.clear()
    }
}
