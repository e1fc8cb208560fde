//! Ultrasonic range sensor
//!
//! Classic trigger/echo timing: a 10 us pulse on the trigger line starts an
//! ultrasonic burst, the echo line goes high while the burst is in flight,
//! and the high time divided by the calibration constant gives the
//! distance. The busy-waits are bounded and re-check a cancellation
//! predicate on every spin, so a mode change or shutdown aborts a
//! measurement within microseconds and a stuck sensor cannot hang the
//! sample loop.

use crate::config::SamplingConfig;
use crate::constants::TRIGGER_PULSE;
use crate::gpio::{DigitalInput, DigitalOutput};
use crate::types::round2;
use std::hint;
use std::time::{Duration, Instant};

/// Outcome of one pulse-echo measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Echo {
    /// Round trip measured, distance in centimetres
    Distance(f64),
    /// Cancelled mid-measurement (mode change or shutdown)
    Interrupted,
    /// The echo line never answered within the deadline
    TimedOut,
}

/// HC-SR04 style sensor on a trigger/echo pin pair
pub struct RangeSensor {
    trigger: Box<dyn DigitalOutput>,
    echo: Box<dyn DigitalInput>,
    us_per_cm: f64,
    timeout: Duration,
}

impl RangeSensor {
    pub fn new(
        trigger: Box<dyn DigitalOutput>,
        echo: Box<dyn DigitalInput>,
        config: &SamplingConfig,
    ) -> Self {
        Self {
            trigger,
            echo,
            us_per_cm: config.us_per_cm,
            timeout: config.echo_timeout(),
        }
    }

    /// Fire one measurement
    ///
    /// `cancelled` is checked on every spin of the echo busy-waits. Each
    /// echo edge gets the configured timeout before the sensor is declared
    /// unresponsive.
    pub fn measure(&mut self, cancelled: &dyn Fn() -> bool) -> Echo {
        if cancelled() {
            return Echo::Interrupted;
        }

        // 10 us trigger pulse starts the burst
        self.trigger.set_high();
        let pulse_start = Instant::now();
        while pulse_start.elapsed() < TRIGGER_PULSE {
            hint::spin_loop();
        }
        self.trigger.set_low();

        // Echo rises when the burst leaves and falls when it returns
        let rise = match self.wait_for_level(true, cancelled) {
            Ok(at) => at,
            Err(outcome) => return outcome,
        };
        let fall = match self.wait_for_level(false, cancelled) {
            Ok(at) => at,
            Err(outcome) => return outcome,
        };

        Echo::Distance(distance_from_pulse(
            fall.duration_since(rise),
            self.us_per_cm,
        ))
    }

    /// Spin until the echo line reaches `level`; the deadline or the
    /// cancellation predicate break the wait
    fn wait_for_level(
        &mut self,
        level: bool,
        cancelled: &dyn Fn() -> bool,
    ) -> std::result::Result<Instant, Echo> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if cancelled() {
                return Err(Echo::Interrupted);
            }
            if self.echo.is_high() == level {
                return Ok(Instant::now());
            }
            if Instant::now() >= deadline {
                return Err(Echo::TimedOut);
            }
            hint::spin_loop();
        }
    }
}

/// Convert an echo pulse width to centimetres, rounded to two decimals
pub fn distance_from_pulse(pulse: Duration, us_per_cm: f64) -> f64 {
    round2(pulse.as_secs_f64() * 1e6 / us_per_cm)
}
