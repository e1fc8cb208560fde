//! Distance-to-tone mapping for the piezo buzzer

use crate::constants::{
    BEEP_INTERVAL, BUZZER_DUTY, MAX_DISTANCE_CM, MAX_FREQ_HZ, MIN_DISTANCE_CM, MIN_FREQ_HZ,
};
use crate::error::Result;
use crate::gpio::PwmOutput;
use std::time::Instant;

/// Buzzer frequency for a distance, `None` when silent
///
/// Linear from `MAX_FREQ_HZ` at `MIN_DISTANCE_CM` down to `MIN_FREQ_HZ` at
/// `MAX_DISTANCE_CM`. Closer than the minimum pegs at the maximum
/// frequency; the actuator beeps there instead of holding the tone.
pub fn frequency_for(distance_cm: f64) -> Option<f64> {
    if distance_cm > MAX_DISTANCE_CM {
        return None;
    }
    if distance_cm < MIN_DISTANCE_CM {
        return Some(MAX_FREQ_HZ);
    }
    let span = MAX_DISTANCE_CM - MIN_DISTANCE_CM;
    Some(MIN_FREQ_HZ + (MAX_DISTANCE_CM - distance_cm) * (MAX_FREQ_HZ - MIN_FREQ_HZ) / span)
}

/// Buzzer driver carrying the close-range beep phase
pub struct ToneActuator {
    pin: Box<dyn PwmOutput>,
    beep_since: Option<Instant>,
}

impl ToneActuator {
    pub fn new(pin: Box<dyn PwmOutput>) -> Self {
        Self {
            pin,
            beep_since: None,
        }
    }

    /// Drive the buzzer for a fresh distance reading
    ///
    /// Returns the mapped frequency for reporting, `None` when silent.
    pub fn apply(&mut self, distance_cm: f64, now: Instant) -> Result<Option<f64>> {
        let Some(freq) = frequency_for(distance_cm) else {
            self.silence()?;
            return Ok(None);
        };
        if distance_cm < MIN_DISTANCE_CM {
            // Intermittent warning beep; the phase runs on its own clock so
            // the cadence stays steady regardless of sampling jitter
            let since = *self.beep_since.get_or_insert(now);
            let phase = now.duration_since(since).as_millis() / BEEP_INTERVAL.as_millis();
            if phase % 2 == 0 {
                self.pin.set(freq, BUZZER_DUTY)?;
            } else {
                self.pin.clear()?;
            }
        } else {
            self.beep_since = None;
            self.pin.set(freq, BUZZER_DUTY)?;
        }
        Ok(Some(freq))
    }

    /// Stop the buzzer and reset the beep phase
    pub fn silence(&mut self) -> Result<()> {
        self.beep_since = None;
        self.pin.clear()
    }
}
