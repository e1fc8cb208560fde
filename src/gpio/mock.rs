//! Scripted pins and a simulated rig
//!
//! The scripted pins let tests flip input levels and inspect output
//! history. [`simulated_rig`] assembles a full hardware-free rig for
//! `backend = "mock"` runs: the ultrasonic pair answers trigger pulses
//! with a timed echo and the potentiometer wanders around mid-scale. The
//! simulated button stays unpressed, so such runs stay in monitor mode.

use super::{AnalogInput, DigitalInput, DigitalOutput, PwmOutput, Rig};
use crate::error::Result;
use parking_lot::Mutex;
use rand::prelude::*;
use rand::rngs::SmallRng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Input line whose level tests can flip at any time
#[derive(Clone)]
pub struct SharedLevel {
    high: Arc<Mutex<bool>>,
}

impl SharedLevel {
    pub fn new(high: bool) -> Self {
        Self {
            high: Arc::new(Mutex::new(high)),
        }
    }

    pub fn set_high(&self, high: bool) {
        *self.high.lock() = high;
    }
}

impl DigitalInput for SharedLevel {
    fn is_high(&mut self) -> bool {
        *self.high.lock()
    }
}

/// Output line remembering its level and transition count
#[derive(Clone, Default)]
pub struct RecordedLine {
    inner: Arc<Mutex<LineState>>,
}

#[derive(Default)]
struct LineState {
    high: bool,
    transitions: u64,
}

impl RecordedLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.inner.lock().high
    }

    pub fn transitions(&self) -> u64 {
        self.inner.lock().transitions
    }

    fn write(&self, high: bool) {
        let mut state = self.inner.lock();
        if state.high != high {
            state.high = high;
            state.transitions += 1;
        }
    }
}

impl DigitalOutput for RecordedLine {
    fn set_high(&mut self) {
        self.write(true);
    }

    fn set_low(&mut self) {
        self.write(false);
    }
}

/// One observed PWM command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PwmEvent {
    /// set(frequency_hz, duty)
    Set(f64, f64),
    /// clear()
    Cleared,
}

/// PWM line remembering every set and clear
#[derive(Clone, Default)]
pub struct RecordedPwm {
    events: Arc<Mutex<Vec<PwmEvent>>>,
}

impl RecordedPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<PwmEvent> {
        self.events.lock().last().copied()
    }

    pub fn history(&self) -> Vec<PwmEvent> {
        self.events.lock().clone()
    }
}

impl PwmOutput for RecordedPwm {
    fn set(&mut self, frequency_hz: f64, duty: f64) -> Result<()> {
        self.events.lock().push(PwmEvent::Set(frequency_hz, duty));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.events.lock().push(PwmEvent::Cleared);
        Ok(())
    }
}

/// Analog channel returning a settable ratio
#[derive(Clone)]
pub struct SharedRatio {
    ratio: Arc<Mutex<f64>>,
}

impl SharedRatio {
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio: Arc::new(Mutex::new(ratio)),
        }
    }

    pub fn set(&self, ratio: f64) {
        *self.ratio.lock() = ratio;
    }
}

impl AnalogInput for SharedRatio {
    fn read_ratio(&mut self) -> Result<f64> {
        Ok(*self.ratio.lock())
    }
}

/// Trigger/echo pair behaving like an ultrasonic sensor
///
/// A falling edge on the trigger arms the echo line: after a short sonic
/// delay it reads high for the round-trip time of the next distance the
/// source yields. A non-positive distance leaves the line silent, which is
/// how tests provoke the timeout path.
pub struct PulseEcho {
    inner: Arc<Mutex<PulseState>>,
}

struct PulseState {
    trigger_high: bool,
    armed_at: Option<Instant>,
    pulse: Duration,
    us_per_cm: f64,
    next_distance: Box<dyn FnMut() -> f64 + Send>,
}

/// Lag between the trigger pulse and the echo line rising
const ECHO_DELAY: Duration = Duration::from_micros(200);

impl PulseEcho {
    /// `next_distance` is consulted once per trigger pulse
    pub fn new(us_per_cm: f64, next_distance: Box<dyn FnMut() -> f64 + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PulseState {
                trigger_high: false,
                armed_at: None,
                pulse: Duration::ZERO,
                us_per_cm,
                next_distance,
            })),
        }
    }

    /// Pair answering every pulse with the same distance
    pub fn fixed(us_per_cm: f64, distance_cm: f64) -> Self {
        Self::new(us_per_cm, Box::new(move || distance_cm))
    }

    pub fn trigger(&self) -> TriggerLine {
        TriggerLine {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn echo(&self) -> EchoLine {
        EchoLine {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Trigger side of a [`PulseEcho`] pair
pub struct TriggerLine {
    inner: Arc<Mutex<PulseState>>,
}

impl DigitalOutput for TriggerLine {
    fn set_high(&mut self) {
        self.inner.lock().trigger_high = true;
    }

    fn set_low(&mut self) {
        let mut state = self.inner.lock();
        if !state.trigger_high {
            return;
        }
        state.trigger_high = false;
        let distance = (state.next_distance)();
        if distance > 0.0 {
            state.pulse = Duration::from_secs_f64(distance * state.us_per_cm / 1e6);
            state.armed_at = Some(Instant::now());
        } else {
            state.armed_at = None;
        }
    }
}

/// Echo side of a [`PulseEcho`] pair
pub struct EchoLine {
    inner: Arc<Mutex<PulseState>>,
}

impl DigitalInput for EchoLine {
    fn is_high(&mut self) -> bool {
        let mut state = self.inner.lock();
        let Some(armed) = state.armed_at else {
            return false;
        };
        let elapsed = armed.elapsed();
        if elapsed < ECHO_DELAY {
            false
        } else if elapsed < ECHO_DELAY + state.pulse {
            true
        } else {
            state.armed_at = None;
            false
        }
    }
}

/// Potentiometer stand-in wandering around a starting ratio
struct WanderingRatio {
    ratio: f64,
    rng: SmallRng,
}

impl WanderingRatio {
    fn new(ratio: f64) -> Self {
        Self {
            ratio,
            rng: SmallRng::from_entropy(),
        }
    }
}

impl AnalogInput for WanderingRatio {
    fn read_ratio(&mut self) -> Result<f64> {
        self.ratio = (self.ratio + self.rng.gen_range(-0.02..0.02)).clamp(0.0, 1.0);
        Ok(self.ratio)
    }
}

/// Discards PWM writes; keeps long simulated runs from piling up history
struct NullPwm;

impl PwmOutput for NullPwm {
    fn set(&mut self, _frequency_hz: f64, _duty: f64) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

struct NullLine;

impl DigitalOutput for NullLine {
    fn set_high(&mut self) {}

    fn set_low(&mut self) {}
}

/// Full rig with simulated sensors for `backend = "mock"` runs
pub fn simulated_rig() -> Rig {
    let mut rng = SmallRng::from_entropy();
    let mut distance = 15.0f64;
    let sonar = PulseEcho::new(
        79.0,
        Box::new(move || {
            distance = (distance + rng.gen_range(-1.5..1.5)).clamp(2.0, 120.0);
            distance
        }),
    );

    Rig {
        // Pull-up idle: high means unpressed
        button: Box::new(SharedLevel::new(true)),
        trigger: Box::new(sonar.trigger()),
        echo: Box::new(sonar.echo()),
        buzzer: Box::new(NullPwm),
        red: Box::new(NullPwm),
        green: Box::new(NullPwm),
        blue: Box::new(NullPwm),
        status_led: Box::new(NullLine),
        adc: Box::new(WanderingRatio::new(0.5)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_recorded_line_counts_transitions() {
        let line = RecordedLine::new();
        let mut handle = line.clone();
        handle.set_high();
        handle.set_high();
        handle.set_low();
        assert!(!line.is_high());
        assert_eq!(line.transitions(), 2);
    }

    #[test]
    fn test_recorded_pwm_keeps_history() {
        let pwm = RecordedPwm::new();
        let mut handle = pwm.clone();
        handle.set(440.0, 0.5).unwrap();
        handle.clear().unwrap();
        assert_eq!(
            pwm.history(),
            vec![PwmEvent::Set(440.0, 0.5), PwmEvent::Cleared]
        );
        assert_eq!(pwm.last(), Some(PwmEvent::Cleared));
    }

    #[test]
    fn test_pulse_echo_answers_falling_edge() {
        // 100 cm at 79 us/cm keeps the echo high for 7.9 ms, wide enough
        // that sleep jitter cannot fail the assertions
        let pair = PulseEcho::fixed(79.0, 100.0);
        let mut trigger = pair.trigger();
        let mut echo = pair.echo();

        assert!(!echo.is_high());
        trigger.set_high();
        assert!(!echo.is_high());
        trigger.set_low();
        thread::sleep(Duration::from_millis(2));
        assert!(echo.is_high());
        thread::sleep(Duration::from_millis(20));
        assert!(!echo.is_high());
    }

    #[test]
    fn test_pulse_echo_silent_without_target() {
        let pair = PulseEcho::fixed(79.0, 0.0);
        let mut trigger = pair.trigger();
        let mut echo = pair.echo();

        trigger.set_high();
        trigger.set_low();
        thread::sleep(Duration::from_millis(2));
        assert!(!echo.is_high());
    }

    #[test]
    fn test_shared_ratio_updates() {
        let ratio = SharedRatio::new(0.25);
        let mut handle = ratio.clone();
        assert_eq!(handle.read_ratio().unwrap(), 0.25);
        ratio.set(0.75);
        assert_eq!(handle.read_ratio().unwrap(), 0.75);
    }
}
