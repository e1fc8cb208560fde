//! Recording status indicator
//!
//! A dedicated thread refreshes the LED from an atomic pattern word, so
//! mode transitions never block on pin I/O and the blink cadence keeps
//! going between transitions.

use crate::error::{Error, Result};
use crate::gpio::DigitalOutput;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Refresh period; pattern changes show up within one period
const REFRESH: Duration = Duration::from_millis(50);
/// Blink half-period: one second on, one second off
const BLINK_HALF_PERIOD: Duration = Duration::from_secs(1);

/// What the indicator shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedPattern {
    Off = 0,
    Solid = 1,
    Blink = 2,
}

impl LedPattern {
    fn from_u8(raw: u8) -> LedPattern {
        match raw {
            1 => LedPattern::Solid,
            2 => LedPattern::Blink,
            _ => LedPattern::Off,
        }
    }
}

/// Cloneable handle for changing the displayed pattern
#[derive(Clone, Default)]
pub struct LedControl {
    pattern: Arc<AtomicU8>,
}

impl LedControl {
    pub fn set(&self, pattern: LedPattern) {
        self.pattern.store(pattern as u8, Ordering::Relaxed);
    }

    pub fn get(&self) -> LedPattern {
        LedPattern::from_u8(self.pattern.load(Ordering::Relaxed))
    }
}

/// Status LED driver owning the refresh thread
pub struct StatusLed {
    control: LedControl,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StatusLed {
    /// Start the refresh thread with the LED off
    pub fn spawn(pin: Box<dyn DigitalOutput>) -> Result<Self> {
        let control = LedControl::default();
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_control = control.clone();
        let thread_shutdown = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("status-led".to_string())
            .spawn(move || refresh_loop(pin, thread_control, thread_shutdown))
            .map_err(|e| Error::Other(format!("Failed to spawn status LED thread: {}", e)))?;
        Ok(Self {
            control,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Handle for the mode controller
    pub fn control(&self) -> LedControl {
        self.control.clone()
    }

    /// Stop the thread, leaving the LED off
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusLed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// True while a blinking LED should be lit
fn blink_phase(elapsed: Duration, half_period: Duration) -> bool {
    (elapsed.as_millis() / half_period.as_millis()) % 2 == 0
}

fn refresh_loop(mut pin: Box<dyn DigitalOutput>, control: LedControl, shutdown: Arc<AtomicBool>) {
    let epoch = Instant::now();
    let mut lit = false;
    pin.set_low();
    while !shutdown.load(Ordering::Relaxed) {
        let want = match control.get() {
            LedPattern::Off => false,
            LedPattern::Solid => true,
            LedPattern::Blink => blink_phase(epoch.elapsed(), BLINK_HALF_PERIOD),
        };
        if want != lit {
            lit = want;
            if lit {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        thread::sleep(REFRESH);
    }
    pin.set_low();
    debug!("status LED thread exiting");
}
