//! Button watcher and mode controller threads
//!
//! The watcher polls the mode button and timestamps press/release edges
//! onto a channel. The controller folds those edges through the
//! [`GestureMachine`], publishes each resolved mode to the shared cell and
//! retargets the status indicator. Splitting the two keeps the gesture
//! timing independent of pin polling hiccups: every edge carries the
//! instant it was observed.

use crate::actuators::status_led::{LedControl, LedPattern};
use crate::config::GestureConfig;
use crate::error::{Error, Result};
use crate::gesture::GestureMachine;
use crate::gpio::DigitalInput;
use crate::mode::{Mode, SharedMode};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Button sampling period, well under the shortest gesture window
const BUTTON_POLL: Duration = Duration::from_millis(5);
/// Wake-up cap for the controller while no gesture deadline is pending
const CONTROL_IDLE: Duration = Duration::from_millis(100);

/// One observed button edge
#[derive(Debug, Clone, Copy)]
pub struct ButtonEvent {
    pub pressed: bool,
    pub at: Instant,
}

/// Poll the mode button and publish timestamped edges
pub fn spawn_button_watcher(
    mut button: Box<dyn DigitalInput>,
    events: Sender<ButtonEvent>,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("button-watcher".to_string())
        .spawn(move || {
            // Pull-up wiring: the line reads low while pressed
            let mut pressed = !button.is_high();
            while running.load(Ordering::Relaxed) {
                let now_pressed = !button.is_high();
                if now_pressed != pressed {
                    pressed = now_pressed;
                    let event = ButtonEvent {
                        pressed,
                        at: Instant::now(),
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
                thread::sleep(BUTTON_POLL);
            }
            debug!("button watcher exiting");
        })
        .map_err(|e| Error::Other(format!("Failed to spawn button watcher thread: {}", e)))
}

/// Resolve button edges into modes and publish them
pub fn spawn_mode_controller(
    events: Receiver<ButtonEvent>,
    shared: Arc<SharedMode>,
    led: LedControl,
    config: &GestureConfig,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let mut machine = GestureMachine::new(config.double_tap_window(), config.hold_window());
    thread::Builder::new()
        .name("mode-controller".to_string())
        .spawn(move || {
            while running.load(Ordering::Relaxed) {
                // Sleep to the machine's next window deadline, capped so the
                // running flag stays responsive
                let timeout = machine
                    .next_deadline()
                    .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                    .unwrap_or(CONTROL_IDLE)
                    .min(CONTROL_IDLE);
                let resolved = match events.recv_timeout(timeout) {
                    Ok(event) if event.pressed => machine.on_press(event.at),
                    Ok(event) => machine.on_release(event.at),
                    Err(RecvTimeoutError::Timeout) => machine.poll(Instant::now()),
                    Err(RecvTimeoutError::Disconnected) => break,
                };
                if let Some(mode) = resolved {
                    apply_mode(mode, &shared, &led);
                }
            }
            debug!("mode controller exiting");
        })
        .map_err(|e| Error::Other(format!("Failed to spawn mode controller thread: {}", e)))
}

/// Publish a resolved mode and retarget the status indicator
fn apply_mode(mode: Mode, shared: &SharedMode, led: &LedControl) {
    let current = shared.get();
    if mode == current {
        debug!("gesture resolved to {}, already active", mode);
        return;
    }
    // Indicator first: once the cell changes, observers may assert on both
    led.set(pattern_for(mode));
    shared.set(mode);
    info!("mode changed: {} -> {}", current, mode);
}

fn pattern_for(mode: Mode) -> LedPattern {
    match mode {
        Mode::Monitor => LedPattern::Off,
        Mode::MonitorAndRecord => LedPattern::Solid,
        Mode::RecordOnly => LedPattern::Blink,
    }
}
