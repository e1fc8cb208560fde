//! Application assembly and lifecycle
//!
//! [`MonitorApp`] opens the pin backend, hands each line to its component
//! and owns the background threads. The sample loop runs on the caller's
//! thread inside [`run`](MonitorApp::run); everything else (button watcher,
//! mode controller, status LED) runs on named threads stopped through one
//! shared running flag.

use crate::actuators::color::ColorActuator;
use crate::actuators::status_led::StatusLed;
use crate::actuators::tone::ToneActuator;
use crate::config::AppConfig;
use crate::controller::{spawn_button_watcher, spawn_mode_controller};
use crate::error::{Error, Result};
use crate::gpio;
use crate::mode::{Mode, SharedMode};
use crate::sampler::SampleLoop;
use crate::sensors::position::PositionSensor;
use crate::sensors::range::RangeSensor;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Fully wired monitoring application
pub struct MonitorApp {
    running: Arc<AtomicBool>,
    sampler: SampleLoop,
    status_led: StatusLed,
    watcher: Option<JoinHandle<()>>,
    controller: Option<JoinHandle<()>>,
}

impl MonitorApp {
    /// Open the hardware and start the background threads
    ///
    /// Starts in monitor mode. The sample loop itself does not run until
    /// [`run`](Self::run).
    pub fn new(config: &AppConfig) -> Result<Self> {
        info!("opening {} pin backend", config.hardware.backend);
        let rig = gpio::open_rig(&config.hardware)?;

        let running = Arc::new(AtomicBool::new(true));
        let shared = Arc::new(SharedMode::new(Mode::Monitor));

        let status_led = StatusLed::spawn(rig.status_led)?;
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let watcher = spawn_button_watcher(rig.button, events_tx, Arc::clone(&running))?;
        let controller = spawn_mode_controller(
            events_rx,
            Arc::clone(&shared),
            status_led.control(),
            &config.gesture,
            Arc::clone(&running),
        )?;

        let sampler = SampleLoop::new(
            RangeSensor::new(rig.trigger, rig.echo, &config.sampling),
            PositionSensor::new(rig.adc),
            ToneActuator::new(rig.buzzer),
            ColorActuator::new(rig.red, rig.green, rig.blue),
            shared,
            Arc::clone(&running),
            config,
        );

        Ok(Self {
            running,
            sampler,
            status_led,
            watcher: Some(watcher),
            controller: Some(controller),
        })
    }

    /// Run the sample loop until Ctrl-C or a fatal error
    pub fn run(&mut self) -> Result<()> {
        let running = Arc::clone(&self.running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::Relaxed);
        })
        .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

        info!("monitoring started, press Ctrl-C to stop");
        let outcome = self.sampler.run();
        self.stop_threads();
        outcome
    }

    /// Ask the application to stop; [`run`](Self::run) returns shortly after
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    fn stop_threads(&mut self) {
        debug!("stopping application threads");
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.watcher.take() {
            if handle.join().is_err() {
                error!("button watcher thread panicked");
            }
        }
        if let Some(handle) = self.controller.take() {
            if handle.join().is_err() {
                error!("mode controller thread panicked");
            }
        }
        self.status_led.stop();
    }
}

impl Drop for MonitorApp {
    fn drop(&mut self) {
        self.stop_threads();
    }
}
