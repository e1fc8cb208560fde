//! TarangIO - Sensor monitoring and recording daemon for Raspberry Pi rigs
//!
//! Reads a potentiometer (through an MCP3008) and an ultrasonic range
//! sensor, sounds a buzzer and sweeps an RGB LED from the readings, and
//! records sessions to CSV files. Timed gestures on a push button switch
//! between monitor, monitor-and-record and record-only modes.
//!
//! ## Features
//!
//! - `mock`: Enable the simulated pin backend for hardware-free runs

pub mod actuators;
pub mod app;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod gpio;
pub mod mode;
pub mod sampler;
pub mod sensors;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use app::MonitorApp;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use mode::{Mode, SharedMode};
