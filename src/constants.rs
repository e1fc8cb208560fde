//! Fixed constants for the monitoring rig
//!
//! Values measured or chosen on the reference hardware. Anything an
//! installation may want to change (pins, intervals, windows) lives in
//! `config` instead.

use std::time::Duration;

// Distance-to-tone mapping
pub const MIN_DISTANCE_CM: f64 = 4.0; // buzzer saturates at MAX_FREQ_HZ below this
pub const MAX_DISTANCE_CM: f64 = 20.0; // buzzer silent above this
pub const MIN_FREQ_HZ: f64 = 100.0; // tone at MAX_DISTANCE_CM
pub const MAX_FREQ_HZ: f64 = 2000.0; // tone at MIN_DISTANCE_CM
pub const BEEP_INTERVAL: Duration = Duration::from_millis(500); // close-range beep half-period
pub const BUZZER_DUTY: f64 = 0.1; // PWM duty while sounding

// Position-to-color mapping
pub const VIOLET_RATIO: f64 = 0.75; // keeps 100% at violet instead of wrapping to red
pub const LED_PWM_HZ: f64 = 100.0; // RGB channel carrier

// Range sensor
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10); // ultrasonic burst trigger
pub const RANGE_ABSENT_CM: f64 = 100.0; // distances beyond this are recorded as absent

// Timestamp formats
pub const WALL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f"; // console and CSV cells
pub const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S"; // recording file names
