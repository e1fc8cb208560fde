//! Configuration for the monitoring daemon
//!
//! Loads configuration from a TOML file. Every field carries a default
//! matching the reference wiring, so a partial file (or none at all) yields
//! a working setup.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hardware configuration (backend and BCM pin assignment)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// Pin backend: "gpio" for real hardware, "mock" for the simulated rig
    /// (requires the `mock` feature)
    #[serde(default = "defaults::backend")]
    pub backend: String,

    /// Mode-select push button (active low behind the internal pull-up)
    #[serde(default = "defaults::button_pin")]
    pub button_pin: u8,

    /// Piezo buzzer
    #[serde(default = "defaults::buzzer_pin")]
    pub buzzer_pin: u8,

    /// Ultrasonic trigger output
    #[serde(default = "defaults::trigger_pin")]
    pub trigger_pin: u8,

    /// Ultrasonic echo input
    #[serde(default = "defaults::echo_pin")]
    pub echo_pin: u8,

    /// RGB LED red channel
    #[serde(default = "defaults::red_pin")]
    pub red_pin: u8,

    /// RGB LED green channel
    #[serde(default = "defaults::green_pin")]
    pub green_pin: u8,

    /// RGB LED blue channel
    #[serde(default = "defaults::blue_pin")]
    pub blue_pin: u8,

    /// Recording status indicator LED
    #[serde(default = "defaults::status_led_pin")]
    pub status_led_pin: u8,

    /// MCP3008 channel wired to the potentiometer
    #[serde(default)]
    pub adc_channel: u8,

    /// SPI clock for the MCP3008
    #[serde(default = "defaults::spi_clock_hz")]
    pub spi_clock_hz: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            backend: defaults::backend(),
            button_pin: defaults::button_pin(),
            buzzer_pin: defaults::buzzer_pin(),
            trigger_pin: defaults::trigger_pin(),
            echo_pin: defaults::echo_pin(),
            red_pin: defaults::red_pin(),
            green_pin: defaults::green_pin(),
            blue_pin: defaults::blue_pin(),
            status_led_pin: defaults::status_led_pin(),
            adc_channel: 0,
            spi_clock_hz: defaults::spi_clock_hz(),
        }
    }
}

/// Sampling cadence and range sensor calibration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SamplingConfig {
    /// Interval between ultrasonic measurements (milliseconds)
    #[serde(default = "defaults::range_interval_ms")]
    pub range_interval_ms: u64,

    /// Interval between potentiometer reads (milliseconds)
    #[serde(default = "defaults::position_interval_ms")]
    pub position_interval_ms: u64,

    /// Echo round-trip time per centimetre (microseconds)
    ///
    /// The datasheet value is 58 us/cm; 79 matches a ruler on the
    /// reference sensor.
    #[serde(default = "defaults::us_per_cm")]
    pub us_per_cm: f64,

    /// Give-up deadline for each echo edge (milliseconds)
    #[serde(default = "defaults::echo_timeout_ms")]
    pub echo_timeout_ms: u64,
}

impl SamplingConfig {
    pub fn range_interval(&self) -> Duration {
        Duration::from_millis(self.range_interval_ms)
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            range_interval_ms: defaults::range_interval_ms(),
            position_interval_ms: defaults::position_interval_ms(),
            us_per_cm: defaults::us_per_cm(),
            echo_timeout_ms: defaults::echo_timeout_ms(),
        }
    }
}

/// Session recording configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// Directory receiving the per-session CSV files
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Readings buffered in memory before a sorted flush to disk
    #[serde(default = "defaults::buffer_size")]
    pub buffer_size: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            buffer_size: defaults::buffer_size(),
        }
    }
}

/// Button gesture timing windows
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GestureConfig {
    /// Window for a second tap after the first press (milliseconds)
    #[serde(default = "defaults::double_tap_window_ms")]
    pub double_tap_window_ms: u64,

    /// Hold duration that selects record-only mode (milliseconds)
    #[serde(default = "defaults::hold_window_ms")]
    pub hold_window_ms: u64,
}

impl GestureConfig {
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    pub fn hold_window(&self) -> Duration {
        Duration::from_millis(self.hold_window_ms)
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: defaults::double_tap_window_ms(),
            hold_window_ms: defaults::hold_window_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Log output (stdout or stderr)
    ///
    /// Defaults to stderr so the monitor lines on stdout stay clean.
    #[serde(default = "defaults::log_output")]
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            output: defaults::log_output(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn backend() -> String {
        "gpio".to_string()
    }
    pub fn button_pin() -> u8 {
        16
    }
    pub fn buzzer_pin() -> u8 {
        18
    }
    pub fn trigger_pin() -> u8 {
        25
    }
    pub fn echo_pin() -> u8 {
        24
    }
    pub fn red_pin() -> u8 {
        5
    }
    pub fn green_pin() -> u8 {
        6
    }
    pub fn blue_pin() -> u8 {
        13
    }
    pub fn status_led_pin() -> u8 {
        14
    }
    pub fn spi_clock_hz() -> u32 {
        1_000_000
    }
    pub fn range_interval_ms() -> u64 {
        88
    }
    pub fn position_interval_ms() -> u64 {
        492
    }
    pub fn us_per_cm() -> f64 {
        79.0
    }
    pub fn echo_timeout_ms() -> u64 {
        60
    }
    pub fn output_dir() -> PathBuf {
        PathBuf::from("/home/pi/Documents")
    }
    pub fn buffer_size() -> usize {
        250
    }
    pub fn double_tap_window_ms() -> u64 {
        1000
    }
    pub fn hold_window_ms() -> u64 {
        2000
    }
    pub fn log_level() -> String {
        "info".to_string()
    }
    pub fn log_output() -> String {
        "stderr".to_string()
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use tarang_io::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("tarang-io.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.hardware.backend, "gpio");
        assert_eq!(config.hardware.button_pin, 16);
        assert_eq!(config.hardware.buzzer_pin, 18);
        assert_eq!(config.hardware.trigger_pin, 25);
        assert_eq!(config.hardware.echo_pin, 24);
        assert_eq!(config.hardware.status_led_pin, 14);
        assert_eq!(config.hardware.adc_channel, 0);
        assert_eq!(config.sampling.range_interval(), Duration::from_millis(88));
        assert_eq!(
            config.sampling.position_interval(),
            Duration::from_millis(492)
        );
        assert_eq!(config.sampling.us_per_cm, 79.0);
        assert_eq!(config.recording.buffer_size, 250);
        assert_eq!(config.gesture.double_tap_window(), Duration::from_secs(1));
        assert_eq!(config.gesture.hold_window(), Duration::from_secs(2));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        // Should contain all sections
        assert!(toml_string.contains("[hardware]"));
        assert!(toml_string.contains("[sampling]"));
        assert!(toml_string.contains("[recording]"));
        assert!(toml_string.contains("[gesture]"));
        assert!(toml_string.contains("[logging]"));

        // Should contain key values
        assert!(toml_string.contains("button_pin = 16"));
        assert!(toml_string.contains("buffer_size = 250"));
        assert!(toml_string.contains("us_per_cm = 79.0"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[hardware]
backend = "mock"
button_pin = 21

[sampling]
range_interval_ms = 100

[recording]
output_dir = "/tmp/readings"
buffer_size = 10

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.hardware.backend, "mock");
        assert_eq!(config.hardware.button_pin, 21);
        assert_eq!(config.sampling.range_interval_ms, 100);
        assert_eq!(config.recording.output_dir, PathBuf::from("/tmp/readings"));
        assert_eq!(config.recording.buffer_size, 10);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[gesture]\nhold_window_ms = 1500\n").unwrap();
        assert_eq!(config.gesture.hold_window_ms, 1500);
        // Everything unspecified falls back to the reference wiring
        assert_eq!(config.gesture.double_tap_window_ms, 1000);
        assert_eq!(config.hardware.button_pin, 16);
        assert_eq!(config.sampling.position_interval_ms, 492);
        assert_eq!(config.recording.buffer_size, 250);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tarang-io.toml");
        let config = AppConfig::default();
        config.to_file(&path).unwrap();
        let parsed = AppConfig::from_file(&path).unwrap();
        assert_eq!(parsed.hardware.button_pin, config.hardware.button_pin);
        assert_eq!(parsed.sampling.us_per_cm, config.sampling.us_per_cm);
        assert_eq!(parsed.recording.output_dir, config.recording.output_dir);
    }
}
