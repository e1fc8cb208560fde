//! Core data types shared across the monitoring pipeline

use crate::constants::WALL_TIME_FORMAT;
use chrono::{DateTime, Local};
use std::time::Instant;

/// Capture timestamp pairing a monotonic instant with wall-clock time
///
/// The monotonic half orders readings (buffer sorting, interval math); the
/// wall-clock half is what reaches the console and the CSV files.
#[derive(Debug, Clone, Copy)]
pub struct Stamp {
    /// Monotonic capture time, used for ordering
    pub mono: Instant,
    /// Wall-clock capture time, used for presentation
    pub wall: DateTime<Local>,
}

impl Stamp {
    /// Capture the current time on both clocks
    pub fn now() -> Self {
        Self {
            mono: Instant::now(),
            wall: Local::now(),
        }
    }

    /// Wall-clock time formatted for console lines and CSV cells
    pub fn wall_text(&self) -> String {
        self.wall.format(WALL_TIME_FORMAT).to_string()
    }
}

/// A single sampled value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingValue {
    /// Potentiometer position as a percentage of full scale
    Position { percent: f64 },
    /// Ultrasonic distance; `None` when out of range or unanswered
    Range { distance_cm: Option<f64> },
}

/// A timestamped sensor reading
#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub stamp: Stamp,
    pub value: ReadingValue,
}

impl Reading {
    pub fn position(stamp: Stamp, percent: f64) -> Self {
        Self {
            stamp,
            value: ReadingValue::Position { percent },
        }
    }

    pub fn range(stamp: Stamp, distance_cm: Option<f64>) -> Self {
        Self {
            stamp,
            value: ReadingValue::Range { distance_cm },
        }
    }
}

/// Round to two decimals, the precision used for reported sensor values
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
