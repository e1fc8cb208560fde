//! Operating modes and the shared mode cell

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Operating mode selected by button gestures
///
/// Discriminants are stable because the active mode crosses threads as an
/// atomic byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Live actuation and console reporting only
    Monitor = 1,
    /// Live actuation plus CSV recording
    MonitorAndRecord = 2,
    /// CSV recording only, actuators quiet
    RecordOnly = 3,
}

impl Mode {
    /// Whether sensor status drives the actuators and console
    pub fn monitors(self) -> bool {
        matches!(self, Mode::Monitor | Mode::MonitorAndRecord)
    }

    /// Whether readings are persisted to a session file
    pub fn records(self) -> bool {
        matches!(self, Mode::MonitorAndRecord | Mode::RecordOnly)
    }

    fn from_u8(raw: u8) -> Mode {
        match raw {
            2 => Mode::MonitorAndRecord,
            3 => Mode::RecordOnly,
            _ => Mode::Monitor,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Monitor => "MONITOR",
            Mode::MonitorAndRecord => "MONITOR_AND_RECORD",
            Mode::RecordOnly => "RECORD_ONLY",
        };
        f.write_str(name)
    }
}

/// Process-wide mode cell
///
/// Single writer (the mode controller thread), read once per iteration by
/// the sample loop. Relaxed ordering is enough for a lone scalar.
#[derive(Debug)]
pub struct SharedMode(AtomicU8);

impl SharedMode {
    pub fn new(mode: Mode) -> Self {
        Self(AtomicU8::new(mode as u8))
    }

    pub fn get(&self) -> Mode {
        Mode::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, mode: Mode) {
        self.0.store(mode as u8, Ordering::Relaxed);
    }
}

impl Default for SharedMode {
    fn default() -> Self {
        Self::new(Mode::Monitor)
    }
}
