//! Recording sessions and buffered CSV output
//!
//! A [`Session`] spans one stretch of a single mode. Modes that record get
//! a [`Recorder`]: readings accumulate in memory and are flushed to the
//! session's CSV file in capture order once the buffer passes its
//! threshold, keeping SD card writes rare while the sample loop runs.

use crate::config::RecordingConfig;
use crate::constants::FILE_TIME_FORMAT;
use crate::error::Result;
use crate::mode::Mode;
use crate::types::{Reading, ReadingValue, Stamp};
use chrono::{DateTime, Local};
use log::{debug, info};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const CSV_HEADER: [&str; 3] = ["Date and Time", "Potentiometer %", "Distance"];
/// Cell written where a row has no value for a column; the console range
/// line renders absent distances with the same text
pub(crate) const ABSENT_CELL: &str = "NaN";

/// Buffered CSV writer for one recording file
pub struct Recorder {
    path: PathBuf,
    writer: csv::Writer<File>,
    buffer: Vec<Reading>,
    threshold: usize,
}

impl Recorder {
    /// Open the session file, writing the header when the file is new
    ///
    /// The file is named after the session start time at second
    /// resolution. It is opened for append, so a session restarting
    /// within the same second extends the earlier session's file instead
    /// of wiping its rows.
    pub fn create(dir: &Path, started: &DateTime<Local>, threshold: usize) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("data_{}.csv", started.format(FILE_TIME_FORMAT)));
        let file = OpenOptions::new().append(true).create(true).open(&path)?;
        let fresh = file.metadata()?.len() == 0;
        let mut writer = csv::Writer::from_writer(file);
        if fresh {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }
        Ok(Self {
            path,
            writer,
            buffer: Vec::new(),
            threshold,
        })
    }

    /// Buffer a reading, flushing once the buffer exceeds the threshold
    pub fn append(&mut self, reading: Reading) -> Result<()> {
        self.buffer.push(reading);
        if self.buffer.len() > self.threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Write all buffered readings to the file in capture order
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        debug!(
            "writing {} buffered readings to {}",
            self.buffer.len(),
            self.path.display()
        );
        // Range and position samples interleave at different cadences;
        // sorting on the monotonic stamp restores capture order.
        self.buffer.sort_by_key(|reading| reading.stamp.mono);
        for reading in &self.buffer {
            self.writer.write_record(row(reading))?;
        }
        self.writer.flush()?;
        self.buffer.clear();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

fn row(reading: &Reading) -> [String; 3] {
    let wall = reading.stamp.wall_text();
    match reading.value {
        ReadingValue::Position { percent } => [wall, percent.to_string(), ABSENT_CELL.to_string()],
        ReadingValue::Range { distance_cm } => [
            wall,
            ABSENT_CELL.to_string(),
            distance_cm.map_or_else(|| ABSENT_CELL.to_string(), |d| d.to_string()),
        ],
    }
}

/// One stretch of the sample loop under a single mode
pub struct Session {
    pub mode: Mode,
    pub started: Stamp,
    recorder: Option<Recorder>,
}

impl Session {
    /// Start a session, opening a recording file when the mode records
    pub fn begin(mode: Mode, config: &RecordingConfig) -> Result<Self> {
        let started = Stamp::now();
        let recorder = if mode.records() {
            let recorder = Recorder::create(&config.output_dir, &started.wall, config.buffer_size)?;
            info!("recording data to {}", recorder.path().display());
            Some(recorder)
        } else {
            None
        };
        info!("session started in {} mode", mode);
        Ok(Self {
            mode,
            started,
            recorder,
        })
    }

    /// Buffer a reading; does nothing in non-recording modes
    pub fn record(&mut self, reading: Reading) -> Result<()> {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.append(reading)?;
        }
        Ok(())
    }

    /// Close the session, flushing anything still buffered
    pub fn end(&mut self) -> Result<()> {
        if let Some(mut recorder) = self.recorder.take() {
            recorder.flush()?;
            info!("stopped recording data to {}", recorder.path().display());
        }
        Ok(())
    }

    /// Path of the recording file, when this session has one
    pub fn file_path(&self) -> Option<&Path> {
        self.recorder.as_ref().map(|recorder| recorder.path())
    }
}
