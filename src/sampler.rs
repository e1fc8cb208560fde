//! Deadline-driven sample loop
//!
//! The loop owns both sensors and both actuators and interleaves them on
//! their own intervals. Each run of a single mode is one [`Session`]; when
//! the shared mode cell changes, the current session is closed (flushing
//! any recording) and a fresh one starts, so mode changes never tear a
//! session file.

use crate::actuators::color::ColorActuator;
use crate::actuators::tone::ToneActuator;
use crate::config::{AppConfig, RecordingConfig, SamplingConfig};
use crate::constants::RANGE_ABSENT_CM;
use crate::error::Result;
use crate::mode::{Mode, SharedMode};
use crate::sensors::position::PositionSensor;
use crate::sensors::range::{Echo, RangeSensor};
use crate::session::{Session, ABSENT_CELL};
use crate::types::{Reading, Stamp};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Nap between deadline checks when nothing is due
const TICK: Duration = Duration::from_millis(1);

/// Central scheduler interleaving sampling, actuation and recording
pub struct SampleLoop {
    range: RangeSensor,
    position: PositionSensor,
    tone: ToneActuator,
    color: ColorActuator,
    shared: Arc<SharedMode>,
    running: Arc<AtomicBool>,
    sampling: SamplingConfig,
    recording: RecordingConfig,
    echo_warned: bool,
}

impl SampleLoop {
    pub fn new(
        range: RangeSensor,
        position: PositionSensor,
        tone: ToneActuator,
        color: ColorActuator,
        shared: Arc<SharedMode>,
        running: Arc<AtomicBool>,
        config: &AppConfig,
    ) -> Self {
        Self {
            range,
            position,
            tone,
            color,
            shared,
            running,
            sampling: config.sampling.clone(),
            recording: config.recording.clone(),
            echo_warned: false,
        }
    }

    /// Run sessions until the running flag clears
    ///
    /// Recording errors are fatal; the failing session is still closed so
    /// buffered readings get their best-effort flush, and the actuators are
    /// quieted either way.
    pub fn run(&mut self) -> Result<()> {
        while self.running.load(Ordering::Relaxed) {
            let mode = self.shared.get();
            let mut session = Session::begin(mode, &self.recording)?;
            self.echo_warned = false;
            let outcome = self.sample_until_change(&mut session);
            let ended = session.end();
            let quieted = self.quiet_actuators();
            outcome?;
            ended?;
            quieted?;
        }
        info!("sample loop stopped");
        Ok(())
    }

    /// Sample on both cadences until shutdown or a mode change
    fn sample_until_change(&mut self, session: &mut Session) -> Result<()> {
        let mode = session.mode;
        self.seed_color(mode)?;
        let mut last_range = Instant::now();
        let mut last_position = last_range;

        loop {
            if !self.running.load(Ordering::Relaxed) {
                return Ok(());
            }
            if self.shared.get() != mode {
                debug!("mode change detected, ending {} session", mode);
                return Ok(());
            }

            let now = Instant::now();
            if now.duration_since(last_range) >= self.sampling.range_interval() {
                self.sample_range(session, mode)?;
                last_range = now;
                continue;
            }
            if now.duration_since(last_position) >= self.sampling.position_interval() {
                self.sample_position(session, mode)?;
                last_position = now;
                continue;
            }
            thread::sleep(TICK);
        }
    }

    /// Opening read aiming the LED; the sample is neither printed nor
    /// recorded, the first real sample lands one interval in
    fn seed_color(&mut self, mode: Mode) -> Result<()> {
        let percent = self.position.read()?;
        if mode.monitors() {
            self.color.apply(percent)?;
        }
        Ok(())
    }

    fn sample_range(&mut self, session: &mut Session, mode: Mode) -> Result<()> {
        // Abandon the echo wait as soon as the mode or the running flag
        // moves; the measurement is then discarded
        let cancel = {
            let running = Arc::clone(&self.running);
            let shared = Arc::clone(&self.shared);
            move || !running.load(Ordering::Relaxed) || shared.get() != mode
        };
        let echo = self.range.measure(&cancel);
        let stamp = Stamp::now();

        match echo {
            Echo::Distance(distance) => {
                // Beyond the sensor's trustworthy span nothing is in front
                // of it; the sample is absent on the console and in the file
                let in_range = (distance <= RANGE_ABSENT_CM).then_some(distance);
                if mode.monitors() {
                    let freq = self.tone.apply(distance, stamp.mono)?;
                    println!("{}", range_line(&stamp, in_range, freq));
                }
                session.record(Reading::range(stamp, in_range))?;
            }
            Echo::TimedOut => {
                if !self.echo_warned {
                    self.echo_warned = true;
                    warn!("echo timed out; range sensor unresponsive");
                }
                session.record(Reading::range(stamp, None))?;
            }
            Echo::Interrupted => {
                debug!("range measurement interrupted");
            }
        }
        Ok(())
    }

    fn sample_position(&mut self, session: &mut Session, mode: Mode) -> Result<()> {
        let percent = self.position.read()?;
        let stamp = Stamp::now();
        if mode.monitors() {
            let rgb = self.color.apply(percent)?;
            let (r, g, b) = rgb.to_bytes();
            println!(
                "Date and Time: {}, Potentiometer %: {}, RGB: ({}, {}, {})",
                stamp.wall_text(),
                percent,
                r,
                g,
                b
            );
        }
        session.record(Reading::position(stamp, percent))?;
        Ok(())
    }

    fn quiet_actuators(&mut self) -> Result<()> {
        self.tone.silence()?;
        self.color.off()?;
        Ok(())
    }
}

/// Console line for one range sample
///
/// An absent distance renders as the CSV's absent cell, a silent tone as
/// `None`.
fn range_line(stamp: &Stamp, distance_cm: Option<f64>, freq: Option<f64>) -> String {
    let distance = distance_cm.map_or_else(|| ABSENT_CELL.to_string(), |d| d.to_string());
    let freq = freq.map_or_else(|| "None".to_string(), |f| f.to_string());
    format!(
        "Date and Time: {}, Distance: {}, freq: {}",
        stamp.wall_text(),
        distance,
        freq
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::mock::{PulseEcho, PwmEvent, RecordedPwm, SharedRatio};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct Bench {
        sampler: SampleLoop,
        shared: Arc<SharedMode>,
        running: Arc<AtomicBool>,
        tone: RecordedPwm,
        green: RecordedPwm,
        dir: tempfile::TempDir,
    }

    /// Sample loop on scripted hardware with fast test intervals
    fn bench(mode: Mode, distance_cm: f64) -> Bench {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            sampling: SamplingConfig {
                range_interval_ms: 30,
                position_interval_ms: 50,
                us_per_cm: 79.0,
                echo_timeout_ms: 10,
            },
            recording: RecordingConfig {
                output_dir: dir.path().to_path_buf(),
                buffer_size: 5,
            },
            ..AppConfig::default()
        };

        let sonar = PulseEcho::fixed(79.0, distance_cm);
        let tone = RecordedPwm::new();
        let green = RecordedPwm::new();
        let shared = Arc::new(SharedMode::new(mode));
        let running = Arc::new(AtomicBool::new(true));

        let sampler = SampleLoop::new(
            RangeSensor::new(
                Box::new(sonar.trigger()),
                Box::new(sonar.echo()),
                &config.sampling,
            ),
            PositionSensor::new(Box::new(SharedRatio::new(0.42))),
            ToneActuator::new(Box::new(tone.clone())),
            ColorActuator::new(
                Box::new(RecordedPwm::new()),
                Box::new(green.clone()),
                Box::new(RecordedPwm::new()),
            ),
            Arc::clone(&shared),
            Arc::clone(&running),
            &config,
        );

        Bench {
            sampler,
            shared,
            running,
            tone,
            green,
            dir,
        }
    }

    fn files_in(dir: &std::path::Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn test_record_only_writes_sorted_rows_without_actuation() {
        let mut bench = bench(Mode::RecordOnly, 12.0);
        let running = Arc::clone(&bench.running);
        let handle = thread::spawn(move || bench.sampler.run());
        thread::sleep(Duration::from_millis(300));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        let files = files_in(bench.dir.path());
        assert_eq!(files.len(), 1);
        let contents = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        // ~10 range and ~5 position samples on the test cadences
        assert!(lines.len() > 8, "only {} lines recorded", lines.len());
        assert_eq!(lines[0], "Date and Time,Potentiometer %,Distance");

        // Rows carry exactly one value each and come out in capture order
        assert!(lines[1..].iter().any(|line| line.contains(",42,")));
        assert!(lines[1..].iter().any(|line| line.contains(",NaN,1")));
        for pair in lines[1..].windows(2) {
            assert!(pair[0][..23] <= pair[1][..23], "out of order: {:?}", pair);
        }

        // Record-only never sounds the buzzer or lights the RGB LED
        assert!(bench
            .tone
            .history()
            .iter()
            .all(|event| *event == PwmEvent::Cleared));
        assert!(bench
            .green
            .history()
            .iter()
            .all(|event| *event == PwmEvent::Cleared));
    }

    #[test]
    fn test_mode_change_starts_a_fresh_session() {
        let mut bench = bench(Mode::RecordOnly, 12.0);
        let running = Arc::clone(&bench.running);
        let shared = Arc::clone(&bench.shared);
        let handle = thread::spawn(move || bench.sampler.run());

        thread::sleep(Duration::from_millis(150));
        shared.set(Mode::Monitor);
        thread::sleep(Duration::from_millis(150));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        // Only the record-only session produced a file
        let files = files_in(bench.dir.path());
        assert_eq!(files.len(), 1);
        assert!(fs::read_to_string(&files[0]).unwrap().lines().count() > 1);

        // The monitor session that followed drove the RGB LED
        assert!(bench
            .green
            .history()
            .iter()
            .any(|event| matches!(event, PwmEvent::Set(_, _))));
    }

    #[test]
    fn test_range_line_renders_absent_values() {
        let stamp = Stamp::now();
        let wall = stamp.wall_text();

        assert_eq!(
            range_line(&stamp, Some(12.0), Some(1050.0)),
            format!("Date and Time: {}, Distance: 12, freq: 1050", wall)
        );
        // In range for the sensor but too far for the buzzer
        assert_eq!(
            range_line(&stamp, Some(57.3), None),
            format!("Date and Time: {}, Distance: 57.3, freq: None", wall)
        );
        // Nothing within a meter: the line shows the same cell as the file
        assert_eq!(
            range_line(&stamp, None, None),
            format!("Date and Time: {}, Distance: NaN, freq: None", wall)
        );
    }

    #[test]
    fn test_opening_read_only_aims_the_led() {
        let mut bench = bench(Mode::MonitorAndRecord, 12.0);
        // Intervals beyond the run window: only the opening read can happen
        bench.sampler.sampling.range_interval_ms = 30_000;
        bench.sampler.sampling.position_interval_ms = 30_000;

        let running = Arc::clone(&bench.running);
        let handle = thread::spawn(move || bench.sampler.run());
        thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        // The LED is aimed right away, before any interval elapses
        assert!(bench
            .green
            .history()
            .iter()
            .any(|event| matches!(event, PwmEvent::Set(_, _))));

        // The opening read is not a sample: the file holds only the header
        let files = files_in(bench.dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(fs::read_to_string(&files[0]).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_monitor_session_actuates_and_records_nothing() {
        let mut bench = bench(Mode::Monitor, 12.0);
        let running = Arc::clone(&bench.running);
        let handle = thread::spawn(move || bench.sampler.run());
        thread::sleep(Duration::from_millis(200));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        assert!(files_in(bench.dir.path()).is_empty());

        // 12 cm nominally maps to 1050 Hz; scheduling jitter shifts the
        // timed echo, so only the actuator's band is asserted here
        let last_tone = bench
            .tone
            .history()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                PwmEvent::Set(freq, duty) => Some((freq, duty)),
                PwmEvent::Cleared => None,
            })
            .unwrap_or_else(|| panic!("buzzer never driven"));
        assert!(
            (100.0..=2000.0).contains(&last_tone.0),
            "freq out of band: {}",
            last_tone.0
        );
        assert_eq!(last_tone.1, 0.1);

        // 42% sits in the yellow-to-green segment, green fully on
        let last_green = bench
            .green
            .history()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                PwmEvent::Set(freq, duty) => Some((freq, duty)),
                PwmEvent::Cleared => None,
            })
            .unwrap_or_else(|| panic!("RGB LED never driven"));
        assert_eq!(last_green, (100.0, 1.0));
    }
}
