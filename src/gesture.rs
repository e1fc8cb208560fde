//! Button gesture state machine
//!
//! Resolves timed press/release sequences on the mode button into an
//! operating mode:
//!
//! - press and release, with no second tap inside the double-tap window:
//!   [`Mode::Monitor`]
//! - two taps completed inside the window: [`Mode::MonitorAndRecord`]
//! - press held through the hold window: [`Mode::RecordOnly`], resolved
//!   while the button is still down
//! - press held past the double-tap window but released before the hold
//!   window: [`Mode::Monitor`]
//! - a second press still held when the window closes re-enters the
//!   machine as a fresh first press, with no mode emitted in between
//!
//! The machine is purely event-and-clock driven: callers feed it edge
//! events and poll it at its requested deadline. It never touches pins or
//! reads clocks itself, which keeps every timing case testable with plain
//! `Instant` arithmetic. Windows are half-open: an edge landing exactly on
//! a deadline counts as outside the window.

use crate::mode::Mode;
use std::time::{Duration, Instant};

/// Gesture progress between a first press and a mode decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No gesture in progress
    Idle,
    /// First press down, double-tap window open
    FirstPress { pressed_at: Instant },
    /// First press released, waiting for a second tap
    ReleasedOnce { pressed_at: Instant },
    /// Second press down inside the window
    SecondPress { first_at: Instant, second_at: Instant },
    /// Still held past the double-tap window
    Holding { pressed_at: Instant },
}

/// Timed press/release resolver for the mode button
#[derive(Debug)]
pub struct GestureMachine {
    double_tap_window: Duration,
    hold_window: Duration,
    state: State,
}

impl GestureMachine {
    pub fn new(double_tap_window: Duration, hold_window: Duration) -> Self {
        Self {
            double_tap_window,
            hold_window,
            state: State::Idle,
        }
    }

    /// Feed a press edge
    ///
    /// May first resolve a gesture whose window expired before this press;
    /// the press then starts a fresh gesture.
    pub fn on_press(&mut self, at: Instant) -> Option<Mode> {
        let expired = self.advance(at);
        match self.state {
            State::Idle => self.state = State::FirstPress { pressed_at: at },
            State::ReleasedOnce { pressed_at } => {
                self.state = State::SecondPress {
                    first_at: pressed_at,
                    second_at: at,
                }
            }
            // A press edge while already down is watcher noise
            State::FirstPress { .. } | State::SecondPress { .. } | State::Holding { .. } => {}
        }
        expired
    }

    /// Feed a release edge
    pub fn on_release(&mut self, at: Instant) -> Option<Mode> {
        let expired = self.advance(at);
        let resolved = match self.state {
            State::FirstPress { pressed_at } => {
                // Inside the double-tap window: wait for a second tap
                self.state = State::ReleasedOnce { pressed_at };
                None
            }
            State::SecondPress { .. } => {
                // Both taps completed inside the window
                self.state = State::Idle;
                Some(Mode::MonitorAndRecord)
            }
            State::Holding { .. } => {
                // Held past the double-tap window, released before the hold
                // window closed
                self.state = State::Idle;
                Some(Mode::Monitor)
            }
            // A release edge with no tracked press is watcher noise
            State::Idle | State::ReleasedOnce { .. } => None,
        };
        // An expiry emission leaves the machine idle, so at most one of the
        // two can be set
        expired.or(resolved)
    }

    /// Re-evaluate the window timers; call at `next_deadline`
    pub fn poll(&mut self, now: Instant) -> Option<Mode> {
        self.advance(now)
    }

    /// When the machine next needs a [`poll`](Self::poll), if a gesture is
    /// pending
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            State::Idle => None,
            State::FirstPress { pressed_at }
            | State::ReleasedOnce { pressed_at }
            | State::SecondPress {
                first_at: pressed_at,
                ..
            } => Some(pressed_at + self.double_tap_window),
            State::Holding { pressed_at } => Some(pressed_at + self.hold_window),
        }
    }

    /// Apply every window expiry that `now` has passed
    ///
    /// At most one mode can fall out: an expiry either emits and idles the
    /// machine, or re-enters it at a strictly later press time.
    fn advance(&mut self, now: Instant) -> Option<Mode> {
        loop {
            match self.state {
                State::FirstPress { pressed_at }
                    if now >= pressed_at + self.double_tap_window =>
                {
                    self.state = State::Holding { pressed_at };
                }
                State::ReleasedOnce { pressed_at }
                    if now >= pressed_at + self.double_tap_window =>
                {
                    // The window closed on a single completed tap
                    self.state = State::Idle;
                    return Some(Mode::Monitor);
                }
                State::SecondPress {
                    first_at,
                    second_at,
                } if now >= first_at + self.double_tap_window => {
                    // The second press outlived the window; evaluate it as a
                    // fresh first press
                    self.state = State::FirstPress {
                        pressed_at: second_at,
                    };
                }
                State::Holding { pressed_at } if now >= pressed_at + self.hold_window => {
                    self.state = State::Idle;
                    return Some(Mode::RecordOnly);
                }
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> GestureMachine {
        GestureMachine::new(Duration::from_secs(1), Duration::from_secs(2))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_single_tap_resolves_monitor_when_window_closes() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        assert_eq!(m.on_release(t0 + ms(300)), None);
        assert_eq!(m.poll(t0 + ms(999)), None);
        assert_eq!(m.poll(t0 + ms(1000)), Some(Mode::Monitor));
        assert_eq!(m.next_deadline(), None);
    }

    #[test]
    fn test_double_tap_resolves_monitor_and_record() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        assert_eq!(m.on_release(t0 + ms(300)), None);
        assert_eq!(m.on_press(t0 + ms(500)), None);
        assert_eq!(m.on_release(t0 + ms(800)), Some(Mode::MonitorAndRecord));
        assert_eq!(m.next_deadline(), None);
    }

    #[test]
    fn test_long_hold_resolves_record_only_while_held() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        // Past the double-tap window: still held, nothing resolved yet
        assert_eq!(m.poll(t0 + ms(1000)), None);
        assert_eq!(m.next_deadline(), Some(t0 + ms(2000)));
        // Hold window closes with the button still down
        assert_eq!(m.poll(t0 + ms(2000)), Some(Mode::RecordOnly));
        // The eventual release is not a new gesture
        assert_eq!(m.on_release(t0 + ms(2500)), None);
    }

    #[test]
    fn test_medium_hold_resolves_monitor() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        assert_eq!(m.poll(t0 + ms(1200)), None);
        assert_eq!(m.on_release(t0 + ms(1500)), Some(Mode::Monitor));
    }

    #[test]
    fn test_held_second_press_restarts_evaluation() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        assert_eq!(m.on_release(t0 + ms(200)), None);
        assert_eq!(m.on_press(t0 + ms(600)), None);
        // Window closes with the second press held: no emission, the second
        // press becomes the new gesture start
        assert_eq!(m.poll(t0 + ms(1000)), None);
        assert_eq!(m.next_deadline(), Some(t0 + ms(1600)));
        // Released between the restarted double-tap and hold windows
        assert_eq!(m.on_release(t0 + ms(1800)), Some(Mode::Monitor));
    }

    #[test]
    fn test_held_second_press_can_reach_record_only() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        assert_eq!(m.on_release(t0 + ms(200)), None);
        assert_eq!(m.on_press(t0 + ms(600)), None);
        // Held all the way through the restarted hold window
        assert_eq!(m.poll(t0 + ms(2599)), None);
        assert_eq!(m.poll(t0 + ms(2600)), Some(Mode::RecordOnly));
    }

    #[test]
    fn test_press_after_expired_tap_resolves_then_restarts() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        assert_eq!(m.on_release(t0 + ms(300)), None);
        // Second press arrives after the window with no poll in between:
        // the expired tap resolves and the press starts a new gesture
        assert_eq!(m.on_press(t0 + ms(1500)), Some(Mode::Monitor));
        assert_eq!(m.next_deadline(), Some(t0 + ms(2500)));
    }

    #[test]
    fn test_late_release_still_resolves_hold() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        // No polls at all; a release past the hold window must still yield
        // the hold resolution, not a fresh Monitor
        assert_eq!(m.on_release(t0 + ms(2500)), Some(Mode::RecordOnly));
    }

    #[test]
    fn test_duplicate_edges_are_ignored() {
        let mut m = machine();
        let t0 = Instant::now();
        assert_eq!(m.on_press(t0), None);
        assert_eq!(m.on_press(t0 + ms(100)), None);
        // Deadline still keyed to the first press
        assert_eq!(m.next_deadline(), Some(t0 + ms(1000)));
        assert_eq!(m.on_release(t0 + ms(200)), None);
        assert_eq!(m.on_release(t0 + ms(250)), None);
        assert_eq!(m.poll(t0 + ms(1000)), Some(Mode::Monitor));
    }

    #[test]
    fn test_idle_machine_has_no_deadline() {
        let mut m = machine();
        assert_eq!(m.next_deadline(), None);
        assert_eq!(m.poll(Instant::now()), None);
        assert_eq!(m.on_release(Instant::now()), None);
    }
}
