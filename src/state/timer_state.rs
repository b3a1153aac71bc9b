//! Rest-timer countdown state machine
//!
//! Pure state: the 1-second tick cadence is supplied by the rest ticker task,
//! which feeds `tick()` calls through the session engine queue. Keeping the
//! countdown arithmetic out of the task makes the exactly-once expiry
//! contract testable without a runtime.

use serde::{Deserialize, Serialize};

/// Snapshot of the countdown, shared with the API layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub running: bool,
}

/// Raised at most once per start/reset cycle, on natural expiry or skip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Expired,
}

/// Countdown clock for the rest between sets.
///
/// Owned exclusively by the session runner while the phase is `Resting`;
/// torn down and recreated each time rest begins.
#[derive(Debug, Clone)]
pub struct RestTimer {
    total_seconds: u64,
    remaining_seconds: u64,
    running: bool,
    /// Latch ensuring the expiry signal fires exactly once per cycle
    expired: bool,
}

impl RestTimer {
    /// Start a countdown. A zero duration expires immediately: the returned
    /// signal is `Expired` and no tick is needed.
    pub fn start(total_seconds: u64) -> (Self, Option<TimerSignal>) {
        let mut timer = Self {
            total_seconds,
            remaining_seconds: total_seconds,
            running: true,
            expired: false,
        };
        let signal = if total_seconds == 0 {
            Some(timer.expire())
        } else {
            None
        };
        (timer, signal)
    }

    /// Re-arm the countdown without starting it; the caller decides when to
    /// set it running via `resume`.
    pub fn reset(&mut self, total_seconds: u64) {
        self.total_seconds = total_seconds;
        self.remaining_seconds = total_seconds;
        self.running = false;
        self.expired = false;
    }

    /// One second elapsed. Decrements toward zero; on reaching zero the
    /// timer stops and the expiry signal is raised. Ticks while paused or
    /// after expiry are ignored, so a stale in-flight tick is harmless.
    pub fn tick(&mut self) -> Option<TimerSignal> {
        if !self.running || self.expired {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            Some(self.expire())
        } else {
            None
        }
    }

    /// Cut the rest short. Raises the expiry signal unless it already fired.
    pub fn skip(&mut self) -> Option<TimerSignal> {
        self.remaining_seconds = 0;
        if self.expired {
            self.running = false;
            None
        } else {
            Some(self.expire())
        }
    }

    /// Freeze the countdown; `remaining_seconds` is untouched.
    pub fn pause(&mut self) {
        if !self.expired {
            self.running = false;
        }
    }

    pub fn resume(&mut self) {
        if !self.expired {
            self.running = true;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn snapshot(&self) -> TimerState {
        TimerState {
            total_seconds: self.total_seconds,
            remaining_seconds: self.remaining_seconds,
            running: self.running,
        }
    }

    fn expire(&mut self) -> TimerSignal {
        self.running = false;
        self.expired = true;
        TimerSignal::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_countdown_expires_exactly_once() {
        let (mut timer, signal) = RestTimer::start(60);
        assert!(signal.is_none());

        let mut expiries = 0;
        for _ in 0..60 {
            if timer.tick() == Some(TimerSignal::Expired) {
                expiries += 1;
            }
        }
        assert_eq!(expiries, 1);
        assert_eq!(timer.snapshot().remaining_seconds, 0);
        assert!(!timer.is_running());

        // Further ticks stay silent and floored at zero
        assert!(timer.tick().is_none());
        assert_eq!(timer.snapshot().remaining_seconds, 0);
    }

    #[test]
    fn skip_mid_countdown_signals_once() {
        let (mut timer, _) = RestTimer::start(30);
        for _ in 0..10 {
            assert!(timer.tick().is_none());
        }
        assert_eq!(timer.skip(), Some(TimerSignal::Expired));
        assert_eq!(timer.snapshot().remaining_seconds, 0);

        // A second skip after expiry raises nothing
        assert!(timer.skip().is_none());
    }

    #[test]
    fn zero_duration_expires_immediately() {
        let (timer, signal) = RestTimer::start(0);
        assert_eq!(signal, Some(TimerSignal::Expired));
        assert!(!timer.is_running());
    }

    #[test]
    fn pause_freezes_remaining() {
        let (mut timer, _) = RestTimer::start(20);
        timer.tick();
        timer.pause();
        assert!(!timer.is_running());
        assert!(timer.tick().is_none());
        assert_eq!(timer.snapshot().remaining_seconds, 19);

        timer.resume();
        assert!(timer.is_running());
        timer.tick();
        assert_eq!(timer.snapshot().remaining_seconds, 18);
    }

    #[test]
    fn skip_after_natural_expiry_is_silent() {
        let (mut timer, _) = RestTimer::start(1);
        assert_eq!(timer.tick(), Some(TimerSignal::Expired));
        assert!(timer.skip().is_none());
    }

    #[test]
    fn reset_rearms_without_running() {
        let (mut timer, _) = RestTimer::start(5);
        timer.skip();
        timer.reset(45);
        let snap = timer.snapshot();
        assert_eq!(snap.total_seconds, 45);
        assert_eq!(snap.remaining_seconds, 45);
        assert!(!snap.running);

        timer.resume();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.snapshot().remaining_seconds, 44);
    }
}
