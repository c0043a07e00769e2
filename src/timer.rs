//! Attempt countdown
//!
//! The countdown is driven by alarms: the host owns the actual clock and
//! delivers each scheduled [`AlarmMessage`] back through
//! [`crate::attempt::Attempt::receive_alarm`]. Every alarm carries the
//! generation it was scheduled under, so stopping the timer invalidates any
//! tick still queued on the host side.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::{
    constants::timer::TICK_SECONDS,
    quiz::{config::Settings, navigation::Mode},
};

/// Alarm messages scheduled by the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second has elapsed
    Tick {
        /// Generation of the timer run that scheduled this tick
        generation: u64,
    },
}

/// What a delivered tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown moved to this many remaining seconds
    Ticked(u32),
    /// The countdown reached zero; reported once per timer
    Expired,
    /// The tick was stale, the timer stopped, or no limit applies
    Ignored,
}

/// Countdown notifications for the learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdateMessage {
    /// The countdown moved
    TimeRemaining {
        /// Seconds left
        seconds: u32,
        /// Seconds left as a clock
        clock: String,
    },
    /// The countdown reached zero; the attempt is being submitted
    TimeUp,
}

impl UpdateMessage {
    /// The notification for `seconds` remaining
    pub fn remaining(seconds: u32) -> Self {
        Self::TimeRemaining {
            seconds,
            clock: format_clock(u64::from(seconds)),
        }
    }
}

/// Countdown of the remaining attempt time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerController {
    remaining: Option<u32>,
    running: bool,
    expired: bool,
    generation: u64,
}

impl TimerController {
    /// Creates a timer with a fixed number of seconds, or none for no limit
    pub fn new(remaining: Option<u32>) -> Self {
        Self {
            remaining,
            ..Self::default()
        }
    }

    /// Computes the starting value from settings and an optional snapshot
    ///
    /// `restored` is `None` when no snapshot exists and `Some(value)` with
    /// the snapshot's remaining time otherwise. A restored value never
    /// exceeds the configured limit and is discarded when the quiz has no
    /// limit. In locking modes a snapshot without a timer is overridden by
    /// the configured limit, so a resume cannot shed the countdown.
    ///
    /// # Arguments
    ///
    /// * `settings` - The quiz settings holding the time limit
    /// * `restored` - The remaining time found in the snapshot, if any
    /// * `mode` - The attempt's navigation mode
    pub fn configure(settings: &Settings, restored: Option<Option<u32>>, mode: Mode) -> Self {
        let Some(limit) = settings.time_limit_seconds() else {
            return Self::new(None);
        };
        Self::new(match restored {
            None => Some(limit),
            Some(Some(remaining)) => Some(remaining.min(limit)),
            Some(None) if mode.locks_answers() => Some(limit),
            Some(None) => None,
        })
    }

    /// Remaining seconds, or `None` without a time limit
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// Whether ticks are currently being scheduled
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the countdown has reached zero
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Starts ticking if there is time left
    ///
    /// # Arguments
    ///
    /// * `schedule_message` - Function to schedule the next tick
    ///
    /// # Returns
    ///
    /// `true` if a tick was scheduled
    pub fn start<S: FnMut(crate::AlarmMessage, Duration)>(&mut self, schedule_message: S) -> bool {
        if self.running || self.expired || !self.remaining.is_some_and(|r| r > 0) {
            return false;
        }
        self.running = true;
        self.schedule_tick(schedule_message);
        true
    }

    /// Marks a restored zero as expired
    ///
    /// # Returns
    ///
    /// `true` exactly once when the timer holds zero seconds and has not
    /// yet reported expiry
    pub fn expire_if_elapsed(&mut self) -> bool {
        if self.remaining == Some(0) && !self.expired {
            self.expired = true;
            self.running = false;
            true
        } else {
            false
        }
    }

    /// Handles a delivered tick
    ///
    /// # Arguments
    ///
    /// * `message` - The alarm that fired
    /// * `schedule_message` - Function to schedule the following tick
    pub fn receive_alarm<S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        schedule_message: S,
    ) -> TickOutcome {
        let AlarmMessage::Tick { generation } = message;
        if !self.running || self.expired || generation != self.generation {
            return TickOutcome::Ignored;
        }
        let Some(remaining) = self.remaining else {
            return TickOutcome::Ignored;
        };

        let remaining = remaining.saturating_sub(1);
        self.remaining = Some(remaining);
        if remaining == 0 {
            self.expired = true;
            self.stop();
            TickOutcome::Expired
        } else {
            self.schedule_tick(schedule_message);
            TickOutcome::Ticked(remaining)
        }
    }

    /// Stops ticking; ticks already queued become stale
    pub fn stop(&mut self) {
        self.running = false;
        self.generation = self.generation.wrapping_add(1);
    }

    fn schedule_tick<S: FnMut(crate::AlarmMessage, Duration)>(&self, mut schedule_message: S) {
        schedule_message(
            AlarmMessage::Tick {
                generation: self.generation,
            }
            .into(),
            Duration::from_secs(TICK_SECONDS),
        );
    }
}

/// Formats seconds as `MM:SS`, or `H:MM:SS` from one hour up
pub fn format_clock(seconds: u64) -> String {
    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn settings(minutes: Option<u32>) -> Settings {
        Settings {
            time_limit_minutes: minutes,
            ..Settings::default()
        }
    }

    fn tick(generation: u64) -> AlarmMessage {
        AlarmMessage::Tick { generation }
    }

    #[test]
    fn test_expires_exactly_once() {
        let mut timer = TimerController::new(Some(1));
        let mut scheduled = Vec::new();
        assert!(timer.start(|message, _| scheduled.push(message)));
        assert_eq!(scheduled.len(), 1);

        let mut expirations = 0;
        for _ in 0..3 {
            if timer.receive_alarm(tick(0), |message, _| scheduled.push(message))
                == TickOutcome::Expired
            {
                expirations += 1;
            }
        }

        assert_eq!(timer.remaining(), Some(0));
        assert_eq!(expirations, 1);
        assert!(timer.is_expired());
        assert!(!timer.is_running());
        assert_eq!(scheduled.len(), 1);
    }

    #[test]
    fn test_ticks_decrement_by_one() {
        let mut timer = TimerController::new(Some(3));
        let mut delays = Vec::new();
        timer.start(|_, delay| delays.push(delay));
        assert_eq!(
            timer.receive_alarm(tick(0), |_, delay| delays.push(delay)),
            TickOutcome::Ticked(2)
        );
        assert_eq!(
            timer.receive_alarm(tick(0), |_, delay| delays.push(delay)),
            TickOutcome::Ticked(1)
        );
        assert!(delays.iter().all(|d| *d == Duration::from_secs(1)));
    }

    #[test]
    fn test_stop_invalidates_queued_ticks() {
        let mut timer = TimerController::new(Some(10));
        timer.start(|_, _| {});
        timer.stop();
        assert_eq!(timer.receive_alarm(tick(0), |_, _| {}), TickOutcome::Ignored);
        assert_eq!(timer.remaining(), Some(10));

        let mut scheduled = Vec::new();
        timer.start(|message, _| scheduled.push(message));
        assert_eq!(scheduled, vec![crate::AlarmMessage::Timer(tick(1))]);
        assert_eq!(timer.receive_alarm(tick(0), |_, _| {}), TickOutcome::Ignored);
        assert_eq!(timer.receive_alarm(tick(1), |_, _| {}), TickOutcome::Ticked(9));
    }

    #[test]
    fn test_no_limit_never_ticks() {
        let mut timer = TimerController::configure(&settings(None), Some(Some(50)), Mode::Exam);
        assert_eq!(timer.remaining(), None);
        assert!(!timer.start(|_, _| {}));
        assert_eq!(timer.receive_alarm(tick(0), |_, _| {}), TickOutcome::Ignored);
    }

    #[test]
    fn test_configure_from_settings_and_snapshot() {
        let limited = settings(Some(2));
        assert_eq!(
            TimerController::configure(&limited, None, Mode::Practice).remaining(),
            Some(120)
        );
        assert_eq!(
            TimerController::configure(&limited, Some(Some(45)), Mode::Practice).remaining(),
            Some(45)
        );
        assert_eq!(
            TimerController::configure(&limited, Some(Some(9_999)), Mode::Practice).remaining(),
            Some(120)
        );
        assert_eq!(
            TimerController::configure(&limited, Some(None), Mode::Practice).remaining(),
            None
        );
        assert_eq!(
            TimerController::configure(&limited, Some(None), Mode::Test).remaining(),
            Some(120)
        );
        assert_eq!(
            TimerController::configure(&limited, Some(None), Mode::Exam).remaining(),
            Some(120)
        );
    }

    #[test]
    fn test_restored_zero_expires_once() {
        let mut timer = TimerController::new(Some(0));
        assert!(!timer.start(|_, _| {}));
        assert!(timer.expire_if_elapsed());
        assert!(!timer.expire_if_elapsed());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3_725), "1:02:05");
    }
}
