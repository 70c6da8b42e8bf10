#![forbid(unsafe_code)]

//! Progress clock: pausable 0→1 signal for the active story item.
//!
//! A [`ProgressClock`] advances a normalized value over a duration using
//! explicit `tick(dt)` calls, so it is independent of render frame rate and
//! of the wall clock. Pausing freezes the value in place; resuming animates
//! from that frozen value to `1.0` over exactly the remaining time.
//!
//! # Invariants
//!
//! 1. `value()` is always in `[0.0, 1.0]`.
//! 2. `tick()` only advances in `Playing` state.
//! 3. `ClockStep::Completed` is returned by exactly one tick per uninterrupted
//!    run; later ticks are no-ops.
//! 4. A segment that starts at value `v` with duration `r` reaches `1.0`
//!    after exactly `r` of ticked time, regardless of how the ticks are
//!    split.
//! 5. Remaining time is re-derived from each fresh capture; nothing is
//!    carried over from earlier segments.
//! 6. The completing tick records the part of its `dt` past `1.0` in
//!    [`ProgressClock::leftover`], so a caller can carry it into the next run.
//!
//! # Failure Modes
//!
//! - Zero duration: clamped to 1ns to avoid division by zero.
//! - `resume()` outside `Paused`: no-op.

use std::time::Duration;

/// Floor for segment durations.
const MIN_SEGMENT: Duration = Duration::from_nanos(1);

/// Playback state of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// Not started, or stopped.
    Idle,
    /// Actively advancing.
    Playing,
    /// Frozen at the captured value.
    Paused,
    /// Reached `1.0`.
    Finished,
}

/// Outcome of a single [`ProgressClock::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStep {
    /// Nothing happened (not playing).
    Idle,
    /// Value advanced but has not reached `1.0`.
    Advanced,
    /// This tick reached `1.0`. Reported once per run.
    Completed,
}

/// Time left after pausing a `duration`-long item at `value`.
///
/// Rounded to the nearest nanosecond so that repeated captures never
/// accumulate truncation error.
#[must_use]
pub fn remaining_after_capture(duration: Duration, value: f64) -> Duration {
    let left = (1.0 - value.clamp(0.0, 1.0)).max(0.0);
    let nanos = (duration.as_nanos() as f64 * left).round();
    if nanos <= 0.0 {
        Duration::ZERO
    } else {
        Duration::from_nanos(nanos as u64).min(duration)
    }
}

/// Pausable progress signal.
///
/// The clock animates one *segment* at a time: `start` opens a segment from
/// `0.0`, `resume` opens a segment from the value frozen by
/// `stop_and_capture`. Within a segment the value is
/// `from + (1 - from) * elapsed / segment_duration`.
#[derive(Debug, Clone)]
pub struct ProgressClock {
    state: ClockState,
    /// Full duration of the current item.
    duration: Duration,
    /// Value at which the current segment began.
    from: f64,
    segment_duration: Duration,
    segment_elapsed: Duration,
    /// Unused part of the completing tick's `dt`.
    leftover: Duration,
}

impl ProgressClock {
    /// Create an idle clock at value `0.0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ClockState::Idle,
            duration: MIN_SEGMENT,
            from: 0.0,
            segment_duration: MIN_SEGMENT,
            segment_elapsed: Duration::ZERO,
            leftover: Duration::ZERO,
        }
    }

    /// Animate `0 → 1` over `duration`, discarding any previous run.
    pub fn start(&mut self, duration: Duration) {
        let duration = duration.max(MIN_SEGMENT);
        self.duration = duration;
        self.from = 0.0;
        self.segment_duration = duration;
        self.segment_elapsed = Duration::ZERO;
        self.leftover = Duration::ZERO;
        self.state = ClockState::Playing;
    }

    /// Freeze the animation and return the instantaneous value.
    ///
    /// In any state other than `Playing` this only reports the current value.
    pub fn stop_and_capture(&mut self) -> f64 {
        let value = self.value();
        if self.state == ClockState::Playing {
            self.from = value;
            self.segment_elapsed = Duration::ZERO;
            self.segment_duration = MIN_SEGMENT;
            self.state = ClockState::Paused;
        }
        value
    }

    /// Continue from the frozen value toward `1.0` over exactly `remaining`.
    ///
    /// No-op unless paused.
    pub fn resume(&mut self, remaining: Duration) {
        if self.state != ClockState::Paused {
            return;
        }
        self.segment_duration = remaining.max(MIN_SEGMENT);
        self.segment_elapsed = Duration::ZERO;
        self.leftover = Duration::ZERO;
        self.state = ClockState::Playing;
    }

    /// Reset to idle at `0.0`.
    pub fn stop(&mut self) {
        self.state = ClockState::Idle;
        self.from = 0.0;
        self.segment_elapsed = Duration::ZERO;
        self.leftover = Duration::ZERO;
    }

    /// Advance by `dt` of logical time.
    pub fn tick(&mut self, dt: Duration) -> ClockStep {
        if self.state != ClockState::Playing {
            return ClockStep::Idle;
        }
        self.segment_elapsed = self.segment_elapsed.saturating_add(dt);
        if self.segment_elapsed >= self.segment_duration {
            self.leftover = self.segment_elapsed - self.segment_duration;
            self.segment_elapsed = self.segment_duration;
            self.from = 1.0;
            self.state = ClockState::Finished;
            return ClockStep::Completed;
        }
        ClockStep::Advanced
    }

    /// Current progress in `[0.0, 1.0]`.
    #[must_use]
    pub fn value(&self) -> f64 {
        match self.state {
            ClockState::Playing => {
                let t = self.segment_elapsed.as_secs_f64() / self.segment_duration.as_secs_f64();
                (self.from + (1.0 - self.from) * t).clamp(0.0, 1.0)
            }
            ClockState::Finished => 1.0,
            ClockState::Idle | ClockState::Paused => self.from.clamp(0.0, 1.0),
        }
    }

    /// Time until the current segment reaches `1.0`.
    ///
    /// While paused this is derived from the frozen value and the item's
    /// full duration.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        match self.state {
            ClockState::Playing => self.segment_duration.saturating_sub(self.segment_elapsed),
            ClockState::Paused => remaining_after_capture(self.duration, self.from),
            ClockState::Finished => Duration::ZERO,
            ClockState::Idle => self.duration,
        }
    }

    /// Time past `1.0` on the tick that completed the run; zero otherwise.
    ///
    /// Always strictly less than that tick's `dt`.
    #[inline]
    #[must_use]
    pub fn leftover(&self) -> Duration {
        self.leftover
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Full duration of the current item.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for ProgressClock {
    fn default() -> Self {
        Self::new()
    }
}
