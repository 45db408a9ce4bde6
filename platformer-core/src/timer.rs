// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Bounded clocks with time-marked callbacks
//!
//! A [`Timer`] advances from `0` to a fixed duration and saturates there.
//! Every bounded-duration effect in the simulation (dash lengths, cooldowns,
//! recovery windows, cull delays) is modelled with one.

use crate::error::TimerError;
use std::fmt;

/// A one-shot callback fired when a timer's clock crosses `mark`
pub struct TimeMark {
    mark: f32,
    action: Box<dyn FnMut()>,
    fired: bool,
}

impl TimeMark {
    /// Create a mark at `mark` seconds
    pub fn new(mark: f32, action: impl FnMut() + 'static) -> Self {
        TimeMark {
            mark,
            action: Box::new(action),
            fired: false,
        }
    }

    /// Time at which this mark fires
    pub fn mark(&self) -> f32 {
        self.mark
    }

    /// Whether the mark has fired since the last reset
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl fmt::Debug for TimeMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeMark")
            .field("mark", &self.mark)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}

/// Monotonic clock from `0` to `duration`
///
/// # Examples
///
/// ```
/// use platformer_core::Timer;
///
/// let mut timer = Timer::new(0.5).unwrap();
/// timer.update(0.3);
/// assert!(!timer.is_finished());
/// timer.update(0.3);
/// assert!(timer.is_just_finished());
/// assert_eq!(timer.time(), 0.5);
/// ```
#[derive(Debug)]
pub struct Timer {
    duration: f32,
    time: f32,
    just_finished: bool,
    marks: Vec<TimeMark>,
}

fn check_duration(duration: f32) -> Result<(), TimerError> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(TimerError::InvalidDuration(duration));
    }
    Ok(())
}

impl Timer {
    /// Create a timer at its beginning
    pub fn new(duration: f32) -> Result<Self, TimerError> {
        Self::with_marks(duration, Vec::new())
    }

    /// Create a timer with time-marked callbacks
    ///
    /// Every mark must lie in `[0, duration]`.
    pub fn with_marks(duration: f32, mut marks: Vec<TimeMark>) -> Result<Self, TimerError> {
        check_duration(duration)?;
        if let Some(bad) = marks.iter().find(|m| !(0.0..=duration).contains(&m.mark)) {
            return Err(TimerError::MarkOutOfRange {
                mark: bad.mark,
                duration,
            });
        }
        marks.sort_by(|a, b| a.mark.total_cmp(&b.mark));
        Ok(Timer {
            duration,
            time: 0.0,
            just_finished: false,
            marks,
        })
    }

    /// Create a timer that starts already finished
    ///
    /// Useful for cooldowns that should not block the first use.
    pub fn finished(duration: f32) -> Result<Self, TimerError> {
        let mut timer = Self::new(duration)?;
        timer.set_to_end();
        Ok(timer)
    }

    /// Advance the clock by `delta` seconds, saturating at the duration
    ///
    /// Negative and NaN deltas count as zero, so the clock never runs
    /// backwards. Armed marks at or below the new time fire in ascending
    /// order. Returns whether the timer is finished after the update.
    pub fn update(&mut self, delta: f32) -> bool {
        let was_finished = self.is_finished();
        self.time = (self.time + delta.max(0.0)).min(self.duration);
        let time = self.time;
        for mark in self.marks.iter_mut().filter(|m| !m.fired && m.mark <= time) {
            mark.fired = true;
            (mark.action)();
        }
        self.just_finished = !was_finished && self.is_finished();
        self.is_finished()
    }

    /// Rewind to the beginning and re-arm every mark
    ///
    /// Returns whether the timer was finished before the reset.
    pub fn reset(&mut self) -> bool {
        let was_finished = self.is_finished();
        self.time = 0.0;
        self.just_finished = false;
        for mark in &mut self.marks {
            mark.fired = false;
        }
        was_finished
    }

    /// Jump to the end without firing pending marks
    ///
    /// Marks still armed fire on the next [`update`](Self::update).
    pub fn set_to_end(&mut self) {
        self.time = self.duration;
        self.just_finished = false;
    }

    /// Change the duration, clamping the current time to it
    pub fn set_duration(&mut self, duration: f32) -> Result<(), TimerError> {
        check_duration(duration)?;
        if let Some(bad) = self.marks.iter().find(|m| m.mark > duration) {
            return Err(TimerError::MarkOutOfRange {
                mark: bad.mark,
                duration,
            });
        }
        self.duration = duration;
        self.time = self.time.min(duration);
        Ok(())
    }

    /// Elapsed time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Total duration in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Elapsed fraction in `[0, 1]`; `0` for a zero-length timer
    pub fn ratio(&self) -> f32 {
        if self.duration == 0.0 {
            0.0
        } else {
            (self.time / self.duration).clamp(0.0, 1.0)
        }
    }

    /// True while no time has elapsed
    pub fn is_at_beginning(&self) -> bool {
        self.time == 0.0
    }

    /// True once the clock has reached the duration
    pub fn is_finished(&self) -> bool {
        self.time >= self.duration
    }

    /// True only for the update that crossed into finished
    pub fn is_just_finished(&self) -> bool {
        self.just_finished
    }

    /// Registered marks in ascending order
    pub fn marks(&self) -> &[TimeMark] {
        &self.marks
    }
}
