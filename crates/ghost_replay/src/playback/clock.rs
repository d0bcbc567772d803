//! Scenario clock.
//!
//! Converts scheduler time into scenario time. The clock can be paused,
//! restricted to a range of the scenario and played at one of the supported
//! speeds. All positions are integer microseconds so repeated ticks do not
//! drift.

use crate::script::StepWindow;
use ghost_core::{GhostError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Supported playback rates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum PlaybackSpeed {
    Half,
    #[default]
    Normal,
    Double,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 3] = [Self::Half, Self::Normal, Self::Double];

    pub fn multiplier(self) -> f64 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
        }
    }

    /// Map a raw multiplier onto a supported speed.
    ///
    /// Anything other than 0.5, 1 or 2 is [`GhostError::InvalidSpeed`].
    pub fn from_multiplier(multiplier: f64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|speed| speed.multiplier() == multiplier)
            .ok_or(GhostError::InvalidSpeed(multiplier))
    }

    /// Scenario time covered by `elapsed` of scheduler time
    fn scale(self, elapsed: Duration) -> u64 {
        (elapsed.as_micros() as f64 * self.multiplier()).round() as u64
    }
}

impl TryFrom<f64> for PlaybackSpeed {
    type Error = GhostError;

    fn try_from(multiplier: f64) -> Result<Self> {
        Self::from_multiplier(multiplier)
    }
}

impl From<PlaybackSpeed> for f64 {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.multiplier()
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

/// Result of a clock update
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockTick {
    /// Scenario time advanced by this update
    pub delta: Duration,
    /// The clock is at the end of its range
    pub reached_end: bool,
}

/// Scenario-time clock driven by scheduler timestamps.
#[derive(Debug)]
pub struct PlaybackClock {
    /// Current scenario position in microseconds
    position: u64,
    /// Full scenario length in microseconds
    duration: u64,
    range: StepWindow,
    /// Range end in microseconds
    end: u64,
    speed: PlaybackSpeed,
    running: bool,
    /// Scheduler time of the last update while running
    last_update: Option<Duration>,
    /// Time folded in by a speed change, reported on the next update
    carry: u64,
}

impl PlaybackClock {
    pub fn new(duration: Duration) -> Self {
        Self::with_range(duration, StepWindow::FULL)
    }

    /// Clock positioned at `range.start` that stops at `range.end`.
    /// Durations beyond `u64::MAX` microseconds saturate.
    pub fn with_range(duration: Duration, range: StepWindow) -> Self {
        let duration = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        let at = |fraction: f32| (duration as f64 * f64::from(fraction)).round() as u64;

        Self {
            position: at(range.start),
            duration,
            range,
            end: at(range.end),
            speed: PlaybackSpeed::Normal,
            running: false,
            last_update: None,
            carry: 0,
        }
    }

    pub fn position(&self) -> Duration {
        Duration::from_micros(self.position)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.duration)
    }

    pub fn range(&self) -> StepWindow {
        self.range
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Scenario progress. Exactly the range end once it has been reached.
    pub fn progress(&self) -> f32 {
        if self.is_at_end() {
            return self.range.end;
        }
        if self.duration == 0 {
            return self.range.start;
        }
        (self.position as f64 / self.duration as f64) as f32
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.end
    }

    /// Change speed. Time elapsed so far is folded in at the old speed, so
    /// only the remaining run is scaled.
    pub fn set_speed(&mut self, speed: PlaybackSpeed, now: Duration) {
        self.carry += self.advance_to(now);
        self.speed = speed;
    }

    /// Start or resume counting from `now`
    pub fn play(&mut self, now: Duration) {
        if !self.running && !self.is_at_end() {
            self.running = true;
            self.last_update = Some(now);
        }
    }

    /// Stop counting. Time since the last update is dropped.
    pub fn pause(&mut self) {
        self.running = false;
        self.last_update = None;
    }

    /// Advance to scheduler time `now`.
    ///
    /// `reached_end` stays true on every update once the end is hit.
    pub fn update(&mut self, now: Duration) -> ClockTick {
        let advanced = std::mem::take(&mut self.carry) + self.advance_to(now);
        ClockTick {
            delta: Duration::from_micros(advanced),
            reached_end: self.is_at_end(),
        }
    }

    fn advance_to(&mut self, now: Duration) -> u64 {
        let Some(last) = self.last_update.filter(|_| self.running) else {
            return 0;
        };

        let scaled = self.speed.scale(now.saturating_sub(last));
        let before = self.position;
        self.position = self.position.saturating_add(scaled).min(self.end);
        self.last_update = Some(now);

        if self.is_at_end() {
            self.running = false;
            self.last_update = None;
        }
        self.position - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_speed_from_multiplier() {
        assert_eq!(PlaybackSpeed::from_multiplier(0.5).unwrap(), PlaybackSpeed::Half);
        assert_eq!(PlaybackSpeed::from_multiplier(2.0).unwrap(), PlaybackSpeed::Double);
        assert!(matches!(
            PlaybackSpeed::from_multiplier(1.5),
            Err(GhostError::InvalidSpeed(v)) if v == 1.5
        ));
        assert_eq!(PlaybackSpeed::Half.to_string(), "0.5x");
    }

    #[test]
    fn test_speed_serde() {
        let speed: PlaybackSpeed = serde_json::from_str("2.0").unwrap();
        assert_eq!(speed, PlaybackSpeed::Double);
        assert!(serde_json::from_str::<PlaybackSpeed>("3.0").is_err());
    }

    #[test]
    fn test_update_advances_while_running() {
        let mut clock = PlaybackClock::new(ms(1000));
        assert_eq!(clock.update(ms(100)), ClockTick::default());

        clock.play(ms(100));
        let tick = clock.update(ms(350));
        assert_eq!(tick.delta, ms(250));
        assert!(!tick.reached_end);
        assert_eq!(clock.progress(), 0.25);
    }

    #[test]
    fn test_stops_at_end() {
        let mut clock = PlaybackClock::new(ms(1000));
        clock.play(Duration::ZERO);

        let tick = clock.update(ms(1500));
        assert!(tick.reached_end);
        assert_eq!(tick.delta, ms(1000));
        assert_eq!(clock.progress(), 1.0);
        assert!(!clock.is_running());

        let tick = clock.update(ms(1600));
        assert!(tick.reached_end);
        assert_eq!(tick.delta, Duration::ZERO);
    }

    #[test]
    fn test_pause_drops_elapsed_time() {
        let mut clock = PlaybackClock::new(ms(1000));
        clock.play(Duration::ZERO);
        clock.update(ms(200));
        clock.pause();

        assert_eq!(clock.update(ms(900)).delta, Duration::ZERO);
        clock.play(ms(900));
        clock.update(ms(1000));
        assert_eq!(clock.position(), ms(300));
    }

    #[test]
    fn test_set_speed_scales_remaining() {
        let mut clock = PlaybackClock::new(ms(1000));
        clock.play(Duration::ZERO);
        clock.set_speed(PlaybackSpeed::Double, ms(400));
        assert_eq!(clock.position(), ms(400));

        // Folded time is still reported as this update's delta
        assert_eq!(clock.update(ms(500)).delta, ms(600));
        assert_eq!(clock.position(), ms(600));

        clock.set_speed(PlaybackSpeed::Half, ms(500));
        clock.update(ms(700));
        assert_eq!(clock.position(), ms(700));
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let mut clock = PlaybackClock::new(Duration::MAX);
        assert_eq!(clock.duration(), Duration::from_micros(u64::MAX));

        clock.play(Duration::ZERO);
        let tick = clock.update(ms(1000));
        assert!(!tick.reached_end);
        assert_eq!(clock.position(), ms(1000));
    }

    #[test]
    fn test_range() {
        let mut clock = PlaybackClock::with_range(ms(2000), StepWindow::new(0.3, 0.6));
        assert_eq!(clock.position(), ms(600));
        assert_eq!(clock.progress(), 0.3);

        clock.play(Duration::ZERO);
        let tick = clock.update(ms(1000));
        assert!(tick.reached_end);
        assert_eq!(tick.delta, ms(600));
        assert_eq!(clock.progress(), 0.6);
    }
}
