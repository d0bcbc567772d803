//! Keyframe animations
//!
//! Single-value keyframe sequences. The cursor uses one for its click jitter
//! (press in, release back out).

use crate::easing::Easing;

/// A single keyframe in a single-value animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    /// Time position (0.0 to 1.0)
    pub time: f32,
    /// Value at this keyframe
    pub value: f32,
    /// Easing used when transitioning TO this keyframe
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, easing: Easing) -> Self {
        Self {
            time,
            value,
            easing,
        }
    }
}

/// A keyframe-based animation (single value)
#[derive(Clone, Debug)]
pub struct KeyframeAnimation {
    duration_ms: f32,
    keyframes: Vec<Keyframe>,
    current_time: f32,
    playing: bool,
}

impl KeyframeAnimation {
    /// Keyframes must be sorted by time.
    pub fn new(duration_ms: f32, keyframes: Vec<Keyframe>) -> Self {
        debug_assert!(keyframes.windows(2).all(|w| w[0].time <= w[1].time));
        Self {
            duration_ms: duration_ms.max(0.0),
            keyframes,
            current_time: 0.0,
            playing: false,
        }
    }

    pub fn start(&mut self) {
        self.current_time = 0.0;
        self.playing = true;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.current_time / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Current interpolated value
    pub fn value(&self) -> f32 {
        let Some(first) = self.keyframes.first() else {
            return 0.0;
        };

        let progress = self.progress();
        let mut prev = first;
        let mut next = first;
        for kf in &self.keyframes {
            if kf.time <= progress {
                prev = kf;
            }
            if kf.time >= progress {
                next = kf;
                break;
            }
        }

        let span = next.time - prev.time;
        if span.abs() < f32::EPSILON {
            return prev.value;
        }

        let local = (progress - prev.time) / span;
        prev.value + (next.value - prev.value) * next.easing.apply(local)
    }

    /// Advance the animation by delta time (in milliseconds)
    pub fn tick(&mut self, dt_ms: f32) {
        if !self.playing {
            return;
        }

        self.current_time += dt_ms;
        if self.current_time >= self.duration_ms {
            self.current_time = self.duration_ms;
            self.playing = false;
        }
    }
}
