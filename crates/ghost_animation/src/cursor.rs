//! Synthetic pointer
//!
//! The cursor owns a position and a visibility flag. Movement is a tween from
//! the last known point to the centroid of a target rectangle; presses are a
//! short diagonal jitter layered on top of the base position.

use crate::easing::Easing;
use crate::keyframe::{Keyframe, KeyframeAnimation};
use ghost_core::{Point, Rect};
use serde::Serialize;
use std::time::Duration;

/// Jitter distance of a simulated press, in logical pixels
pub const CLICK_JITTER_PX: f32 = 3.0;

/// Duration of a simulated press (move in, move back)
pub const CLICK_DURATION: Duration = Duration::from_millis(120);

/// Snapshot handed to the render layer
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CursorFrame {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

#[derive(Clone, Copy, Debug)]
struct Tween {
    from: Point,
    to: Point,
    duration: Duration,
    elapsed: Duration,
}

impl Tween {
    fn fraction(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

/// Tweened pointer with click jitter
pub struct CursorAnimator {
    home: Point,
    base: Point,
    visible: bool,
    easing: Easing,
    tween: Option<Tween>,
    press: KeyframeAnimation,
}

impl CursorAnimator {
    pub fn new(home: Point) -> Self {
        Self {
            home,
            base: home,
            visible: false,
            easing: Easing::Linear,
            tween: None,
            press: press_animation(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Current position including any press jitter
    pub fn position(&self) -> Point {
        let jitter = self.press.value();
        self.base.offset(jitter, jitter)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn frame(&self) -> CursorFrame {
        let position = self.position();
        CursorFrame {
            x: position.x,
            y: position.y,
            visible: self.visible,
        }
    }

    pub fn is_tweening(&self) -> bool {
        self.tween.is_some()
    }

    pub fn is_pressing(&self) -> bool {
        self.press.is_playing()
    }

    /// Start moving from the last known point to the centroid of `target`.
    ///
    /// A zero duration jumps straight there.
    pub fn tween_to(&mut self, target: Rect, duration: Duration) {
        let to = target.center();
        if duration.is_zero() {
            self.base = to;
            self.tween = None;
            return;
        }
        self.tween = Some(Tween {
            from: self.base,
            to,
            duration,
            elapsed: Duration::ZERO,
        });
    }

    /// Follow a target whose geometry moved. Elapsed tween time is kept; an
    /// idle cursor snaps to the new centroid.
    pub fn retarget(&mut self, target: Rect) {
        let to = target.center();
        match self.tween.as_mut() {
            Some(tween) => {
                tween.to = to;
                self.base = tween.from.lerp(to, self.easing.apply(tween.fraction()));
            }
            None => self.base = to,
        }
    }

    /// Stop any tween in flight, holding the current base position
    pub fn halt(&mut self) {
        self.tween = None;
    }

    /// Start the press jitter
    pub fn click(&mut self) {
        self.press.start();
    }

    /// Advance tween and press by `dt` of scenario time; returns the new
    /// position.
    pub fn advance(&mut self, dt: Duration) -> Point {
        if let Some(tween) = self.tween.as_mut() {
            tween.elapsed += dt;
            let t = tween.fraction();
            self.base = tween.from.lerp(tween.to, self.easing.apply(t));
            if t >= 1.0 {
                self.base = tween.to;
                self.tween = None;
            }
        }
        self.press.tick(dt.as_secs_f32() * 1000.0);
        self.position()
    }

    /// Back to the home position, hidden, with nothing in flight
    pub fn reset(&mut self) {
        self.base = self.home;
        self.tween = None;
        self.press = press_animation();
        self.visible = false;
    }
}

fn press_animation() -> KeyframeAnimation {
    KeyframeAnimation::new(
        CLICK_DURATION.as_secs_f32() * 1000.0,
        vec![
            Keyframe::new(0.0, 0.0, Easing::Linear),
            Keyframe::new(0.5, CLICK_JITTER_PX, Easing::EaseOutQuad),
            Keyframe::new(1.0, 0.0, Easing::EaseInQuad),
        ],
    )
}
