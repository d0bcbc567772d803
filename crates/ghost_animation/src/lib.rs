//! Ghost Animation System
//!
//! Motion primitives for the synthetic pointer.
//!
//! # Features
//!
//! - **Easing**: normalized easing curves for tweens and keyframes
//! - **Keyframes**: single-value timed sequences (click jitter)
//! - **Cursor**: tweened pointer position with visibility
//! - **Scheduling**: `requestAnimationFrame`-style frame tokens with
//!   cancellation, deterministic or wall-clock

pub mod cursor;
pub mod easing;
pub mod keyframe;
pub mod scheduler;

pub use cursor::{CursorAnimator, CursorFrame};
pub use easing::Easing;
pub use keyframe::{Keyframe, KeyframeAnimation};
pub use scheduler::{Frame, FrameScheduler, FrameToken, ManualScheduler, SystemScheduler};
