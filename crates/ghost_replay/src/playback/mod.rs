//! Playback control.
//!
//! - [`PlaybackClock`] turns scheduler time into scenario time at a
//!   [`PlaybackSpeed`]
//! - [`PlaybackController`] owns the single active run and its frame token
//!
//! # Example
//!
//! ```
//! use ghost_animation::ManualScheduler;
//! use ghost_replay::{PlaybackController, RecordingHost, ScenarioCatalog, StaticLayout};
//! use std::sync::Arc;
//!
//! let mut layout = StaticLayout::demo_storefront();
//! layout.mount("checkout");
//!
//! let mut controller = PlaybackController::new(
//!     Arc::new(ScenarioCatalog::builtin()),
//!     layout,
//!     RecordingHost::new(),
//!     ManualScheduler::new(),
//! );
//! controller.play("Apply SAVE20").unwrap();
//! while controller.advance_frame() {}
//!
//! assert_eq!(controller.host().completions(), ["Apply SAVE20"]);
//! ```

mod clock;
mod controller;

pub use clock::{ClockTick, PlaybackClock, PlaybackSpeed};
pub use controller::{Command, PlaybackConfig, PlaybackController, PlaybackState, RunStats};
