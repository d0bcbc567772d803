//! Deterministic headless playback.
//!
//! Runs a scenario to completion on a [`ManualScheduler`] with a fixed frame
//! interval, recording every host callback. Used by the CLI and by tests that
//! need a full run without a display.

use super::report::RunReport;
use crate::host::RecordingHost;
use crate::playback::{PlaybackConfig, PlaybackController, PlaybackSpeed, PlaybackState};
use crate::resolver::StaticLayout;
use crate::script::ScenarioCatalog;
use ghost_animation::{Easing, ManualScheduler};
use ghost_core::{GhostError, Point, Result};
use std::sync::Arc;
use std::time::Duration;

/// Controller type driven by the headless runner
pub type HeadlessController = PlaybackController<StaticLayout, RecordingHost, ManualScheduler>;

/// Configuration for deterministic headless runs
#[derive(Clone, Copy, Debug)]
pub struct HeadlessConfig {
    /// Logical milliseconds between frames
    pub tick_ms: u64,
    /// Frame budget before a run counts as stalled
    pub max_frames: u64,
    pub speed: PlaybackSpeed,
    pub easing: Easing,
    /// Where the cursor rests before a run
    pub cursor_home: Point,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            max_frames: 10_000,
            speed: PlaybackSpeed::Normal,
            easing: Easing::Linear,
            cursor_home: Point::ZERO,
        }
    }
}

impl HeadlessConfig {
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_speed(mut self, speed: PlaybackSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_cursor_home(mut self, home: Point) -> Self {
        self.cursor_home = home;
        self
    }

    fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Runs catalog scenarios against a static layout
pub struct HeadlessRunner {
    catalog: Arc<ScenarioCatalog>,
    layout: StaticLayout,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    pub fn new(catalog: Arc<ScenarioCatalog>, layout: StaticLayout, config: HeadlessConfig) -> Self {
        Self {
            catalog,
            layout,
            config,
        }
    }

    /// Built-in scenarios on the storefront layout
    pub fn storefront(config: HeadlessConfig) -> Self {
        Self::new(
            Arc::new(ScenarioCatalog::builtin()),
            StaticLayout::demo_storefront(),
            config,
        )
    }

    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// A controller with the scenario's page mounted, nothing started yet
    pub fn controller(&self, name: &str) -> Result<HeadlessController> {
        let scenario = self.catalog.get(name)?;
        let mut layout = self.layout.clone();
        match &scenario.page {
            Some(page) => {
                layout.mount(page);
            }
            None => tracing::debug!(scenario = name, "scenario has no page; targets will not resolve"),
        }

        let config = PlaybackConfig::default()
            .with_speed(self.config.speed)
            .with_easing(self.config.easing)
            .with_cursor_home(self.config.cursor_home);
        Ok(PlaybackController::with_config(
            Arc::clone(&self.catalog),
            layout,
            RecordingHost::new(),
            ManualScheduler::with_interval(self.config.tick()),
            config,
        ))
    }

    /// Play a whole scenario to completion
    pub fn run(&self, name: &str) -> Result<RunReport> {
        let mut controller = self.controller(name)?;
        controller.play(name)?;
        self.drive(&mut controller)
    }

    /// Play `[start, end]` of a scenario to completion
    pub fn run_range(&self, name: &str, start: f32, end: f32) -> Result<RunReport> {
        let mut controller = self.controller(name)?;
        controller.play(name)?;
        controller.seek_to_range(start, end)?;
        controller.host_mut().clear();
        self.drive(&mut controller)
    }

    /// Advance frames until the controller completes
    pub fn drive(&self, controller: &mut HeadlessController) -> Result<RunReport> {
        let mut frames = 0;
        while controller.state() != PlaybackState::Completed {
            if frames >= self.config.max_frames {
                tracing::warn!(frames, progress = controller.progress(), "headless run stalled");
                return Err(GhostError::Stalled { frames });
            }
            controller.advance_frame();
            frames += 1;
        }
        Ok(RunReport::from_controller(controller))
    }
}
