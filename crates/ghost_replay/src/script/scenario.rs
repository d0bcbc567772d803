//! Scenario and step definitions.
//!
//! A scenario is static data: an ordered list of steps, each bound to a
//! window of the scenario's progress. Adding a scenario never needs new
//! control flow, only a new step list.

use ghost_core::{GhostError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::time::Duration;

/// Logical key of an on-screen target (an id or role, never a position).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetKey(String);

impl TargetKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for TargetKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Half-open `[start, end)` window in progress fractions.
///
/// Serialized as a two-element array: `window = [0.0, 0.5]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct StepWindow {
    pub start: f32,
    pub end: f32,
}

impl StepWindow {
    pub const FULL: StepWindow = StepWindow {
        start: 0.0,
        end: 1.0,
    };

    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> f32 {
        self.end - self.start
    }

    pub fn contains(&self, progress: f32) -> bool {
        progress >= self.start && progress < self.end
    }

    /// Progress within the window, clamped to 0.0..=1.0
    pub fn local(&self, progress: f32) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return 1.0;
        }
        ((progress - self.start) / span).clamp(0.0, 1.0)
    }

    fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.end <= 1.0
            && self.start < self.end
    }
}

impl From<Range<f32>> for StepWindow {
    fn from(range: Range<f32>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<[f32; 2]> for StepWindow {
    fn from([start, end]: [f32; 2]) -> Self {
        Self::new(start, end)
    }
}

impl From<StepWindow> for [f32; 2] {
    fn from(window: StepWindow) -> Self {
        [window.start, window.end]
    }
}

/// What a step does to its target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    /// Move the cursor only
    Hover,
    /// Reveal `text` character by character across the window
    Type { text: String },
    /// Set a checkbox-like control once the action threshold is crossed
    Toggle { value: bool },
    /// Press a button once the action threshold is crossed
    Click,
    /// Show a status text once the action threshold is crossed
    Show { text: String },
}

impl StepAction {
    /// Actions that fire once instead of progressing with the window
    pub fn is_one_shot(&self) -> bool {
        matches!(
            self,
            StepAction::Toggle { .. } | StepAction::Click | StepAction::Show { .. }
        )
    }

    /// Actions that play the cursor press jitter when they fire
    pub fn presses(&self) -> bool {
        matches!(self, StepAction::Toggle { .. } | StepAction::Click)
    }
}

/// One scripted action bound to a window of the scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub target: TargetKey,
    pub action: StepAction,
    pub window: StepWindow,
    /// Whether the cursor travels to the target for this step
    #[serde(default = "default_true")]
    pub cursor: bool,
}

fn default_true() -> bool {
    true
}

impl Step {
    pub fn new(target: impl Into<TargetKey>, action: StepAction, window: impl Into<StepWindow>) -> Self {
        Self {
            target: target.into(),
            action,
            window: window.into(),
            cursor: true,
        }
    }

    pub fn hover(target: impl Into<TargetKey>, window: impl Into<StepWindow>) -> Self {
        Self::new(target, StepAction::Hover, window)
    }

    pub fn type_text(
        target: impl Into<TargetKey>,
        text: impl Into<String>,
        window: impl Into<StepWindow>,
    ) -> Self {
        Self::new(target, StepAction::Type { text: text.into() }, window)
    }

    pub fn toggle(target: impl Into<TargetKey>, value: bool, window: impl Into<StepWindow>) -> Self {
        Self::new(target, StepAction::Toggle { value }, window)
    }

    pub fn click(target: impl Into<TargetKey>, window: impl Into<StepWindow>) -> Self {
        Self::new(target, StepAction::Click, window)
    }

    pub fn show(
        target: impl Into<TargetKey>,
        text: impl Into<String>,
        window: impl Into<StepWindow>,
    ) -> Self {
        Self::new(target, StepAction::Show { text: text.into() }, window)
    }

    /// Apply the step without moving the cursor
    pub fn without_cursor(mut self) -> Self {
        self.cursor = false;
        self
    }
}

/// A named, pre-scripted sequence of simulated user actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Preview page the scenario renders on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            page: None,
            duration,
            steps: Vec::new(),
        }
    }

    pub fn on_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Check the script rules: non-empty name, non-zero duration, windows
    /// inside [0, 1] and ordered by start, non-empty typed text.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GhostError::invalid_script("<unnamed>", "name is empty"));
        }
        if self.duration.is_zero() {
            return Err(GhostError::invalid_script(&self.name, "duration must be non-zero"));
        }
        if u64::try_from(self.duration.as_micros()).is_err() {
            return Err(GhostError::invalid_script(
                &self.name,
                format!("duration of {} ms is too long", self.duration.as_millis()),
            ));
        }

        let mut last_start = 0.0_f32;
        for (index, step) in self.steps.iter().enumerate() {
            if !step.window.is_valid() {
                return Err(GhostError::invalid_script(
                    &self.name,
                    format!(
                        "step {index} ({}) has invalid window [{}, {})",
                        step.target, step.window.start, step.window.end
                    ),
                ));
            }
            if step.window.start < last_start {
                return Err(GhostError::invalid_script(
                    &self.name,
                    format!("step {index} ({}) starts before the previous step", step.target),
                ));
            }
            if let StepAction::Type { text } = &step.action {
                if text.is_empty() {
                    return Err(GhostError::invalid_script(
                        &self.name,
                        format!("step {index} ({}) types an empty string", step.target),
                    ));
                }
            }
            last_start = step.window.start;
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).map_err(S::Error::custom)?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
