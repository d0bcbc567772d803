//! Progress-driven step interpreter.
//!
//! The interpreter is generic over the script: it knows nothing about logins
//! or promo codes, only about windows, targets and the handful of
//! [`StepAction`] kinds. Each call to [`ScriptInterpreter::advance`] walks the
//! steps for the current progress, moves the cursor and emits field
//! mutations.

use super::fields::{FieldMutation, FieldStates, FieldValue};
use super::scenario::{Scenario, Step, StepAction, StepWindow};
use crate::resolver::TargetResolver;
use ghost_animation::CursorAnimator;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;

/// Share of a step window spent travelling to the target
pub const TRAVEL_SHARE: f32 = 0.4;

/// Local progress at which one-shot actions fire
pub const ACTION_THRESHOLD: f32 = 0.6;

/// Mutations produced by a single tick
pub type Mutations = SmallVec<[FieldMutation; 4]>;

/// Per-step bookkeeping for the current run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct StepCursor {
    /// Cursor travel has started
    entered: bool,
    /// Characters revealed so far (type steps)
    revealed: usize,
    /// One-shot action applied
    fired: bool,
    /// Nothing left to do for this step
    settled: bool,
}

/// Walks a scenario's steps as progress moves forward.
pub struct ScriptInterpreter {
    scenario: Arc<Scenario>,
    range: StepWindow,
    steps: Vec<StepCursor>,
    fields: FieldStates,
    progress: f32,
}

impl ScriptInterpreter {
    pub fn new(scenario: Arc<Scenario>) -> Self {
        Self::with_range(scenario, StepWindow::FULL)
    }

    /// Interpreter for a partial run.
    ///
    /// Steps that end at or before `range.start` are settled up front
    /// without producing mutations. Steps that start at or after
    /// `range.end` are never driven.
    pub fn with_range(scenario: Arc<Scenario>, range: StepWindow) -> Self {
        let steps = scenario
            .steps
            .iter()
            .map(|step| StepCursor {
                settled: step.window.end <= range.start || step.window.start >= range.end,
                ..StepCursor::default()
            })
            .collect();

        Self {
            scenario,
            range,
            steps,
            fields: FieldStates::new(),
            progress: range.start,
        }
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    pub fn range(&self) -> StepWindow {
        self.range
    }

    /// Field state after the last applied mutation
    pub fn fields(&self) -> &FieldStates {
        &self.fields
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// True once every step has been settled or ruled out
    pub fn is_finished(&self) -> bool {
        self.steps.iter().all(|step| step.settled)
    }

    /// Drive every step for `progress`.
    ///
    /// Progress never moves backwards; a smaller value is treated as the
    /// last one seen.
    pub fn advance(
        &mut self,
        progress: f32,
        resolver: &dyn TargetResolver,
        cursor: &mut CursorAnimator,
    ) -> Mutations {
        let progress = progress.clamp(self.progress, self.range.end);
        self.progress = progress;

        let mut mutations = Mutations::new();
        let scenario = Arc::clone(&self.scenario);

        for (index, step) in scenario.steps.iter().enumerate() {
            let state = &mut self.steps[index];
            if state.settled || progress < step.window.start {
                continue;
            }

            let rect = match resolver.resolve(&step.target) {
                Ok(rect) => rect,
                Err(err) => {
                    if err.is_recoverable() {
                        tracing::debug!(
                            scenario = %scenario.name,
                            target = %step.target,
                            progress,
                            "skipping step: {err}"
                        );
                    } else {
                        tracing::warn!(
                            scenario = %scenario.name,
                            target = %step.target,
                            progress,
                            "resolver failed, skipping step: {err}"
                        );
                    }
                    if state.entered && step.cursor {
                        cursor.halt();
                    }
                    if progress >= step.window.end {
                        state.settled = true;
                    }
                    continue;
                }
            };

            if progress >= step.window.end {
                settle(step, state, progress, &mut mutations);
                continue;
            }

            let local = step.window.local(progress);
            if step.cursor {
                if state.entered {
                    cursor.retarget(rect);
                } else {
                    cursor.tween_to(rect, travel_time(&scenario, step.window, progress));
                }
            }
            state.entered = true;

            match &step.action {
                StepAction::Type { text } => {
                    let len = text.chars().count();
                    let target = ((local * len as f32).ceil() as usize).min(len);
                    reveal(step, text, state, target, progress, &mut mutations);
                }
                action if action.is_one_shot() => {
                    if !state.fired && local >= ACTION_THRESHOLD {
                        state.fired = true;
                        if action.presses() && step.cursor {
                            cursor.click();
                        }
                        if let Some(value) = one_shot_value(action) {
                            mutations.push(mutation(step, value, progress));
                        }
                    }
                }
                _ => {}
            }
        }

        for mutation in &mutations {
            self.fields.apply(mutation);
        }
        mutations
    }
}

/// Apply whatever a step still owes once its window has passed
fn settle(step: &Step, state: &mut StepCursor, progress: f32, mutations: &mut Mutations) {
    match &step.action {
        StepAction::Type { text } => {
            let len = text.chars().count();
            reveal(step, text, state, len, progress, mutations);
        }
        action if action.is_one_shot() && !state.fired => {
            state.fired = true;
            if let Some(value) = one_shot_value(action) {
                mutations.push(mutation(step, value, progress));
            }
        }
        _ => {}
    }
    state.settled = true;
}

/// One mutation per newly revealed character, up to `target` characters
fn reveal(
    step: &Step,
    text: &str,
    state: &mut StepCursor,
    target: usize,
    progress: f32,
    mutations: &mut Mutations,
) {
    while state.revealed < target {
        state.revealed += 1;
        let prefix: String = text.chars().take(state.revealed).collect();
        mutations.push(mutation(step, FieldValue::Text(prefix), progress));
    }
}

fn one_shot_value(action: &StepAction) -> Option<FieldValue> {
    match action {
        StepAction::Toggle { value } => Some(FieldValue::Flag(*value)),
        StepAction::Click => Some(FieldValue::Pressed),
        StepAction::Show { text } => Some(FieldValue::Text(text.clone())),
        StepAction::Hover | StepAction::Type { .. } => None,
    }
}

fn mutation(step: &Step, value: FieldValue, progress: f32) -> FieldMutation {
    FieldMutation {
        target: step.target.clone(),
        value,
        progress,
    }
}

/// Scenario time spent travelling for a step entered at `progress`
pub fn travel_time(scenario: &Scenario, window: StepWindow, progress: f32) -> Duration {
    let share = window.span() * TRAVEL_SHARE * (1.0 - window.local(progress));
    let micros = scenario.duration.as_micros() as f64 * f64::from(share);
    Duration::from_micros(micros.round() as u64)
}
