//! Engine -> host callbacks.
//!
//! The controller reports everything it does through a [`PlaybackHost`]. A
//! UI host repaints from these callbacks; tests and the headless runner use
//! [`RecordingHost`] to capture the full event stream.

use crate::playback::PlaybackState;
use crate::script::{FieldMutation, FieldValue};
use ghost_animation::CursorFrame;
use serde::Serialize;

/// Receives playback output. Every method defaults to a no-op.
pub trait PlaybackHost {
    /// Called once per processed tick with the current progress
    fn on_progress(&mut self, _progress: f32) {}

    /// Called once per processed tick with the cursor snapshot
    fn on_cursor(&mut self, _frame: CursorFrame) {}

    /// Called for every simulated field change
    fn on_field(&mut self, _mutation: &FieldMutation) {}

    /// Called exactly once when a run reaches its end
    fn on_complete(&mut self, _scenario: &str) {}

    fn on_state_change(&mut self, _from: PlaybackState, _to: PlaybackState) {}
}

impl PlaybackHost for () {}

impl<H: PlaybackHost + ?Sized> PlaybackHost for &mut H {
    fn on_progress(&mut self, progress: f32) {
        (**self).on_progress(progress)
    }

    fn on_cursor(&mut self, frame: CursorFrame) {
        (**self).on_cursor(frame)
    }

    fn on_field(&mut self, mutation: &FieldMutation) {
        (**self).on_field(mutation)
    }

    fn on_complete(&mut self, scenario: &str) {
        (**self).on_complete(scenario)
    }

    fn on_state_change(&mut self, from: PlaybackState, to: PlaybackState) {
        (**self).on_state_change(from, to)
    }
}

/// One recorded host callback
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Progress { progress: f32 },
    Cursor(CursorFrame),
    Field(FieldMutation),
    Complete { scenario: String },
    StateChange { from: PlaybackState, to: PlaybackState },
}

/// Host that records every callback in order
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    events: Vec<HostEvent>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn take(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Every reported progress value, in order
    pub fn progress(&self) -> Vec<f32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Progress { progress } => Some(*progress),
                _ => None,
            })
            .collect()
    }

    pub fn last_progress(&self) -> Option<f32> {
        self.progress().last().copied()
    }

    pub fn cursor_frames(&self) -> Vec<CursorFrame> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Cursor(frame) => Some(*frame),
                _ => None,
            })
            .collect()
    }

    pub fn mutations(&self) -> Vec<&FieldMutation> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Field(mutation) => Some(mutation),
                _ => None,
            })
            .collect()
    }

    /// Mutations applied to `target`
    pub fn mutations_for(&self, target: &str) -> Vec<&FieldMutation> {
        self.mutations()
            .into_iter()
            .filter(|mutation| mutation.target.as_str() == target)
            .collect()
    }

    /// Successive text values written to `target`
    pub fn texts_for(&self, target: &str) -> Vec<&str> {
        self.mutations_for(target)
            .into_iter()
            .filter_map(|mutation| match &mutation.value {
                FieldValue::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names reported through `on_complete`
    pub fn completions(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Complete { scenario } => Some(scenario.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn transitions(&self) -> Vec<(PlaybackState, PlaybackState)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::StateChange { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackHost for RecordingHost {
    fn on_progress(&mut self, progress: f32) {
        self.events.push(HostEvent::Progress { progress });
    }

    fn on_cursor(&mut self, frame: CursorFrame) {
        self.events.push(HostEvent::Cursor(frame));
    }

    fn on_field(&mut self, mutation: &FieldMutation) {
        self.events.push(HostEvent::Field(mutation.clone()));
    }

    fn on_complete(&mut self, scenario: &str) {
        self.events.push(HostEvent::Complete {
            scenario: scenario.to_string(),
        });
    }

    fn on_state_change(&mut self, from: PlaybackState, to: PlaybackState) {
        self.events.push(HostEvent::StateChange { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_host_filters() {
        let mut host = RecordingHost::new();
        host.on_state_change(PlaybackState::Idle, PlaybackState::Playing);
        host.on_progress(0.1);
        host.on_field(&FieldMutation {
            target: "promo-input".into(),
            value: FieldValue::Text("S".into()),
            progress: 0.1,
        });
        host.on_progress(0.2);
        host.on_complete("Apply SAVE20");

        assert_eq!(host.progress(), [0.1, 0.2]);
        assert_eq!(host.texts_for("promo-input"), ["S"]);
        assert!(host.mutations_for("apply-button").is_empty());
        assert_eq!(host.completions(), ["Apply SAVE20"]);
        assert_eq!(
            host.transitions(),
            [(PlaybackState::Idle, PlaybackState::Playing)]
        );
        assert_eq!(host.take().len(), 5);
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_forwarding_through_mut_ref() {
        fn report(mut host: impl PlaybackHost) {
            host.on_progress(0.5);
        }

        let mut host = RecordingHost::new();
        report(&mut host);
        assert_eq!(host.last_progress(), Some(0.5));
    }
}
