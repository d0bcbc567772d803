//! Error types shared by the playback crates

use thiserror::Error;

/// Errors raised by the playback engine and its catalog/layout loaders
#[derive(Error, Debug)]
pub enum GhostError {
    /// Requested scenario is not in the catalog; playback does not start
    #[error("unknown scenario: {0}")]
    InvalidScenario(String),

    /// A step target is not present in the current layout
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// Speed multiplier outside the supported set (0.5x, 1x, 2x)
    #[error("unsupported playback speed: {0}x")]
    InvalidSpeed(f64),

    /// Seek range outside [0, 1] or empty
    #[error("invalid seek range: {start}..{end}")]
    InvalidRange { start: f32, end: f32 },

    /// Command needs a loaded scenario but the controller has none
    #[error("no scenario loaded")]
    NoActiveScenario,

    /// Scenario definition violates the step script rules
    #[error("invalid script '{scenario}': {reason}")]
    InvalidScript { scenario: String, reason: String },

    /// Headless run exhausted its frame budget before completing
    #[error("playback stalled after {frames} frames")]
    Stalled { frames: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl GhostError {
    pub fn invalid_script(scenario: impl Into<String>, reason: impl Into<String>) -> Self {
        GhostError::InvalidScript {
            scenario: scenario.into(),
            reason: reason.into(),
        }
    }

    /// Errors that only degrade the visual effect and never stop timing
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GhostError::TargetNotFound(_) | GhostError::InvalidSpeed(_)
        )
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, GhostError>;
