//! Ghost Replay
//!
//! Scripted cursor playback: a named scenario drives a synthetic pointer over
//! logical on-screen targets, mutates simulated form fields over time and
//! reports completion exactly once.
//!
//! # Features
//!
//! - **Scripts**: scenarios as plain data, loadable from TOML or JSON
//! - **Interpreter**: one generic walker for every scenario
//! - **Resolvers**: logical target keys to container-relative geometry
//! - **Controller**: play, pause, resume, stop, speed and range seeking over
//!   a cancellable frame scheduler
//! - **Headless**: deterministic runs with a JSON report
//!
//! # Example
//!
//! ```
//! use ghost_replay::testing::{HeadlessConfig, HeadlessRunner};
//!
//! let runner = HeadlessRunner::storefront(HeadlessConfig::default());
//! let report = runner.run("Apply SAVE20").unwrap();
//!
//! assert!(report.completed);
//! assert_eq!(report.fields.text("promo-input"), Some("SAVE20"));
//! ```

pub mod host;
pub mod playback;
pub mod resolver;
pub mod script;
pub mod testing;

pub use host::{HostEvent, PlaybackHost, RecordingHost};
pub use playback::{
    ClockTick, Command, PlaybackClock, PlaybackConfig, PlaybackController, PlaybackSpeed,
    PlaybackState, RunStats,
};
pub use resolver::{Bounds, StaticLayout, TargetResolver};
pub use script::{
    FieldMutation, FieldStates, FieldValue, Scenario, ScenarioCatalog, ScriptInterpreter, Step,
    StepAction, StepWindow, TargetKey,
};
