//! Data-driven step scripts.
//!
//! Scenarios are plain data ([`Scenario`], [`Step`]); the
//! [`ScriptInterpreter`] walks any of them against a resolver and a cursor.

mod catalog;
mod fields;
mod interpreter;
mod scenario;

pub use catalog::ScenarioCatalog;
pub use fields::{FieldMutation, FieldStates, FieldValue};
pub use interpreter::{travel_time, Mutations, ScriptInterpreter, ACTION_THRESHOLD, TRAVEL_SHARE};
pub use scenario::{Scenario, Step, StepAction, StepWindow, TargetKey};
