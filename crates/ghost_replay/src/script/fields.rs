//! Simulated form-field state.

use super::TargetKey;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a simulated control
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Text field content or status text
    Text(String),
    /// Checkbox / toggle state
    Flag(bool),
    /// Button highlighted by a press
    Pressed,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => write!(f, "{text:?}"),
            FieldValue::Flag(flag) => write!(f, "{flag}"),
            FieldValue::Pressed => f.write_str("pressed"),
        }
    }
}

/// A single change applied to a target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldMutation {
    pub target: TargetKey,
    pub value: FieldValue,
    /// Scenario progress at which the change was applied
    pub progress: f32,
}

impl FieldMutation {
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Last applied value per target, in first-touched order.
///
/// Nothing is ever rolled back: pausing keeps whatever was applied last.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldStates {
    values: IndexMap<TargetKey, FieldValue>,
}

impl FieldStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, mutation: &FieldMutation) {
        self.values
            .insert(mutation.target.clone(), mutation.value.clone());
    }

    pub fn get(&self, target: &TargetKey) -> Option<&FieldValue> {
        self.values.get(target)
    }

    pub fn text(&self, target: &str) -> Option<&str> {
        match self.values.get(&TargetKey::from(target))? {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn flag(&self, target: &str) -> Option<bool> {
        match self.values.get(&TargetKey::from(target))? {
            FieldValue::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetKey, &FieldValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
