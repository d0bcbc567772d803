//! Static scenario catalog.
//!
//! Scenarios are looked up by name. The catalog ships the storefront demo
//! scenarios and can be extended from TOML or JSON files:
//!
//! ```toml
//! [[scenario]]
//! name = "Apply SAVE20"
//! page = "checkout"
//! duration_ms = 3000
//!
//! [[scenario.steps]]
//! target = "promo-input"
//! window = [0.0, 0.5]
//! action = { kind = "type", text = "SAVE20" }
//! ```

use super::scenario::{Scenario, Step};
use ghost_core::{GhostError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// On-disk shape of a catalog file
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "scenario")]
    scenarios: Vec<Scenario>,
}

/// Named scenarios in insertion order
#[derive(Clone, Debug, Default)]
pub struct ScenarioCatalog {
    scenarios: IndexMap<String, Arc<Scenario>>,
}

impl ScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront demo scenarios
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for scenario in builtin_scenarios() {
            catalog.scenarios.insert(scenario.name.clone(), Arc::new(scenario));
        }
        catalog
    }

    /// Add a scenario after validating it. A scenario with the same name is
    /// replaced.
    pub fn insert(&mut self, scenario: Scenario) -> Result<()> {
        scenario.validate()?;
        if self.scenarios.contains_key(&scenario.name) {
            tracing::debug!(name = %scenario.name, "replacing scenario");
        }
        self.scenarios.insert(scenario.name.clone(), Arc::new(scenario));
        Ok(())
    }

    /// Look up a scenario by name
    pub fn get(&self, name: &str) -> Result<Arc<Scenario>> {
        self.scenarios
            .get(name)
            .cloned()
            .ok_or_else(|| GhostError::InvalidScenario(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenarios.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Merge another catalog; its scenarios win on name clashes
    pub fn extend(&mut self, other: ScenarioCatalog) {
        self.scenarios.extend(other.scenarios);
    }

    /// Parse and validate a TOML catalog
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(input)?;
        Self::from_file(file)
    }

    /// Parse and validate a JSON catalog (`{"scenario": [...]}`)
    pub fn from_json_str(input: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(input)?;
        Self::from_file(file)
    }

    /// Load a catalog file, picking the format from the extension
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let catalog = if is_json {
            Self::from_json_str(&raw)?
        } else {
            Self::from_toml_str(&raw)?
        };
        tracing::debug!(path = %path.display(), scenarios = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    /// Serialize the catalog back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        let file = CatalogFile {
            scenarios: self.iter().map(|scenario| scenario.as_ref().clone()).collect(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    fn from_file(file: CatalogFile) -> Result<Self> {
        let mut catalog = Self::new();
        for scenario in file.scenarios {
            if catalog.contains(&scenario.name) {
                return Err(GhostError::invalid_script(
                    &scenario.name,
                    "defined more than once",
                ));
            }
            catalog.insert(scenario)?;
        }
        Ok(catalog)
    }
}

fn builtin_scenarios() -> [Scenario; 5] {
    [
        Scenario::new("Login", Duration::from_millis(4000))
            .on_page("login")
            .step(Step::type_text("email-input", "ada@example.com", 0.0..0.35))
            .step(Step::type_text("password-input", "hunter22", 0.35..0.65))
            .step(Step::toggle("remember-me", true, 0.65..0.8))
            .step(Step::click("login-button", 0.8..1.0)),
        Scenario::new("Apply SAVE20", Duration::from_millis(3000))
            .on_page("checkout")
            .step(Step::type_text("promo-input", "SAVE20", 0.0..0.5))
            .step(Step::toggle("apply-button", true, 0.5..1.0)),
        Scenario::new("Apply SAVE50", Duration::from_millis(3500))
            .on_page("checkout")
            .step(Step::type_text("promo-input", "SAVE50", 0.0..0.45))
            .step(Step::click("apply-button", 0.45..0.75))
            .step(Step::show("promo-status", "Invalid promo code", 0.75..1.0).without_cursor()),
        Scenario::new("Search failure", Duration::from_millis(3000))
            .on_page("search")
            .step(Step::type_text("search-input", "wireless headphones", 0.0..0.5))
            .step(Step::click("search-button", 0.5..0.75))
            .step(Step::show("search-results", "No results found", 0.75..1.0).without_cursor()),
        Scenario::new("Signup", Duration::from_millis(5000))
            .on_page("signup")
            .step(Step::type_text("name-input", "Ada Lovelace", 0.0..0.25))
            .step(Step::type_text("email-input", "ada@example.com", 0.25..0.5))
            .step(Step::type_text("password-input", "correct-horse", 0.5..0.7))
            .step(Step::toggle("terms-checkbox", true, 0.7..0.82))
            .step(Step::click("signup-button", 0.82..1.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::StepAction;

    #[test]
    fn test_builtin_scenarios_are_valid() {
        let catalog = ScenarioCatalog::builtin();
        assert_eq!(catalog.len(), 5);
        for scenario in catalog.iter() {
            scenario.validate().unwrap();
        }
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            ["Login", "Apply SAVE20", "Apply SAVE50", "Search failure", "Signup"]
        );
    }

    #[test]
    fn test_unknown_name() {
        let catalog = ScenarioCatalog::builtin();
        let err = catalog.get("Checkout").unwrap_err();
        assert!(matches!(err, GhostError::InvalidScenario(name) if name == "Checkout"));
    }

    #[test]
    fn test_from_toml() {
        let catalog = ScenarioCatalog::from_toml_str(
            r#"
            [[scenario]]
            name = "Newsletter"
            page = "footer"
            duration_ms = 2000

            [[scenario.steps]]
            target = "newsletter-input"
            window = [0.0, 0.6]
            action = { kind = "type", text = "ada@example.com" }

            [[scenario.steps]]
            target = "newsletter-button"
            window = [0.6, 1.0]
            action = { kind = "click" }
            "#,
        )
        .unwrap();

        let scenario = catalog.get("Newsletter").unwrap();
        assert_eq!(scenario.duration, Duration::from_millis(2000));
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[1].action, StepAction::Click);
    }

    #[test]
    fn test_from_json() {
        let catalog = ScenarioCatalog::from_json_str(
            r#"{"scenario": [{"name": "Hover", "duration_ms": 500, "steps": [
                {"target": "logo", "window": [0.0, 1.0], "action": {"kind": "hover"}}
            ]}]}"#,
        )
        .unwrap();
        assert!(catalog.contains("Hover"));
    }

    #[test]
    fn test_rejects_invalid_script() {
        let err = ScenarioCatalog::from_toml_str(
            r#"
            [[scenario]]
            name = "Broken"
            duration_ms = 1000

            [[scenario.steps]]
            target = "button"
            window = [0.8, 0.2]
            action = { kind = "click" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, GhostError::InvalidScript { .. }));
    }

    #[test]
    fn test_rejects_overlong_duration() {
        let err = ScenarioCatalog::from_toml_str(
            r#"
            [[scenario]]
            name = "Long"
            duration_ms = 18_446_744_073_709_552

            [[scenario.steps]]
            target = "button"
            window = [0.0, 1.0]
            action = { kind = "click" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, GhostError::InvalidScript { .. }));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = ScenarioCatalog::from_json_str(
            r#"{"scenario": [
                {"name": "Twice", "duration_ms": 100},
                {"name": "Twice", "duration_ms": 200}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GhostError::InvalidScript { .. }));
    }

    #[test]
    fn test_toml_round_trip_keeps_builtins() {
        let toml = ScenarioCatalog::builtin().to_toml_string().unwrap();
        let catalog = ScenarioCatalog::from_toml_str(&toml).unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(
            *catalog.get("Apply SAVE50").unwrap(),
            *ScenarioCatalog::builtin().get("Apply SAVE50").unwrap()
        );
    }

    #[test]
    fn test_extend_overrides() {
        let mut catalog = ScenarioCatalog::builtin();
        let mut extra = ScenarioCatalog::new();
        extra
            .insert(Scenario::new("Login", Duration::from_millis(100)))
            .unwrap();

        catalog.extend(extra);
        assert_eq!(catalog.len(), 5);
        assert!(catalog.get("Login").unwrap().steps.is_empty());
    }
}
