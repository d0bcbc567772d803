//! Target resolution.
//!
//! Steps name their targets by logical key. A [`TargetResolver`] maps a key to
//! the target's current bounds, relative to the preview container origin.
//! Geometry is queried every tick because layout can shift under a running
//! scenario.

use crate::script::TargetKey;
use ghost_core::{GhostError, Point, Rect, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Looks up on-screen geometry for logical step targets
pub trait TargetResolver {
    /// Current bounds of `key`, or [`GhostError::TargetNotFound`] when the
    /// target is not mounted.
    fn resolve(&self, key: &TargetKey) -> Result<Rect>;
}

impl<T: TargetResolver + ?Sized> TargetResolver for &T {
    fn resolve(&self, key: &TargetKey) -> Result<Rect> {
        (**self).resolve(key)
    }
}

impl<T: TargetResolver + ?Sized> TargetResolver for Box<T> {
    fn resolve(&self, key: &TargetKey) -> Result<Rect> {
        (**self).resolve(key)
    }
}

/// Bounds as `[left, top, width, height]` in page coordinates
pub type Bounds = [f32; 4];

/// Page-based static layout.
///
/// Each page holds keyed target bounds in absolute (page) coordinates. One
/// page is mounted at a time, matching a preview that renders one page of
/// the mocked app. Targets on other pages do not resolve.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StaticLayout {
    /// Origin of the preview container in page coordinates
    #[serde(default)]
    pub container: Point,
    #[serde(default)]
    pub pages: IndexMap<String, IndexMap<TargetKey, Bounds>>,
    #[serde(skip)]
    mounted: Option<String>,
}

impl StaticLayout {
    pub fn new(container: Point) -> Self {
        Self {
            container,
            ..Default::default()
        }
    }

    /// Parse a layout from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load a layout file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn with_target(mut self, page: &str, key: impl Into<TargetKey>, bounds: Bounds) -> Self {
        self.insert(page, key, bounds);
        self
    }

    pub fn insert(&mut self, page: &str, key: impl Into<TargetKey>, bounds: Bounds) {
        self.pages
            .entry(page.to_string())
            .or_default()
            .insert(key.into(), bounds);
    }

    /// Remove a target, e.g. when the element unmounts mid-run
    pub fn remove(&mut self, page: &str, key: &TargetKey) -> Option<Bounds> {
        self.pages.get_mut(page)?.shift_remove(key)
    }

    /// Mount a page. Returns false if the layout has no such page; the page
    /// is mounted anyway and simply resolves nothing.
    pub fn mount(&mut self, page: &str) -> bool {
        self.mounted = Some(page.to_string());
        let known = self.pages.contains_key(page);
        if !known {
            tracing::debug!(page, "mounted page has no targets");
        }
        known
    }

    pub fn unmount(&mut self) {
        self.mounted = None;
    }

    pub fn mounted(&self) -> Option<&str> {
        self.mounted.as_deref()
    }

    /// Geometry for the storefront preview the built-in scenarios run on
    pub fn demo_storefront() -> Self {
        StaticLayout::new(Point::new(240.0, 96.0))
            .with_target("login", "email-input", [320.0, 220.0, 320.0, 40.0])
            .with_target("login", "password-input", [320.0, 280.0, 320.0, 40.0])
            .with_target("login", "remember-me", [320.0, 336.0, 18.0, 18.0])
            .with_target("login", "login-button", [320.0, 376.0, 320.0, 44.0])
            .with_target("checkout", "promo-input", [300.0, 412.0, 220.0, 36.0])
            .with_target("checkout", "apply-button", [532.0, 412.0, 88.0, 36.0])
            .with_target("checkout", "promo-status", [300.0, 456.0, 320.0, 20.0])
            .with_target("checkout", "place-order-button", [300.0, 520.0, 320.0, 48.0])
            .with_target("search", "search-input", [290.0, 132.0, 420.0, 40.0])
            .with_target("search", "search-button", [722.0, 132.0, 96.0, 40.0])
            .with_target("search", "search-results", [290.0, 196.0, 528.0, 320.0])
            .with_target("signup", "name-input", [320.0, 200.0, 320.0, 40.0])
            .with_target("signup", "email-input", [320.0, 256.0, 320.0, 40.0])
            .with_target("signup", "password-input", [320.0, 312.0, 320.0, 40.0])
            .with_target("signup", "terms-checkbox", [320.0, 368.0, 18.0, 18.0])
            .with_target("signup", "signup-button", [320.0, 404.0, 320.0, 44.0])
            .with_target("signup", "signup-status", [320.0, 460.0, 320.0, 20.0])
    }
}

impl TargetResolver for StaticLayout {
    fn resolve(&self, key: &TargetKey) -> Result<Rect> {
        let bounds = self
            .mounted
            .as_deref()
            .and_then(|page| self.pages.get(page))
            .and_then(|targets| targets.get(key))
            .ok_or_else(|| GhostError::TargetNotFound(key.to_string()))?;

        let [left, top, width, height] = *bounds;
        Ok(Rect::new(left, top, width, height).relative_to(self.container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_relative_to_container() {
        let mut layout = StaticLayout::new(Point::new(100.0, 50.0))
            .with_target("checkout", "apply-button", [300.0, 250.0, 80.0, 30.0]);
        assert!(layout.mount("checkout"));

        let rect = layout.resolve(&"apply-button".into()).unwrap();
        assert_eq!(rect, Rect::new(200.0, 200.0, 80.0, 30.0));
    }

    #[test]
    fn test_other_page_not_found() {
        let mut layout = StaticLayout::demo_storefront();
        layout.mount("login");

        let err = layout.resolve(&"promo-input".into()).unwrap_err();
        assert!(matches!(err, GhostError::TargetNotFound(key) if key == "promo-input"));
    }

    #[test]
    fn test_nothing_resolves_unmounted() {
        let mut layout = StaticLayout::demo_storefront();
        layout.mount("checkout");
        assert!(layout.resolve(&"promo-input".into()).is_ok());

        layout.unmount();
        assert!(layout.resolve(&"promo-input".into()).is_err());
        assert_eq!(layout.mounted(), None);
    }

    #[test]
    fn test_removed_target_not_found() {
        let mut layout = StaticLayout::demo_storefront();
        layout.mount("checkout");
        assert!(layout.remove("checkout", &"apply-button".into()).is_some());
        assert!(layout.resolve(&"apply-button".into()).is_err());
    }

    #[test]
    fn test_unknown_page_mounts_empty() {
        let mut layout = StaticLayout::demo_storefront();
        assert!(!layout.mount("settings"));
        assert!(layout.resolve(&"email-input".into()).is_err());
    }

    #[test]
    fn test_from_toml() {
        let layout = StaticLayout::from_toml_str(
            r#"
            container = { x = 10.0, y = 20.0 }

            [pages.checkout]
            promo-input = [40.0, 60.0, 100.0, 20.0]
            "#,
        )
        .unwrap();

        let mut layout = layout;
        layout.mount("checkout");
        let rect = layout.resolve(&"promo-input".into()).unwrap();
        assert_eq!(rect, Rect::new(30.0, 40.0, 100.0, 20.0));
    }
}
