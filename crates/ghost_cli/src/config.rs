//! Ghost configuration file handling

use anyhow::{Context, Result};
use ghost_animation::Easing;
use ghost_core::Point;
use ghost_replay::testing::HeadlessConfig;
use ghost_replay::{PlaybackSpeed, ScenarioCatalog, StaticLayout};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "ghost.toml";

/// Top-level configuration (ghost.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GhostConfig {
    #[serde(default)]
    pub playback: PlaybackSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub layout: LayoutSection,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Playback settings
#[derive(Debug, Deserialize, Serialize)]
pub struct PlaybackSection {
    /// Logical milliseconds between headless frames
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub speed: PlaybackSpeed,
    /// Frame budget before a headless run counts as stalled
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,
    #[serde(default)]
    pub easing: Easing,
    /// Where the cursor rests before a run
    #[serde(default)]
    pub cursor_home: Point,
}

fn default_tick_ms() -> u64 {
    16
}

fn default_max_frames() -> u64 {
    10_000
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            speed: PlaybackSpeed::Normal,
            max_frames: default_max_frames(),
            easing: Easing::Linear,
            cursor_home: Point::ZERO,
        }
    }
}

/// Where scenarios come from
#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogSection {
    /// Include the built-in storefront scenarios
    #[serde(default = "default_true")]
    pub builtin: bool,
    /// Extra catalog files (TOML or JSON); later files override earlier ones
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            builtin: true,
            files: Vec::new(),
        }
    }
}

/// Target geometry
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LayoutSection {
    /// Layout file; the storefront layout is used when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl GhostConfig {
    /// Load `ghost.toml` from a directory, falling back to defaults when the
    /// directory has none
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_FILE);
        if !config_path.exists() {
            tracing::debug!(dir = %path.display(), "no {CONFIG_FILE}, using defaults");
            return Ok(Self {
                base_dir: path.to_path_buf(),
                ..Self::default()
            });
        }
        Self::load_file(&config_path)
    }

    /// Load an explicit config file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Built-in scenarios (if enabled) plus every configured catalog file
    pub fn catalog(&self) -> Result<ScenarioCatalog> {
        let mut catalog = if self.catalog.builtin {
            ScenarioCatalog::builtin()
        } else {
            ScenarioCatalog::new()
        };

        for file in &self.catalog.files {
            let path = self.resolve(file);
            let loaded = ScenarioCatalog::load(&path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            catalog.extend(loaded);
        }
        Ok(catalog)
    }

    pub fn layout(&self) -> Result<StaticLayout> {
        match &self.layout.file {
            Some(file) => {
                let path = self.resolve(file);
                StaticLayout::load(&path)
                    .with_context(|| format!("Failed to load layout {}", path.display()))
            }
            None => Ok(StaticLayout::demo_storefront()),
        }
    }

    pub fn headless(&self) -> HeadlessConfig {
        HeadlessConfig::default()
            .with_tick_ms(self.playback.tick_ms)
            .with_max_frames(self.playback.max_frames)
            .with_speed(self.playback.speed)
            .with_easing(self.playback.easing)
            .with_cursor_home(self.playback.cursor_home)
    }
}
