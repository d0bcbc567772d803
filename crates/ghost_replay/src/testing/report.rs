//! Machine-readable result of a headless playback run.

use super::headless::HeadlessController;
use crate::playback::{PlaybackSpeed, PlaybackState};
use crate::script::{FieldMutation, FieldStates};
use anyhow::{bail, Result};
use ghost_animation::{CursorFrame, FrameScheduler};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path};

/// Summary of one run, written as JSON
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub completed: bool,
    pub state: PlaybackState,
    pub speed: PlaybackSpeed,
    pub range: [f32; 2],
    pub progress: f32,
    pub frames: u64,
    /// Scheduler time from start to the last processed frame
    pub elapsed_ms: u64,
    /// Every field mutation, in emission order
    pub mutations: Vec<FieldMutation>,
    /// Field values at the end of the run
    pub fields: FieldStates,
    pub cursor: Option<CursorFrame>,
    pub transitions: Vec<(PlaybackState, PlaybackState)>,
}

impl RunReport {
    pub fn from_controller(controller: &HeadlessController) -> Self {
        let host = controller.host();
        let stats = controller.stats();

        Self {
            scenario: stats
                .as_ref()
                .map(|stats| stats.scenario.clone())
                .unwrap_or_default(),
            completed: stats.as_ref().is_some_and(|stats| stats.completed),
            state: controller.state(),
            speed: controller.speed(),
            range: stats.as_ref().map_or([0.0, 1.0], |stats| stats.range),
            progress: controller.progress(),
            frames: stats.as_ref().map_or(0, |stats| stats.frames),
            elapsed_ms: u64::try_from(controller.scheduler().now().as_millis()).unwrap_or(u64::MAX),
            mutations: host.mutations().into_iter().cloned().collect(),
            fields: controller.fields().cloned().unwrap_or_default(),
            cursor: host.cursor_frames().last().copied(),
            transitions: host.transitions(),
        }
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} at {} after {} frames ({} ms), {} mutations",
            self.scenario,
            if self.completed { "completed" } else { self.state.as_str() },
            self.speed,
            self.frames,
            self.elapsed_ms,
            self.mutations.len()
        )
    }

    /// Write the report as pretty JSON to a path under the working
    /// directory, creating parent directories as needed
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        check_report_path(path)?;
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = BufWriter::new(File::create(path)?);
        self.write_to_writer(&mut file)?;
        file.flush()?;
        Ok(())
    }

    pub fn write_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Reports stay inside the working directory
fn check_report_path(path: &Path) -> Result<()> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                bail!("report path {} leaves the working directory", path.display())
            }
            Component::RootDir | Component::Prefix(_) => {
                bail!("report path {} must be relative", path.display())
            }
        }
    }
    Ok(())
}
