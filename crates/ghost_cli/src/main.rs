//! Ghost CLI
//!
//! Lists, validates and plays cursor scenarios without a display.

mod config;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ghost_animation::{CursorFrame, SystemScheduler};
use ghost_replay::testing::{HeadlessRunner, RunReport};
use ghost_replay::{
    FieldMutation, PlaybackConfig, PlaybackController, PlaybackHost, PlaybackSpeed,
    PlaybackState, ScenarioCatalog,
};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::GhostConfig;

#[derive(Parser)]
#[command(name = "ghost")]
#[command(about = "Scripted cursor playback for product demos")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./ghost.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scenarios in the catalog
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a scenario to completion
    Play {
        /// Scenario name
        name: String,

        /// Playback speed multiplier (0.5, 1 or 2)
        #[arg(short, long)]
        speed: Option<f64>,

        /// Only play part of the scenario, as `start:end` progress
        #[arg(short, long)]
        range: Option<SeekRange>,

        /// Logical milliseconds between headless frames
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Write a JSON report to this relative path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Pace frames against the wall clock instead of running headless
        #[arg(long)]
        realtime: bool,
    },

    /// Validate a scenario catalog file
    Check {
        /// Catalog file (.toml or .json)
        file: PathBuf,
    },
}

/// Progress range given as `start:end`
#[derive(Clone, Copy, Debug, PartialEq)]
struct SeekRange {
    start: f32,
    end: f32,
}

impl FromStr for SeekRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| format!("expected start:end, got '{s}'"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid progress '{part}': {e}"))
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List { json } => cmd_list(&config, json),
        Commands::Play {
            name,
            speed,
            range,
            tick_ms,
            report,
            realtime,
        } => {
            let mut config = config;
            if let Some(speed) = speed {
                config.playback.speed = PlaybackSpeed::from_multiplier(speed)?;
            }
            if let Some(tick_ms) = tick_ms {
                config.playback.tick_ms = tick_ms;
            }
            if realtime {
                cmd_play_realtime(&config, &name, range)
            } else {
                cmd_play(&config, &name, range, report.as_deref())
            }
        }
        Commands::Check { file } => cmd_check(&file),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GhostConfig> {
    match path {
        Some(path) => GhostConfig::load_file(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            GhostConfig::load_from_dir(&cwd)
        }
    }
}

fn cmd_list(config: &GhostConfig, json: bool) -> Result<()> {
    let catalog = config.catalog()?;

    if json {
        let entries: Vec<_> = catalog
            .iter()
            .map(|scenario| {
                serde_json::json!({
                    "name": scenario.name,
                    "page": scenario.page,
                    "duration_ms": u64::try_from(scenario.duration.as_millis()).unwrap_or(u64::MAX),
                    "steps": scenario.steps.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for scenario in catalog.iter() {
        println!(
            "{:<20} {:>6} ms  {:>2} steps  {}",
            scenario.name,
            scenario.duration.as_millis(),
            scenario.steps.len(),
            scenario.page.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn cmd_play(
    config: &GhostConfig,
    name: &str,
    range: Option<SeekRange>,
    report_path: Option<&Path>,
) -> Result<()> {
    let runner = HeadlessRunner::new(
        Arc::new(config.catalog()?),
        config.layout()?,
        config.headless(),
    );

    info!(scenario = name, speed = %config.playback.speed, "playing headless");
    let report = match range {
        Some(range) => runner.run_range(name, range.start, range.end)?,
        None => runner.run(name)?,
    };

    print_mutations(&report);
    println!("{}", report.summary());

    if let Some(path) = report_path {
        report
            .write_to_path(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn print_mutations(report: &RunReport) {
    for mutation in &report.mutations {
        println!(
            "{:>5.3}  {:<20} {}",
            mutation.progress,
            mutation.target.as_str(),
            mutation.value
        );
    }
}

/// Logs host callbacks as they arrive
#[derive(Default)]
struct LogHost {
    completed: bool,
}

impl PlaybackHost for LogHost {
    fn on_cursor(&mut self, frame: CursorFrame) {
        tracing::trace!(x = frame.x, y = frame.y, visible = frame.visible, "cursor");
    }

    fn on_field(&mut self, mutation: &FieldMutation) {
        println!(
            "{:>5.3}  {:<20} {}",
            mutation.progress,
            mutation.target.as_str(),
            mutation.value
        );
    }

    fn on_complete(&mut self, scenario: &str) {
        info!(scenario, "completed");
        self.completed = true;
    }

    fn on_state_change(&mut self, from: PlaybackState, to: PlaybackState) {
        tracing::debug!(%from, %to, "state change");
    }
}

fn cmd_play_realtime(config: &GhostConfig, name: &str, range: Option<SeekRange>) -> Result<()> {
    let catalog = Arc::new(config.catalog()?);
    let scenario = catalog.get(name)?;
    let mut layout = config.layout()?;
    if let Some(page) = &scenario.page {
        layout.mount(page);
    }

    let playback = PlaybackConfig::default()
        .with_speed(config.playback.speed)
        .with_easing(config.playback.easing)
        .with_cursor_home(config.playback.cursor_home);
    let mut controller = PlaybackController::with_config(
        catalog,
        layout,
        LogHost::default(),
        SystemScheduler::new(),
        playback,
    );

    info!(scenario = name, speed = %config.playback.speed, "playing in real time");
    controller.play(name)?;
    if let Some(range) = range {
        controller.seek_to_range(range.start, range.end)?;
    }

    let tick = Duration::from_millis(config.playback.tick_ms.max(1));
    while !controller.host().completed {
        if controller.state() != PlaybackState::Playing {
            bail!("playback stopped in state {}", controller.state());
        }
        std::thread::sleep(tick);
        controller.pump();
    }
    Ok(())
}

fn cmd_check(file: &Path) -> Result<()> {
    let catalog = ScenarioCatalog::load(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    if catalog.is_empty() {
        bail!("{} contains no scenarios", file.display());
    }
    for scenario in catalog.iter() {
        println!(
            "ok  {} ({} steps, {} ms)",
            scenario.name,
            scenario.steps.len(),
            scenario.duration.as_millis()
        );
    }
    Ok(())
}
