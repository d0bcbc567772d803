//! Playback controller.
//!
//! Owns the single active run: its clock, interpreter and pending frame
//! token. Commands go through a typed state machine; frames arrive through
//! [`PlaybackController::on_frame`] and anything that does not carry the
//! current pending token is dropped.

use super::clock::{PlaybackClock, PlaybackSpeed};
use crate::host::PlaybackHost;
use crate::resolver::TargetResolver;
use crate::script::{FieldStates, Scenario, ScenarioCatalog, ScriptInterpreter, StepWindow};
use ghost_animation::{
    CursorAnimator, Easing, Frame, FrameScheduler, FrameToken, ManualScheduler, SystemScheduler,
};
use ghost_core::{GhostError, Point, Result, StateMachine, Transition};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of the controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Completed,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Completed => "completed",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events driving the controller state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    Resume,
    Finish,
    Stop,
}

/// Controller configuration
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Speed applied to new runs
    pub speed: PlaybackSpeed,
    /// Easing of cursor travel
    pub easing: Easing,
    /// Where the cursor rests between runs
    pub cursor_home: Point,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: PlaybackSpeed::Normal,
            easing: Easing::Linear,
            cursor_home: Point::ZERO,
        }
    }
}

impl PlaybackConfig {
    pub fn with_speed(mut self, speed: PlaybackSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_cursor_home(mut self, home: Point) -> Self {
        self.cursor_home = home;
        self
    }
}

/// Counters for the current (or last) run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunStats {
    /// Monotonic id, bumped by every fresh start
    pub run_id: u64,
    pub scenario: String,
    pub range: [f32; 2],
    /// Frames processed
    pub frames: u64,
    /// Field mutations emitted
    pub mutations: usize,
    /// Scenario time covered
    #[serde(serialize_with = "serialize_millis")]
    pub position: Duration,
    pub completed: bool,
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::Error;
    let millis = u64::try_from(duration.as_millis()).map_err(S::Error::custom)?;
    serializer.serialize_u64(millis)
}

/// Transitions kept in [`PlaybackController::transitions`] for one run
const HISTORY_LIMIT: usize = 64;

struct ActiveRun {
    id: u64,
    scenario: Arc<Scenario>,
    clock: PlaybackClock,
    interpreter: ScriptInterpreter,
    pending: Option<FrameToken>,
    completed: bool,
    frames: u64,
    mutations: usize,
}

/// Drives scenarios from a catalog against a resolver, reporting to a host.
pub struct PlaybackController<R, H, S = ManualScheduler>
where
    R: TargetResolver,
    H: PlaybackHost,
    S: FrameScheduler,
{
    catalog: Arc<ScenarioCatalog>,
    resolver: R,
    host: H,
    scheduler: S,
    config: PlaybackConfig,
    machine: StateMachine<PlaybackState, Command>,
    cursor: CursorAnimator,
    speed: PlaybackSpeed,
    run: Option<ActiveRun>,
    /// Scenario of the last run, kept after stop for seeking
    loaded: Option<Arc<Scenario>>,
    next_run_id: u64,
}

impl<R, H, S> PlaybackController<R, H, S>
where
    R: TargetResolver,
    H: PlaybackHost,
    S: FrameScheduler,
{
    pub fn new(catalog: Arc<ScenarioCatalog>, resolver: R, host: H, scheduler: S) -> Self {
        Self::with_config(catalog, resolver, host, scheduler, PlaybackConfig::default())
    }

    pub fn with_config(
        catalog: Arc<ScenarioCatalog>,
        resolver: R,
        host: H,
        scheduler: S,
        config: PlaybackConfig,
    ) -> Self {
        use PlaybackState::*;

        let machine = StateMachine::builder(Idle)
            .on_any(&[Idle, Playing, Paused, Completed], Command::Start, Playing)
            .on(Playing, Command::Pause, Paused)
            .on(Paused, Command::Resume, Playing)
            .on(Playing, Command::Finish, Completed)
            .on_any(&[Playing, Paused, Completed], Command::Stop, Idle)
            .with_history_limit(HISTORY_LIMIT)
            .build();

        Self {
            catalog,
            resolver,
            host,
            scheduler,
            cursor: CursorAnimator::new(config.cursor_home).with_easing(config.easing),
            speed: config.speed,
            config,
            machine,
            run: None,
            loaded: None,
            next_run_id: 1,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.machine.current_state()
    }

    /// Progress of the current run, 0 when nothing is loaded
    pub fn progress(&self) -> f32 {
        self.run.as_ref().map_or(0.0, |run| run.clock.progress())
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Scenario of the current run, or of the last run after a stop
    pub fn scenario(&self) -> Option<&Arc<Scenario>> {
        self.run
            .as_ref()
            .map(|run| &run.scenario)
            .or(self.loaded.as_ref())
    }

    pub fn cursor(&self) -> &CursorAnimator {
        &self.cursor
    }

    /// Field state of the current run
    pub fn fields(&self) -> Option<&FieldStates> {
        self.run.as_ref().map(|run| run.interpreter.fields())
    }

    pub fn stats(&self) -> Option<RunStats> {
        self.run.as_ref().map(|run| RunStats {
            run_id: run.id,
            scenario: run.scenario.name.clone(),
            range: run.clock.range().into(),
            frames: run.frames,
            mutations: run.mutations,
            position: run.clock.position(),
            completed: run.completed,
        })
    }

    /// Token the controller is waiting on, if any
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.run.as_ref().and_then(|run| run.pending)
    }

    /// Lifecycle transitions of the current run, oldest first. Cleared when
    /// a run starts and capped at the most recent entries.
    pub fn transitions(&self) -> &[Transition<PlaybackState, Command>] {
        self.machine.history()
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Mutable resolver access, e.g. to mount a page or move targets
    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Play a scenario by name.
    ///
    /// Resumes when paused on the same scenario; otherwise any current run is
    /// cancelled and a fresh one starts at progress 0. A completed run passes
    /// through Idle first, so the host sees `Completed -> Idle -> Playing`.
    /// An unknown name leaves the controller untouched.
    pub fn play(&mut self, name: &str) -> Result<()> {
        let scenario = self.catalog.get(name)?;

        let paused_here = self.state() == PlaybackState::Paused
            && self.run.as_ref().is_some_and(|run| run.scenario.name == name);
        if paused_here {
            self.resume();
            return Ok(());
        }

        self.start_run(scenario, StepWindow::FULL);
        Ok(())
    }

    /// Paused -> Playing. Returns false when not paused.
    pub fn resume(&mut self) -> bool {
        if !self.send(Command::Resume) {
            return false;
        }
        let now = self.scheduler.now();
        if let Some(run) = self.run.as_mut() {
            run.clock.play(now);
            run.pending = Some(self.scheduler.request_frame());
            tracing::debug!(scenario = %run.scenario.name, progress = run.clock.progress(), "playback resumed");
        }
        self.cursor.show();
        self.host.on_cursor(self.cursor.frame());
        true
    }

    /// Playing -> Paused. Field state is kept as is. Returns false when not
    /// playing.
    pub fn pause(&mut self) -> bool {
        if !self.send(Command::Pause) {
            return false;
        }
        if let Some(run) = self.run.as_mut() {
            cancel(&mut self.scheduler, run);
            run.clock.pause();
            tracing::debug!(scenario = %run.scenario.name, progress = run.clock.progress(), "playback paused");
        }
        self.cursor.hide();
        self.host.on_cursor(self.cursor.frame());
        true
    }

    /// Cancel the current run and return to idle
    pub fn stop(&mut self) {
        if self.state() == PlaybackState::Idle {
            return;
        }
        if let Some(mut run) = self.run.take() {
            cancel(&mut self.scheduler, &mut run);
            tracing::debug!(scenario = %run.scenario.name, "playback stopped");
            self.loaded = Some(run.scenario);
        }
        self.send(Command::Stop);
        self.cursor.reset();
        self.host.on_cursor(self.cursor.frame());
    }

    /// Change the speed for the rest of the current run and for new runs
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        let now = self.scheduler.now();
        if let Some(run) = self.run.as_mut() {
            run.clock.set_speed(speed, now);
        }
        tracing::debug!(%speed, "playback speed changed");
    }

    /// [`Self::set_speed`] from a raw multiplier. Unsupported values leave the
    /// speed unchanged.
    pub fn set_speed_multiplier(&mut self, multiplier: f64) -> Result<()> {
        let speed = PlaybackSpeed::from_multiplier(multiplier).map_err(|err| {
            tracing::warn!(multiplier, "rejected playback speed");
            err
        })?;
        self.set_speed(speed);
        Ok(())
    }

    /// Replay only `[start, end]` of the loaded scenario.
    ///
    /// Starts a new run at `start` and completes at `end`.
    pub fn seek_to_range(&mut self, start: f32, end: f32) -> Result<()> {
        let valid = start.is_finite() && end.is_finite() && start >= 0.0 && end <= 1.0 && start < end;
        if !valid {
            return Err(GhostError::InvalidRange { start, end });
        }
        let scenario = self.scenario().cloned().ok_or(GhostError::NoActiveScenario)?;
        self.start_run(scenario, StepWindow::new(start, end));
        Ok(())
    }

    /// Deliver a frame. Returns false for stale or unknown tokens, which
    /// never touch state.
    pub fn on_frame(&mut self, token: FrameToken, now: Duration) -> bool {
        let Some(run) = self.run.as_mut() else {
            tracing::debug!(?token, "frame without an active run");
            return false;
        };
        if run.pending != Some(token) {
            tracing::debug!(?token, run = run.id, "ignoring stale frame");
            return false;
        }
        run.pending = None;
        self.tick(now);
        true
    }

    /// Deliver a batch of frames in order; returns how many were accepted
    pub fn deliver(&mut self, frames: impl IntoIterator<Item = Frame>) -> usize {
        frames
            .into_iter()
            .filter(|frame| self.on_frame(frame.token, frame.time))
            .count()
    }

    fn start_run(&mut self, scenario: Arc<Scenario>, range: StepWindow) {
        if let Some(mut old) = self.run.take() {
            cancel(&mut self.scheduler, &mut old);
        }

        let now = self.scheduler.now();
        let mut clock = PlaybackClock::with_range(scenario.duration, range);
        clock.set_speed(self.speed, now);
        clock.play(now);

        let id = self.next_run_id;
        self.next_run_id += 1;
        tracing::info!(
            scenario = %scenario.name,
            run = id,
            start = range.start,
            end = range.end,
            speed = %self.speed,
            "playback started"
        );

        self.loaded = Some(Arc::clone(&scenario));
        self.run = Some(ActiveRun {
            id,
            interpreter: ScriptInterpreter::with_range(Arc::clone(&scenario), range),
            scenario,
            clock,
            pending: None,
            completed: false,
            frames: 0,
            mutations: 0,
        });

        if self.state() == PlaybackState::Completed {
            self.send(Command::Stop);
        }
        self.machine.clear_history();

        self.cursor.reset();
        self.cursor.show();
        self.send(Command::Start);
        self.tick(now);
    }

    /// Process one frame of the active run
    fn tick(&mut self, now: Duration) {
        let Some(run) = self.run.as_mut() else {
            return;
        };

        let clock = run.clock.update(now);
        let progress = run.clock.progress();
        let mutations = run.interpreter.advance(progress, &self.resolver, &mut self.cursor);
        self.cursor.advance(clock.delta);

        run.frames += 1;
        run.mutations += mutations.len();
        for mutation in &mutations {
            self.host.on_field(mutation);
        }

        if clock.reached_end {
            self.cursor.hide();
        }
        self.host.on_progress(progress);
        self.host.on_cursor(self.cursor.frame());

        if !clock.reached_end {
            run.pending = Some(self.scheduler.request_frame());
            return;
        }
        if run.completed {
            return;
        }

        run.completed = true;
        let name = run.scenario.name.clone();
        let frames = run.frames;
        self.send(Command::Finish);
        tracing::info!(scenario = %name, frames, "playback complete");
        self.host.on_complete(&name);
    }

    fn send(&mut self, command: Command) -> bool {
        match self.machine.send(command) {
            Some(transition) => {
                if transition.from != transition.to {
                    self.host.on_state_change(transition.from, transition.to);
                }
                true
            }
            None => {
                tracing::warn!(state = %self.state(), ?command, "command ignored");
                false
            }
        }
    }
}

fn cancel<S: FrameScheduler>(scheduler: &mut S, run: &mut ActiveRun) {
    if let Some(token) = run.pending.take() {
        scheduler.cancel_frame(token);
    }
}

impl<R: TargetResolver, H: PlaybackHost> PlaybackController<R, H, ManualScheduler> {
    /// Advance the manual scheduler one frame and deliver what fires.
    /// Returns false when nothing was waiting.
    pub fn advance_frame(&mut self) -> bool {
        let frames = self.scheduler.advance_frame();
        self.deliver(frames) > 0
    }
}

impl<R: TargetResolver, H: PlaybackHost> PlaybackController<R, H, SystemScheduler> {
    /// Deliver every frame that is due on the wall clock
    pub fn pump(&mut self) -> usize {
        let frames = self.scheduler.take_due();
        self.deliver(frames)
    }
}

impl<R, H, S> Drop for PlaybackController<R, H, S>
where
    R: TargetResolver,
    H: PlaybackHost,
    S: FrameScheduler,
{
    fn drop(&mut self) {
        if let Some(run) = self.run.as_mut() {
            cancel(&mut self.scheduler, run);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;
    use crate::resolver::StaticLayout;

    type Controller = PlaybackController<StaticLayout, RecordingHost>;

    fn controller() -> Controller {
        let mut layout = StaticLayout::demo_storefront();
        layout.mount("checkout");
        PlaybackController::new(
            Arc::new(ScenarioCatalog::builtin()),
            layout,
            RecordingHost::new(),
            ManualScheduler::with_interval(Duration::from_millis(100)),
        )
    }

    fn run_to_end(controller: &mut Controller) -> usize {
        let mut frames = 0;
        while controller.advance_frame() {
            frames += 1;
        }
        frames
    }

    #[test]
    fn test_play_unknown_scenario() {
        let mut controller = controller();
        let err = controller.play("Checkout").unwrap_err();
        assert!(matches!(err, GhostError::InvalidScenario(_)));
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.host().events().is_empty());
    }

    #[test]
    fn test_runs_to_completion_once() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(controller.cursor().is_visible());

        // 3000ms at 100ms per frame
        assert_eq!(run_to_end(&mut controller), 30);
        assert_eq!(controller.state(), PlaybackState::Completed);
        assert_eq!(controller.progress(), 1.0);
        assert!(!controller.cursor().is_visible());
        assert_eq!(controller.host().completions(), ["Apply SAVE20"]);
        assert_eq!(controller.scheduler().pending_frames(), 0);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        for _ in 0..5 {
            controller.advance_frame();
        }
        assert!(controller.pause());
        let progress = controller.progress();
        assert!(!controller.cursor().is_visible());
        assert_eq!(controller.pending_frame(), None);

        assert!(!controller.advance_frame());
        assert_eq!(controller.progress(), progress);
        assert!(!controller.pause());

        controller.play("Apply SAVE20").unwrap();
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(controller.cursor().is_visible());
        controller.advance_frame();
        assert!(controller.progress() > progress);
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        let stale = controller.pending_frame().unwrap();

        controller.play("Apply SAVE50").unwrap();
        assert!(!controller.on_frame(stale, Duration::from_secs(10)));
        assert_eq!(controller.progress(), 0.0);
        assert_eq!(controller.stats().unwrap().run_id, 2);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        controller.advance_frame();
        controller.stop();

        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.scheduler().pending_frames(), 0);
        assert!(!controller.cursor().is_visible());
        assert!(controller.host().completions().is_empty());
        assert_eq!(controller.scenario().unwrap().name, "Apply SAVE20");
    }

    #[test]
    fn test_seek_needs_scenario_and_valid_range() {
        let mut controller = controller();
        assert!(matches!(
            controller.seek_to_range(0.2, 0.4),
            Err(GhostError::NoActiveScenario)
        ));

        controller.play("Apply SAVE20").unwrap();
        for (start, end) in [(0.6, 0.3), (-0.1, 0.5), (0.5, 1.5), (0.4, 0.4)] {
            assert!(matches!(
                controller.seek_to_range(start, end),
                Err(GhostError::InvalidRange { .. })
            ));
        }
    }

    #[test]
    fn test_seek_completes_at_range_end() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        controller.seek_to_range(0.3, 0.6).unwrap();
        run_to_end(&mut controller);

        let progress = controller.host().progress();
        let last_run: Vec<f32> = progress.into_iter().skip_while(|p| *p != 0.3).collect();
        assert_eq!(last_run.first(), Some(&0.3));
        assert_eq!(last_run.last(), Some(&0.6));
        assert_eq!(controller.host().completions(), ["Apply SAVE20"]);
    }

    #[test]
    fn test_invalid_speed_keeps_current() {
        let mut controller = controller();
        controller.set_speed(PlaybackSpeed::Double);
        assert!(matches!(
            controller.set_speed_multiplier(1.5),
            Err(GhostError::InvalidSpeed(_))
        ));
        assert_eq!(controller.speed(), PlaybackSpeed::Double);
    }

    #[test]
    fn test_state_changes_reported() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        controller.pause();
        controller.resume();
        run_to_end(&mut controller);
        controller.stop();

        use PlaybackState::*;
        assert_eq!(
            controller.host().transitions(),
            [
                (Idle, Playing),
                (Playing, Paused),
                (Paused, Playing),
                (Playing, Completed),
                (Completed, Idle)
            ]
        );
    }

    #[test]
    fn test_replay_after_completion_passes_through_idle() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        run_to_end(&mut controller);
        controller.host_mut().clear();

        controller.play("Apply SAVE20").unwrap();

        use PlaybackState::*;
        assert_eq!(controller.host().transitions(), [(Completed, Idle), (Idle, Playing)]);
        assert_eq!(
            controller.transitions(),
            [Transition::new(Idle, Command::Start, Playing)]
        );
    }

    #[test]
    fn test_transition_history_is_bounded() {
        let mut controller = controller();
        controller.play("Apply SAVE20").unwrap();
        for _ in 0..10_000 {
            assert!(controller.pause());
            assert!(controller.resume());
        }

        let history = controller.transitions();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(
            history.last(),
            Some(&Transition::new(PlaybackState::Paused, Command::Resume, PlaybackState::Playing))
        );

        // A new run starts a fresh history
        controller.play("Apply SAVE50").unwrap();
        assert_eq!(controller.transitions().len(), 1);
    }

    #[test]
    fn test_pump_on_wall_clock_completes_once() {
        use crate::script::{FieldValue, Step};

        let mut catalog = ScenarioCatalog::new();
        catalog
            .insert(
                Scenario::new("Quick apply", Duration::from_millis(60))
                    .on_page("checkout")
                    .step(Step::click("apply-button", 0.0..1.0)),
            )
            .unwrap();
        let mut layout = StaticLayout::demo_storefront();
        layout.mount("checkout");
        let mut controller = PlaybackController::new(
            Arc::new(catalog),
            layout,
            RecordingHost::new(),
            SystemScheduler::new(),
        );

        controller.play("Quick apply").unwrap();
        let mut pumps = 0;
        while controller.state() == PlaybackState::Playing {
            assert!(pumps < 1_000, "wall-clock run did not finish");
            std::thread::sleep(Duration::from_millis(5));
            controller.pump();
            pumps += 1;
        }

        // Frames after completion are never requested again
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(controller.pump(), 0);

        let host = controller.host();
        assert_eq!(controller.state(), PlaybackState::Completed);
        assert_eq!(host.completions(), ["Quick apply"]);
        let presses = host.mutations_for("apply-button");
        assert_eq!(presses.len(), 1);
        assert_eq!(presses[0].value, FieldValue::Pressed);
        assert_eq!(controller.scheduler().pending_frames(), 0);
        assert_eq!(controller.progress(), 1.0);
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let mut scheduler = ManualScheduler::new();
        {
            let mut layout = StaticLayout::demo_storefront();
            layout.mount("checkout");
            let mut controller = PlaybackController::new(
                Arc::new(ScenarioCatalog::builtin()),
                layout,
                (),
                &mut scheduler,
            );
            controller.play("Apply SAVE20").unwrap();
            assert_eq!(controller.scheduler().pending_frames(), 1);
        }
        assert_eq!(scheduler.pending_frames(), 0);
    }
}
