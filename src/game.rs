//! Frame driver
//!
//! Owns the simulation state and its collaborators and runs one frame per
//! callback: poll the asset loader, run the fixed steps the clock allows,
//! route events to audio/UI, then publish the frame.

use crate::consts::SIM_DT;
use crate::error::{ConfigError, TransitionError};
use crate::highscores::{HighScoreEntry, HighScores};
use crate::level::LevelTable;
use crate::platform::{
    AssetLoader, AudioSink, FrameClock, InputQueue, LoadPoll, RenderSink, Resume, Sfx, UiSink,
};
use crate::sim::{
    GameEvent, GamePhase, GameState, HudSnapshot, InputRequest, LevelTransitionController,
    LoadOutcome, LoadRequest, Outcome, StreamRecycler, TickInput, TransitionKind, tick,
};
use crate::tuning::Tuning;

pub struct Game<R, A, U, L> {
    state: GameState,
    controller: LevelTransitionController,
    clock: FrameClock,
    input: InputQueue,
    high_scores: HighScores,
    /// Level the loader was last asked for
    loader_level: Option<u32>,
    /// Wall time of the latest frame, for high score timestamps
    now_ms: f64,
    render: R,
    audio: A,
    ui: U,
    loader: L,
}

impl<R, A, U, L> Game<R, A, U, L>
where
    R: RenderSink,
    A: AudioSink,
    U: UiSink,
    L: AssetLoader,
{
    pub fn new(
        seed: u64,
        levels: LevelTable,
        tuning: Tuning,
        render: R,
        audio: A,
        ui: U,
        loader: L,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;
        if levels.is_empty() {
            return Err(ConfigError::InvalidLevel {
                level: 0,
                reason: "no levels configured".into(),
            });
        }
        log::info!("New game (seed {}, {} levels)", seed, levels.len());
        Ok(Self {
            state: GameState::new(seed, tuning.starting_lives),
            clock: FrameClock::new(tuning.long_absence_ms),
            controller: LevelTransitionController::new(levels, tuning),
            input: InputQueue::new(),
            high_scores: HighScores::load(),
            loader_level: None,
            now_ms: 0.0,
            render,
            audio,
            ui,
            loader,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn hud(&self) -> HudSnapshot {
        self.state.hud()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn tuning(&self) -> &Tuning {
        self.controller.tuning()
    }

    /// Start a run from the menu
    pub fn start(&mut self, level: Option<u32>) -> Result<(), TransitionError> {
        let result = self.controller.start(&mut self.state, level);
        self.after_request(result)
    }

    pub fn restart(&mut self, level: Option<u32>) -> Result<(), TransitionError> {
        let result = self.controller.restart(&mut self.state, level);
        self.after_request(result)
    }

    pub fn jump(&mut self, level: u32) -> Result<(), TransitionError> {
        let result = self.controller.jump(&mut self.state, level);
        self.after_request(result)
    }

    pub fn return_to_menu(&mut self) {
        self.controller.return_to_menu(&mut self.state);
        self.loader_level = None;
        self.input.clear();
        self.audio.stop_music();
        self.publish();
    }

    pub fn push_input(&mut self, request: InputRequest) {
        self.input.push(request);
    }

    /// Page / window visibility changed
    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        if !visible {
            self.clock.hide(now_ms);
            return;
        }
        if self.clock.show(now_ms) == Resume::Renormalize {
            if let Some(world) = self.state.world.as_mut() {
                StreamRecycler::from_tuning(self.controller.tuning())
                    .renormalize(&world.lanes, &mut world.obstacles);
            }
        }
        // Inputs made while hidden are stale
        self.input.clear();
    }

    /// Run one display frame
    pub fn frame(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
        self.poll_loader();

        let substeps = self.clock.advance(now_ms);
        for step in 0..substeps {
            let input = if step == 0 {
                self.input.take()
            } else {
                TickInput::default()
            };
            tick(&mut self.state, &input, self.controller.tuning(), SIM_DT);
        }

        self.route_events();

        if self.state.phase
            == (GamePhase::Transitioning {
                kind: TransitionKind::LevelComplete,
                ticks_remaining: 0,
            })
        {
            let result = self.controller.advance(&mut self.state);
            if self.after_request(result).is_err() {
                self.return_to_menu();
            }
        }

        self.draw();
        self.publish();
    }

    fn after_request(
        &mut self,
        result: Result<LoadRequest, TransitionError>,
    ) -> Result<(), TransitionError> {
        match result {
            Ok(LoadRequest::Started) => {
                self.input.clear();
                self.begin_load();
                Ok(())
            }
            Ok(LoadRequest::Coalesced) => Ok(()),
            Err(err) => {
                self.ui.notify(&err.to_string());
                Err(err)
            }
        }
    }

    fn begin_load(&mut self) {
        if let GamePhase::Loading { target, .. } = self.state.phase {
            if self.loader_level != Some(target) {
                self.loader.begin(target);
                self.loader_level = Some(target);
            }
        }
    }

    fn poll_loader(&mut self) {
        let GamePhase::Loading { target, .. } = self.state.phase else {
            return;
        };
        self.begin_load();

        match self.loader.poll(target) {
            LoadPoll::Pending => {}
            LoadPoll::Ready { warnings } => {
                self.loader_level = None;
                let mut missing = Vec::new();
                for warning in &warnings {
                    log::warn!("Level {} loaded with a problem: {}", target, warning);
                    if let TransitionError::ResourceLoad { resource, .. } = warning {
                        missing.push(resource.clone());
                    }
                }
                if !missing.is_empty() {
                    self.render.missing_resources(&missing);
                }

                match self.controller.complete_load(&mut self.state) {
                    Ok(LoadOutcome::Loaded(_)) => {}
                    Ok(LoadOutcome::Recovered { intended, loaded }) => {
                        self.ui.notify(&format!(
                            "Level {intended} could not be restored; continuing from level {loaded}"
                        ));
                    }
                    Err(err) => self.ui.notify(&err.to_string()),
                }
            }
            LoadPoll::Failed(err) => {
                self.loader_level = None;
                self.ui.notify(&err.to_string());
                self.controller.fail_load(&mut self.state, err);
                // A failed next-level load would otherwise be retried forever
                if matches!(
                    self.state.phase,
                    GamePhase::Transitioning {
                        kind: TransitionKind::LevelComplete,
                        ..
                    }
                ) {
                    self.return_to_menu();
                }
            }
        }
    }

    fn route_events(&mut self) {
        for event in self.state.drain_events() {
            if let Some(sfx) = Sfx::for_event(&event) {
                self.audio.play_sfx(sfx);
            }
            match event {
                GameEvent::LevelLoaded { level } => self.audio.play_level_music(level),
                GameEvent::LevelComplete { level } => {
                    self.ui.notify(&format!("Level {level} complete!"));
                }
                GameEvent::Victory => {
                    self.audio.stop_music();
                    self.ui.notify("You got every frog home!");
                    self.record_score(Outcome::Victory);
                }
                GameEvent::GameOver => {
                    self.audio.stop_music();
                    self.ui.notify("Game over");
                    self.record_score(Outcome::GameOver);
                }
                _ => {}
            }
        }
    }

    fn record_score(&mut self, outcome: Outcome) {
        let entry = HighScoreEntry::from_run(&self.state.progress, outcome, self.now_ms);
        let (score, frogs) = (entry.score, entry.frogs_saved);
        if let Some(rank) = self.high_scores.add(entry) {
            log::info!("New high score #{}: {} ({} frogs saved)", rank, score, frogs);
            self.high_scores.save();
        }
    }

    fn draw(&mut self) {
        self.render.begin_frame();
        for obstacle in self.state.obstacles() {
            self.render.place_obstacle(obstacle);
        }
        if self.state.world.is_some() {
            self.render.place_player(self.state.player.position);
        }
        self.render.end_frame();
    }

    fn publish(&mut self) {
        let hud = self.state.hud();
        self.ui.publish(&hud);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ImmediateLoader, LogAudio, LogUi, RecordingRenderer};

    type TestGame = Game<RecordingRenderer, LogAudio, LogUi, ImmediateLoader>;

    fn game_with(loader: ImmediateLoader) -> TestGame {
        Game::new(
            2024,
            LevelTable::builtin(),
            Tuning::default(),
            RecordingRenderer::new(),
            LogAudio::default(),
            LogUi::default(),
            loader,
        )
        .unwrap()
    }

    /// Run frames 1/60s apart starting at `t`, returning the next time
    fn run_frames(game: &mut TestGame, mut t: f64, n: usize) -> f64 {
        for _ in 0..n {
            game.frame(t);
            t += 1000.0 / 60.0;
        }
        t
    }

    #[test]
    fn test_rejects_invalid_tuning() {
        let tuning = Tuning {
            hit_radius: -1.0,
            ..Default::default()
        };
        let result = Game::new(
            1,
            LevelTable::builtin(),
            tuning,
            RecordingRenderer::new(),
            LogAudio::default(),
            LogUi::default(),
            ImmediateLoader::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_start_loads_after_loader_finishes() {
        let mut game = game_with(ImmediateLoader::new().with_delay(3));
        game.start(None).unwrap();

        let t = run_frames(&mut game, 0.0, 3);
        assert!(game.state().is_loading());
        // Nothing to draw yet
        assert!(game.render().last_frame().player.is_none());

        run_frames(&mut game, t, 2);
        assert_eq!(game.state().phase, GamePhase::Playing);
        assert_eq!(game.hud().level, 1);
        assert_eq!(game.audio().music, Some(1));
        assert!(!game.render().last_frame().obstacles.is_empty());
    }

    #[test]
    fn test_restart_while_loading_is_coalesced_or_rejected() {
        let mut game = game_with(ImmediateLoader::new().with_delay(5));
        game.start(Some(3)).unwrap();
        game.frame(0.0);

        assert!(game.restart(Some(3)).is_ok());
        assert!(matches!(
            game.restart(Some(1)),
            Err(TransitionError::ConcurrentLoad {
                in_flight: 3,
                requested: 1
            })
        ));
        assert_eq!(game.ui().notices.len(), 1);

        run_frames(&mut game, 16.0, 6);
        assert_eq!(game.state().progress.current_level, 3);
        assert_eq!(game.state().progress.frogs_needed, 5);
    }

    #[test]
    fn test_failed_load_keeps_previous_level() {
        let err = TransitionError::ResourceLoad {
            resource: "level2".into(),
            fatal: true,
        };
        let mut game = game_with(ImmediateLoader::new().with_failure(2, err));
        game.start(None).unwrap();
        let t = run_frames(&mut game, 0.0, 2);

        game.jump(2).unwrap();
        run_frames(&mut game, t, 2);

        assert_eq!(game.state().phase, GamePhase::Playing);
        assert_eq!(game.state().progress.current_level, 1);
        assert!(game.ui().notices.iter().any(|n| n.contains("level2")));
    }

    #[test]
    fn test_missing_mesh_uses_placeholder() {
        let mut game = game_with(ImmediateLoader::new().with_missing(1, "truck"));
        game.start(Some(1)).unwrap();
        run_frames(&mut game, 0.0, 3);

        let frame = game.render().last_frame();
        assert!(frame.obstacles.iter().all(|p| p.mesh != "truck"));
        assert_eq!(game.state().phase, GamePhase::Playing);
    }

    #[test]
    fn test_input_reaches_the_frog() {
        let mut game = game_with(ImmediateLoader::new());
        game.start(None).unwrap();
        let t = run_frames(&mut game, 0.0, 2);

        game.push_input(InputRequest::Ability(crate::sim::Ability::Croak));
        run_frames(&mut game, t, 2);
        assert!(game.audio().played.contains(&Sfx::Croak));
    }

    #[test]
    fn test_long_absence_renormalizes_lanes() {
        let mut game = game_with(ImmediateLoader::new());
        game.start(None).unwrap();
        let t = run_frames(&mut game, 0.0, 10);
        let ticks = game.state().time_ticks;

        game.set_visible(false, t);
        run_frames(&mut game, t, 5);
        assert_eq!(game.state().time_ticks, ticks);

        game.set_visible(true, t + 60_000.0);
        let bound = game.tuning().reset_bound();
        assert!(
            game.state()
                .obstacles()
                .iter()
                .all(|o| o.position.x >= -bound && o.position.x < bound)
        );
        // No time passes on the resume frame itself
        game.frame(t + 60_000.0);
        assert_eq!(game.state().time_ticks, ticks);
    }

    #[test]
    fn test_game_over_records_high_score() {
        let mut game = game_with(ImmediateLoader::new());
        game.start(None).unwrap();
        let mut t = run_frames(&mut game, 0.0, 2);

        // Walk straight ahead until the run ends
        for _ in 0..20_000 {
            game.push_input(InputRequest::forward());
            t = run_frames(&mut game, t, 1);
            if matches!(game.state().phase, GamePhase::Ended { .. }) {
                break;
            }
        }

        match game.state().phase {
            GamePhase::Ended {
                outcome: Outcome::GameOver,
            } => {
                assert_eq!(game.state().progress.lives, 0);
                assert!(game.audio().played.contains(&Sfx::GameOver));
                assert_eq!(game.audio().music, None);
                if game.state().progress.score > 0 {
                    let best = &game.high_scores().entries[0];
                    assert_eq!(best.score, game.state().progress.score);
                    assert_eq!(best.outcome, Outcome::GameOver);
                    assert_eq!(best.frogs_saved, game.state().progress.frogs_saved);
                }
            }
            other => panic!("expected game over, got {other:?}"),
        }
    }

    #[test]
    fn test_menu_disposes_world() {
        let mut game = game_with(ImmediateLoader::new());
        game.start(None).unwrap();
        let t = run_frames(&mut game, 0.0, 2);
        game.return_to_menu();
        run_frames(&mut game, t, 1);
        assert_eq!(game.state().phase, GamePhase::Idle);
        assert!(game.render().last_frame().obstacles.is_empty());
        assert_eq!(game.hud().phase, "idle");
    }
}
