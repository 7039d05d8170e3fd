//! Level lifecycle
//!
//! Owns the phase machine around the tick: which level is loading, what to
//! fall back to when a load fails, and when the frog counters reset. A load
//! is two-step (`request_load`, then `complete_load` once assets are ready)
//! so the previous world stays intact until the new one is actually built.

use glam::Vec3;

use super::entity::ObstacleKind;
use super::state::{GameEvent, GamePhase, GameState, LevelWorld, LoadReason, TransitionKind};
use super::stream::LaneStreamGenerator;
use super::zone::ZoneMap;
use crate::error::TransitionError;
use crate::level::{LevelConfig, LevelTable};
use crate::tuning::Tuning;

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    /// Entered `Loading`
    Started,
    /// Same level already loading; nothing changed
    Coalesced,
}

/// Result of completing a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(u32),
    /// The intended level came up inconsistent and another was loaded instead
    Recovered { intended: u32, loaded: u32 },
}

impl LoadOutcome {
    pub fn level(&self) -> u32 {
        match self {
            LoadOutcome::Loaded(level) => *level,
            LoadOutcome::Recovered { loaded, .. } => *loaded,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LevelTransitionController {
    levels: LevelTable,
    tuning: Tuning,
}

impl LevelTransitionController {
    pub fn new(levels: LevelTable, tuning: Tuning) -> Self {
        Self { levels, tuning }
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Begin a fresh run from the menu
    pub fn start(
        &self,
        state: &mut GameState,
        level: Option<u32>,
    ) -> Result<LoadRequest, TransitionError> {
        if state.phase != GamePhase::Idle {
            return Err(self.invalid_phase(state, "start a run"));
        }
        let target = self.target_or_first(level)?;
        self.request_load(state, target, LoadReason::Start)
    }

    /// Level select during play; keeps lives and score
    pub fn jump(&self, state: &mut GameState, level: u32) -> Result<LoadRequest, TransitionError> {
        match state.phase {
            GamePhase::Playing | GamePhase::Transitioning { .. } | GamePhase::Loading { .. } => {
                self.request_load(state, level, LoadReason::Jump)
            }
            _ => Err(self.invalid_phase(state, "jump to a level")),
        }
    }

    /// Start over with every counter reset. Defaults to the first level.
    pub fn restart(
        &self,
        state: &mut GameState,
        level: Option<u32>,
    ) -> Result<LoadRequest, TransitionError> {
        let target = self.target_or_first(level)?;
        self.request_load(state, target, LoadReason::Restart)
    }

    /// Load the level after the one just completed
    pub fn advance(&self, state: &mut GameState) -> Result<LoadRequest, TransitionError> {
        if state.phase
            != (GamePhase::Transitioning {
                kind: TransitionKind::LevelComplete,
                ticks_remaining: 0,
            })
        {
            return Err(self.invalid_phase(state, "advance to the next level"));
        }
        let current = state.progress.current_level;
        let next = self.levels.next_level(current).ok_or_else(|| {
            TransitionError::configuration(current.saturating_add(1), "no level follows")
        })?;
        self.request_load(state, next, LoadReason::NextLevel)
    }

    /// Drop the world and go back to `Idle`, abandoning any in-flight load
    pub fn return_to_menu(&self, state: &mut GameState) {
        state.dispose_level();
        state.resume_phase = None;
        state.phase = GamePhase::Idle;
        log::info!("Returned to menu");
    }

    /// Enter `Loading` for `target`
    ///
    /// The target's configuration is validated first; an invalid or unknown
    /// level leaves the state untouched. While another load is in flight a
    /// request for the same level is coalesced and anything else is rejected.
    pub fn request_load(
        &self,
        state: &mut GameState,
        target: u32,
        reason: LoadReason,
    ) -> Result<LoadRequest, TransitionError> {
        if let GamePhase::Loading {
            target: in_flight,
            reason: in_flight_reason,
        } = state.phase
        {
            if in_flight == target {
                // A resetting request still resets when it joins a load
                if reason.resets_progress() && !in_flight_reason.resets_progress() {
                    state.phase = GamePhase::Loading { target, reason };
                }
                log::debug!("Load of level {} already in flight; coalesced", target);
                return Ok(LoadRequest::Coalesced);
            }
            log::warn!(
                "Rejected load of level {} while level {} is loading",
                target,
                in_flight
            );
            return Err(TransitionError::ConcurrentLoad {
                in_flight,
                requested: target,
            });
        }

        if let Err(err) = self.validated(target) {
            log::warn!("Rejected load: {}", err);
            return Err(err);
        }

        state.resume_phase = Some(state.phase);
        state.phase = GamePhase::Loading { target, reason };
        log::info!("Loading level {} ({:?})", target, reason);
        Ok(LoadRequest::Started)
    }

    /// Build the requested level and enter `Playing`
    ///
    /// An inconsistent build is retried once, then replaced by the first
    /// level with all counters reset. If that fails too the game drops back
    /// to `Idle`.
    pub fn complete_load(&self, state: &mut GameState) -> Result<LoadOutcome, TransitionError> {
        let GamePhase::Loading { target, reason } = state.phase else {
            return Err(self.invalid_phase(state, "complete a load"));
        };

        match self.enter_level(state, target, reason) {
            Ok(()) => Ok(LoadOutcome::Loaded(target)),
            Err(err @ TransitionError::StateCorruption { .. }) => self.recover(state, target, reason, err),
            Err(err) => {
                self.fail_load(state, err.clone());
                Err(err)
            }
        }
    }

    /// Abort the in-flight load and restore whatever was running before
    pub fn fail_load(&self, state: &mut GameState, err: TransitionError) {
        log::warn!("Level load failed: {}", err);
        let restored = match state.resume_phase.take() {
            // Nothing to resume into without a world
            Some(GamePhase::Playing | GamePhase::Transitioning { .. }) if state.world.is_none() => {
                GamePhase::Idle
            }
            Some(GamePhase::Loading { .. }) | None => GamePhase::Idle,
            Some(phase) => phase,
        };
        state.phase = restored;
        log::info!("Restored phase {}", restored.name());
    }

    /// Synchronous request + complete, for loaders with nothing to wait on
    pub fn load_now(
        &self,
        state: &mut GameState,
        target: u32,
        reason: LoadReason,
    ) -> Result<LoadOutcome, TransitionError> {
        self.request_load(state, target, reason)?;
        self.complete_load(state)
    }

    /// The tracked level must be the one actually constructed, and its
    /// frog target must come from that level's record
    pub fn check_consistency(&self, state: &GameState) -> Result<(), TransitionError> {
        let tracked = state.progress.current_level;
        let Some(world) = state.world.as_ref() else {
            return Err(TransitionError::StateCorruption {
                tracked,
                constructed: 0,
            });
        };
        if world.level != tracked {
            return Err(TransitionError::StateCorruption {
                tracked,
                constructed: world.level,
            });
        }
        let expected = self.levels.get(tracked).map(|c| c.frogs_needed);
        if expected != Some(state.progress.frogs_needed) {
            return Err(TransitionError::StateCorruption {
                tracked,
                constructed: world.level,
            });
        }
        Ok(())
    }

    fn enter_level(
        &self,
        state: &mut GameState,
        target: u32,
        reason: LoadReason,
    ) -> Result<(), TransitionError> {
        let config = self.validated(target)?;
        let world = self.build_world(state, target, config)?;

        state.dispose_level();
        state.world = Some(world);
        state.progress.current_level = target;
        state.progress.frogs_rescued = 0;
        state.progress.frogs_needed = config.frogs_needed;
        if reason.resets_progress() {
            state.progress.lives = self.tuning.starting_lives;
            state.progress.score = 0;
            state.progress.frogs_saved = 0;
        }
        state.respawn_player();
        state.input_cooldown = 0.0;

        self.check_consistency(state)?;

        state.phase = GamePhase::Playing;
        state.resume_phase = None;
        state.emit(GameEvent::LevelLoaded { level: target });
        log::info!(
            "Level {} ready: {} frogs needed, {} obstacles",
            target,
            config.frogs_needed,
            state.obstacles().len()
        );
        Ok(())
    }

    fn recover(
        &self,
        state: &mut GameState,
        intended: u32,
        reason: LoadReason,
        err: TransitionError,
    ) -> Result<LoadOutcome, TransitionError> {
        log::warn!("{}; retrying level {}", err, intended);
        if self.enter_level(state, intended, reason).is_ok() {
            return Ok(LoadOutcome::Recovered {
                intended,
                loaded: intended,
            });
        }

        if let Some(first) = self.levels.first_level() {
            log::warn!("Falling back to level {} with counters reset", first);
            if self.enter_level(state, first, LoadReason::Recovery).is_ok() {
                return Ok(LoadOutcome::Recovered {
                    intended,
                    loaded: first,
                });
            }
        }

        log::warn!("Recovery failed; returning to menu");
        self.return_to_menu(state);
        Err(err)
    }

    fn build_world(
        &self,
        state: &GameState,
        target: u32,
        config: &LevelConfig,
    ) -> Result<LevelWorld, TransitionError> {
        let zones = ZoneMap::new(config.zones.clone())
            .map_err(|e| TransitionError::configuration(target, e))?;
        let mut rng = state.rng_state.level_rng(target);
        let (lanes, obstacles) = LaneStreamGenerator::from_tuning(&self.tuning)
            .populate(config, &mut rng)
            .map_err(|e| TransitionError::configuration(target, e))?;
        let dangerous = ObstacleKind::ALL
            .into_iter()
            .filter(|kind| config.is_dangerous(*kind))
            .collect();
        let (start_x, start_z) = config.start;

        Ok(LevelWorld {
            // Taken from the record itself so a mislabelled entry is caught
            level: config.level,
            name: config.name.clone(),
            lanes,
            obstacles,
            zones,
            dangerous,
            start: Vec3::new(start_x, 0.0, start_z),
            is_final: self.levels.is_final(target),
        })
    }

    fn validated(&self, target: u32) -> Result<&LevelConfig, TransitionError> {
        let config = self
            .levels
            .get(target)
            .ok_or_else(|| TransitionError::configuration(target, "no such level"))?;
        config
            .validate()
            .map_err(|e| TransitionError::configuration(target, e))?;
        Ok(config)
    }

    fn target_or_first(&self, level: Option<u32>) -> Result<u32, TransitionError> {
        level
            .or_else(|| self.levels.first_level())
            .ok_or_else(|| TransitionError::configuration(1, "level table is empty"))
    }

    fn invalid_phase(&self, state: &GameState, action: &'static str) -> TransitionError {
        let err = TransitionError::InvalidPhase {
            action,
            phase: state.phase.name(),
        };
        log::warn!("{}", err);
        err
    }
}
