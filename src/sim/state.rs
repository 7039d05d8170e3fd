//! Game state and core simulation types
//!
//! Everything the tick mutates lives here. Collaborators only ever see it
//! through [`HudSnapshot`] and read-only obstacle references.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{DangerLevel, FailureCause};
use super::entity::{Lane, ObstacleEntity, ObstacleKind};
use super::ride::PlayerRideState;
use super::zone::{Zone, ZoneMap};

/// Why a level load was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadReason {
    /// First start from the menu
    Start,
    /// Explicit level select
    Jump,
    /// Retry after game over / victory, or a deliberate restart
    Restart,
    /// Rescue target met on the previous level
    NextLevel,
    /// Fallback after a corrupted load
    Recovery,
}

impl LoadReason {
    /// Whether lives and score start over with this load
    pub fn resets_progress(&self) -> bool {
        matches!(
            self,
            LoadReason::Start | LoadReason::Restart | LoadReason::Recovery
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Rescue target met, another level follows
    LevelComplete,
    /// Rescue target met on the final level
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory,
    GameOver,
}

/// Lifecycle phase, owned by the level transition controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Menu; nothing loaded
    Idle,
    /// A level is being fetched and built; the tick does nothing
    Loading { target: u32, reason: LoadReason },
    /// Normal play
    Playing,
    /// Level complete / victory banner, counting down in ticks
    Transitioning {
        kind: TransitionKind,
        ticks_remaining: u32,
    },
    /// Victory or game over; only restart / return to menu leave this
    Ended { outcome: Outcome },
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Loading { .. } => "loading",
            GamePhase::Playing => "playing",
            GamePhase::Transitioning { .. } => "transitioning",
            GamePhase::Ended { .. } => "ended",
        }
    }
}

/// Level counters shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub current_level: u32,
    pub frogs_rescued: u32,
    pub frogs_needed: u32,
    /// Rescues across every level of the run
    pub frogs_saved: u32,
    pub score: u64,
    pub lives: u8,
}

impl LevelProgress {
    pub fn new(lives: u8) -> Self {
        Self {
            current_level: 0,
            frogs_rescued: 0,
            frogs_needed: 0,
            frogs_saved: 0,
            score: 0,
            lives,
        }
    }

    pub fn rescue_target_met(&self) -> bool {
        self.frogs_needed > 0 && self.frogs_rescued >= self.frogs_needed
    }
}

/// The frog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec3,
    pub ride: PlayerRideState,
    /// Deepest z reached this attempt (forward-progress scoring)
    pub furthest_z: f32,
}

impl Player {
    pub fn at(start: Vec3) -> Self {
        Self {
            position: start,
            ride: PlayerRideState::default(),
            furthest_z: start.z,
        }
    }
}

/// A constructed level: lanes, obstacle pool and zone layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelWorld {
    /// Level index this world was built from
    pub level: u32,
    pub name: String,
    pub lanes: Vec<Lane>,
    pub obstacles: Vec<ObstacleEntity>,
    pub zones: ZoneMap,
    /// Road kinds that end an attempt on this level
    pub dangerous: Vec<ObstacleKind>,
    pub start: Vec3,
    pub is_final: bool,
}

/// Something that happened during a tick, for audio/UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelLoaded { level: u32 },
    Hop,
    Dash,
    Landed { obstacle: u32 },
    Failed { cause: FailureCause, lives_left: u8 },
    Rescued { rescued: u32, needed: u32 },
    LevelComplete { level: u32 },
    Victory,
    GameOver,
    Tongue,
    Croak,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Independent stream for building a given level
    pub fn level_rng(&self, level: u32) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ (level as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

/// Published view of progress for the UI collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub phase: &'static str,
    pub level: u32,
    pub level_name: String,
    pub score: u64,
    pub lives: u8,
    pub frogs_rescued: u32,
    pub frogs_needed: u32,
    pub danger: u8,
    pub zone: &'static str,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub phase: GamePhase,
    /// Phase to return to if an in-flight load fails
    pub resume_phase: Option<GamePhase>,
    /// Currently constructed level, if any
    pub world: Option<LevelWorld>,
    pub player: Player,
    pub progress: LevelProgress,
    pub danger: DangerLevel,
    pub zone: Zone,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Seconds until the next input request is honoured
    pub input_cooldown: f32,
    /// Events produced since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle game state with the given seed
    pub fn new(seed: u64, lives: u8) -> Self {
        Self {
            seed,
            rng_state: RngState::new(seed),
            phase: GamePhase::Idle,
            resume_phase: None,
            world: None,
            player: Player::at(Vec3::ZERO),
            progress: LevelProgress::new(lives),
            danger: DangerLevel::Safe,
            zone: Zone::Unknown,
            time_ticks: 0,
            input_cooldown: 0.0,
            events: Vec::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, GamePhase::Loading { .. })
    }

    pub fn obstacles(&self) -> &[ObstacleEntity] {
        self.world
            .as_ref()
            .map(|w| w.obstacles.as_slice())
            .unwrap_or(&[])
    }

    /// Drop the current level. Safe to call when nothing is loaded.
    pub fn dispose_level(&mut self) {
        if let Some(world) = self.world.take() {
            log::info!(
                "Disposed level {} ({} obstacles)",
                world.level,
                world.obstacles.len()
            );
        }
        self.player.ride.detach();
    }

    /// Put the frog back on the start coordinate, detached
    pub fn respawn_player(&mut self) {
        let start = self.world.as_ref().map_or(Vec3::ZERO, |w| w.start);
        self.player = Player::at(start);
        self.zone = Zone::Start;
        self.danger = DangerLevel::Safe;
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            phase: self.phase.name(),
            level: self.progress.current_level,
            level_name: self
                .world
                .as_ref()
                .map(|w| w.name.clone())
                .unwrap_or_default(),
            score: self.progress.score,
            lives: self.progress.lives,
            frogs_rescued: self.progress.frogs_rescued,
            frogs_needed: self.progress.frogs_needed,
            danger: self.danger.as_u8(),
            zone: self.zone.as_str(),
        }
    }
}
