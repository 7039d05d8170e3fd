//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (obstacle list order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod recycler;
pub mod ride;
pub mod state;
pub mod stream;
pub mod tick;
pub mod transition;
pub mod zone;

pub use collision::{CollisionClassifier, CollisionOutcome, DangerLevel, FailureCause};
pub use entity::{CosmeticDescriptor, Lane, ObstacleEntity, ObstacleKind};
pub use recycler::StreamRecycler;
pub use ride::PlayerRideState;
pub use state::{
    GameEvent, GamePhase, GameState, HudSnapshot, LevelProgress, LevelWorld, LoadReason, Outcome,
    Player, TransitionKind,
};
pub use stream::{LaneStreamGenerator, stream_count};
pub use tick::{Ability, InputRequest, TickInput, tick};
pub use transition::{LevelTransitionController, LoadOutcome, LoadRequest};
pub use zone::{Zone, ZoneMap, ZoneSpan};
