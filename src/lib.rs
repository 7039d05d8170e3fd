//! Frog Crossing - A 3D lane-crossing arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (lane streams, riding, collisions, level flow)
//! - `platform`: Collaborator contracts (render, audio, UI, assets, input, time)
//! - `level`: Data-driven level definitions
//! - `tuning`: Data-driven game balance
//! - `game`: Frame driver wiring the simulation to its collaborators

pub mod error;
pub mod game;
pub mod highscores;
pub mod level;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, TransitionError};
pub use game::Game;
pub use highscores::HighScores;
pub use level::{LevelConfig, LevelTable};
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta (seconds) fed to the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Width of the playfield visible to the camera (world units)
    pub const VISIBLE_WIDTH: f32 = 30.0;
    /// Off-screen distance lanes are pre-populated on each side
    pub const STREAM_BUFFER: f32 = 15.0;
    /// Distance past the visible edge where obstacles wrap around
    pub const RESET_MARGIN: f32 = 15.0;

    /// Road: an obstacle closer than this is a hit
    pub const HIT_RADIUS: f32 = 1.8;
    /// Water: a platform closer than this carries the frog
    pub const CONTACT_RADIUS: f32 = 3.0;
    /// Water: a platform closer than this is "almost there"
    pub const NEARBY_RADIUS: f32 = 5.0;
    /// Road danger thresholds (critical, caution)
    pub const ROAD_CRITICAL_RADIUS: f32 = 3.0;
    pub const ROAD_CAUTION_RADIUS: f32 = 5.0;

    /// Hidden-tab absence after which lanes are re-laid instead of resumed
    pub const LONG_ABSENCE_MS: f64 = 5000.0;
    /// Window in which only one input request is honoured
    pub const INPUT_COOLDOWN_MS: f32 = 150.0;

    /// Distance covered by a single hop (one lane)
    pub const HOP_DISTANCE: f32 = 2.0;
    pub const DASH_HOPS: u32 = 2;

    pub const STARTING_LIVES: u8 = 3;
    pub const HOP_SCORE: u64 = 10;
    pub const RESCUE_SCORE: u64 = 100;
    pub const LEVEL_BONUS: u64 = 500;
    /// Seconds the "level complete" / victory banner holds before moving on
    pub const TRANSITION_SECS: f32 = 2.0;
}

/// Distance on the ground plane (x, z), ignoring the cosmetic y axis
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Wrap `x` into `[-bound, bound)`
#[inline]
pub fn wrap_lateral(x: f32, bound: f32) -> f32 {
    if bound <= 0.0 {
        return 0.0;
    }
    (x + bound).rem_euclid(2.0 * bound) - bound
}
