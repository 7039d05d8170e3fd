//! Platform abstraction layer
//!
//! Collaborator contracts the game talks to, and the browser/native
//! plumbing behind them:
//! - Time/ticks and visibility ([`time`])
//! - Input requests ([`input`])
//! - Headless collaborators for native runs and tests ([`headless`])
//! - Browser bindings (wasm32 only)

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;

use crate::error::TransitionError;
use crate::sim::{FailureCause, GameEvent, HudSnapshot, ObstacleEntity};

pub mod headless;
pub mod input;
pub mod time;
#[cfg(target_arch = "wasm32")]
pub mod web;
#[cfg(target_arch = "wasm32")]
pub mod web_audio;

pub use headless::{ImmediateLoader, LogAudio, LogUi, RecordingRenderer};
pub use input::InputQueue;
pub use time::{FrameClock, Resume};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Hop,
    Dash,
    /// Landed on a platform
    Land,
    Squash,
    Splash,
    SweptAway,
    Rescue,
    LevelComplete,
    Victory,
    GameOver,
    Tongue,
    Croak,
}

impl Sfx {
    /// Cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        let sfx = match event {
            GameEvent::Hop => Sfx::Hop,
            GameEvent::Dash => Sfx::Dash,
            GameEvent::Landed { .. } => Sfx::Land,
            GameEvent::Failed { cause, .. } => match cause {
                FailureCause::Hit { .. } => Sfx::Squash,
                FailureCause::Drowned => Sfx::Splash,
                FailureCause::SweptAway => Sfx::SweptAway,
            },
            GameEvent::Rescued { .. } => Sfx::Rescue,
            GameEvent::LevelComplete { .. } => Sfx::LevelComplete,
            GameEvent::Victory => Sfx::Victory,
            GameEvent::GameOver => Sfx::GameOver,
            GameEvent::Tongue => Sfx::Tongue,
            GameEvent::Croak => Sfx::Croak,
            GameEvent::LevelLoaded { .. } => return None,
        };
        Some(sfx)
    }
}

/// Draws the world. Receives positions only; never queried back.
pub trait RenderSink {
    fn begin_frame(&mut self);
    fn place_obstacle(&mut self, obstacle: &ObstacleEntity);
    fn place_player(&mut self, position: Vec3);
    fn end_frame(&mut self);

    /// Resources that failed to load non-fatally; draw placeholders instead
    fn missing_resources(&mut self, _resources: &[String]) {}
}

pub trait AudioSink {
    fn play_sfx(&mut self, sfx: Sfx);
    fn play_level_music(&mut self, level: u32);
    fn stop_music(&mut self);
}

/// HUD and player-facing messages
pub trait UiSink {
    fn publish(&mut self, hud: &HudSnapshot);
    fn notify(&mut self, message: &str);
}

/// Progress of an asset load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadPoll {
    Pending,
    /// Done; non-fatal problems are reported as warnings
    Ready { warnings: Vec<TransitionError> },
    /// A fatal problem; the load must be abandoned
    Failed(TransitionError),
}

/// Fetches whatever a level needs before it can be built
pub trait AssetLoader {
    fn begin(&mut self, level: u32);
    fn poll(&mut self, level: u32) -> LoadPoll;
}

/// Mesh handles by key, with a shared placeholder for anything missing
///
/// Owned by the render collaborator; there is no global registry.
#[derive(Debug, Clone)]
pub struct MeshRegistry<M> {
    meshes: BTreeMap<String, M>,
    placeholder: M,
    warned: BTreeSet<String>,
}

impl<M> MeshRegistry<M> {
    pub fn new(placeholder: M) -> Self {
        Self {
            meshes: BTreeMap::new(),
            placeholder,
            warned: BTreeSet::new(),
        }
    }

    pub fn register(&mut self, key: impl Into<String>, mesh: M) {
        self.meshes.insert(key.into(), mesh);
    }

    /// Forget a mesh so lookups fall back to the placeholder
    pub fn mark_missing(&mut self, key: &str) {
        if self.meshes.remove(key).is_some() {
            log::warn!("Mesh `{}` unavailable, using placeholder", key);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.meshes.contains_key(key)
    }

    /// Resolve `key`, warning once per missing key
    pub fn resolve(&mut self, key: &str) -> &M {
        if !self.meshes.contains_key(key) && self.warned.insert(key.to_string()) {
            log::warn!("No mesh registered for `{}`, using placeholder", key);
        }
        self.meshes.get(key).unwrap_or(&self.placeholder)
    }
}
