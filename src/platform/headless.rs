//! Headless collaborators
//!
//! Used by the native runner, by the browser bridge for its JSON frame
//! snapshots, and by tests. None of them draw or make sound; they record
//! what they were told and log it.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec3;
use serde::Serialize;

use super::{AssetLoader, AudioSink, LoadPoll, MeshRegistry, RenderSink, Sfx, UiSink};
use crate::error::TransitionError;
use crate::sim::{HudSnapshot, ObstacleEntity, ObstacleKind};

/// Mesh key drawn for anything missing
pub const PLACEHOLDER_MESH: &str = "placeholder";

/// One obstacle as placed in a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: u32,
    pub mesh: &'static str,
    pub position: Vec3,
    pub tint: u32,
}

/// Everything placed between `begin_frame` and `end_frame`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameRecord {
    pub obstacles: Vec<Placement>,
    pub player: Option<Vec3>,
}

/// Keeps the last complete frame
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    registry: MeshRegistry<&'static str>,
    current: FrameRecord,
    last: FrameRecord,
    frames: u64,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRenderer {
    pub fn new() -> Self {
        let mut registry = MeshRegistry::new(PLACEHOLDER_MESH);
        for kind in ObstacleKind::ALL {
            let mesh = kind.descriptor().mesh;
            registry.register(mesh, mesh);
        }
        Self {
            registry,
            current: FrameRecord::default(),
            last: FrameRecord::default(),
            frames: 0,
        }
    }

    pub fn last_frame(&self) -> &FrameRecord {
        &self.last
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for RecordingRenderer {
    fn begin_frame(&mut self) {
        self.current.obstacles.clear();
        self.current.player = None;
    }

    fn place_obstacle(&mut self, obstacle: &ObstacleEntity) {
        let descriptor = obstacle.kind().descriptor();
        let mesh = *self.registry.resolve(descriptor.mesh);
        self.current.obstacles.push(Placement {
            id: obstacle.id,
            mesh,
            position: obstacle.position,
            tint: descriptor.tint,
        });
    }

    fn place_player(&mut self, position: Vec3) {
        self.current.player = Some(position);
    }

    fn end_frame(&mut self) {
        std::mem::swap(&mut self.current, &mut self.last);
        self.frames += 1;
    }

    fn missing_resources(&mut self, resources: &[String]) {
        for resource in resources {
            self.registry.mark_missing(resource);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogAudio {
    pub played: Vec<Sfx>,
    pub music: Option<u32>,
}

impl AudioSink for LogAudio {
    fn play_sfx(&mut self, sfx: Sfx) {
        log::debug!("sfx: {:?}", sfx);
        self.played.push(sfx);
    }

    fn play_level_music(&mut self, level: u32) {
        log::debug!("music: level {}", level);
        self.music = Some(level);
    }

    fn stop_music(&mut self) {
        self.music = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogUi {
    pub hud: Option<HudSnapshot>,
    pub notices: Vec<String>,
}

impl UiSink for LogUi {
    fn publish(&mut self, hud: &HudSnapshot) {
        if self.hud.as_ref() != Some(hud) {
            self.hud = Some(hud.clone());
        }
    }

    fn notify(&mut self, message: &str) {
        log::info!("{}", message);
        self.notices.push(message.to_string());
    }
}

/// Loader with nothing to fetch
///
/// Ready after a configurable number of polls, with optional scripted
/// failures and warnings per level.
#[derive(Debug, Clone, Default)]
pub struct ImmediateLoader {
    delay_polls: u32,
    in_flight: Option<(u32, u32)>,
    failures: BTreeMap<u32, VecDeque<TransitionError>>,
    warnings: BTreeMap<u32, Vec<TransitionError>>,
}

impl ImmediateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `Pending` this many times before finishing
    pub fn with_delay(mut self, polls: u32) -> Self {
        self.delay_polls = polls;
        self
    }

    /// Fail the next load of `level` with `err`
    pub fn with_failure(mut self, level: u32, err: TransitionError) -> Self {
        self.failures.entry(level).or_default().push_back(err);
        self
    }

    /// Every load of `level` reports `resource` as a non-fatal failure
    pub fn with_missing(mut self, level: u32, resource: impl Into<String>) -> Self {
        self.warnings
            .entry(level)
            .or_default()
            .push(TransitionError::ResourceLoad {
                resource: resource.into(),
                fatal: false,
            });
        self
    }
}

impl AssetLoader for ImmediateLoader {
    fn begin(&mut self, level: u32) {
        self.in_flight = Some((level, self.delay_polls));
    }

    fn poll(&mut self, level: u32) -> LoadPoll {
        match self.in_flight {
            Some((loading, remaining)) if loading == level && remaining > 0 => {
                self.in_flight = Some((loading, remaining - 1));
                return LoadPoll::Pending;
            }
            Some((loading, _)) if loading == level => {}
            _ => return LoadPoll::Pending,
        }
        self.in_flight = None;

        if let Some(err) = self.failures.get_mut(&level).and_then(|q| q.pop_front()) {
            return LoadPoll::Failed(err);
        }
        LoadPoll::Ready {
            warnings: self.warnings.get(&level).cloned().unwrap_or_default(),
        }
    }
}
