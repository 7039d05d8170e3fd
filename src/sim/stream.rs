//! Lane stream generation
//!
//! Each lane gets a fixed pool of obstacles laid out at an even pitch over
//! the visible width plus an off-screen buffer on both sides. Because the
//! pool already extends past both edges, the recycler never has to spawn
//! anything and the player never sees an obstacle pop in.

use glam::Vec3;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::entity::{Lane, ObstacleEntity};
use crate::level::{LaneDefinition, LevelConfig};
use crate::tuning::Tuning;

/// Number of obstacles needed to cover `visible_width + 2 * buffer` at a
/// pitch of `length + gap` (always at least one)
pub fn stream_count(visible_width: f32, buffer: f32, length: f32, gap: f32) -> usize {
    let pitch = length + gap;
    if pitch.is_nan() || pitch <= 0.0 {
        return 1;
    }
    let distance = visible_width + 2.0 * buffer;
    ((distance / pitch).ceil() as usize).max(1)
}

/// Builds obstacle pools for lanes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneStreamGenerator {
    pub visible_width: f32,
    pub buffer: f32,
}

impl LaneStreamGenerator {
    pub fn new(visible_width: f32, buffer: f32) -> Self {
        Self {
            visible_width,
            buffer,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.visible_width, tuning.stream_buffer)
    }

    /// Left edge of the extended stream range; the first obstacle sits here
    pub fn start_x(&self) -> f32 {
        -(self.visible_width / 2.0 + self.buffer)
    }

    pub fn count(&self, length: f32, gap: f32) -> usize {
        stream_count(self.visible_width, self.buffer, length, gap)
    }

    /// Evenly spaced spawn x positions for one lane
    pub fn spawn_positions(&self, length: f32, gap: f32) -> Vec<f32> {
        let pitch = length + gap;
        let start = self.start_x();
        (0..self.count(length, gap))
            .map(|i| start + i as f32 * pitch)
            .collect()
    }

    /// Runtime lane record for a definition
    pub fn lane(&self, index: usize, def: &LaneDefinition, water: bool) -> Lane {
        Lane {
            index,
            z_position: def.z_position,
            direction: if def.direction < 0 { -1.0 } else { 1.0 },
            speed: def.speed,
            gap: def.spacing,
            length: def.entity_length(),
            water,
        }
    }

    /// Spawn one lane's obstacle pool
    ///
    /// Kinds are drawn by weight from the lane's type list; every obstacle
    /// shares the lane's velocity and depth.
    pub fn spawn_lane<R: Rng + ?Sized>(
        &self,
        lane: &Lane,
        def: &LaneDefinition,
        rng: &mut R,
        next_id: &mut u32,
    ) -> Result<Vec<ObstacleEntity>, String> {
        let weights = WeightedIndex::new(def.types.iter().map(|t| t.weight))
            .map_err(|e| format!("lane at z={}: {e}", lane.z_position))?;

        let positions = self.spawn_positions(lane.length, lane.gap);
        if def.vehicles_per_lane as usize != positions.len() {
            log::debug!(
                "Lane z={} spawns {} obstacles (configured {})",
                lane.z_position,
                positions.len(),
                def.vehicles_per_lane
            );
        }

        let velocity = lane.velocity();
        let obstacles = positions
            .into_iter()
            .map(|x| {
                let kind = def.types[weights.sample(&mut *rng)].kind;
                let id = *next_id;
                *next_id += 1;
                ObstacleEntity::new(
                    id,
                    lane.index,
                    kind,
                    def.rideable_for(kind),
                    Vec3::new(x, kind.descriptor().ride_height, lane.z_position),
                    velocity,
                )
            })
            .collect();
        Ok(obstacles)
    }

    /// Build every lane of a level, road lanes first then water lanes
    pub fn populate<R: Rng + ?Sized>(
        &self,
        config: &LevelConfig,
        rng: &mut R,
    ) -> Result<(Vec<Lane>, Vec<ObstacleEntity>), String> {
        let mut lanes = Vec::with_capacity(config.lanes.len() + config.water_lanes.len());
        let mut obstacles = Vec::new();
        let mut next_id = 1;

        let defs = config
            .lanes
            .iter()
            .map(|d| (d, false))
            .chain(config.water_lanes.iter().map(|d| (d, true)));

        for (index, (def, water)) in defs.enumerate() {
            let lane = self.lane(index, def, water);
            obstacles.extend(self.spawn_lane(&lane, def, rng, &mut next_id)?);
            lanes.push(lane);
        }

        Ok((lanes, obstacles))
    }
}
