//! Data-driven level definitions
//!
//! A level is a set of zone spans along z, road lanes, water lanes and a
//! rescue target. Levels come either from the built-in table or from JSON
//! (`{"1": {...}, "2": {...}}`), and every level is validated before the
//! transition controller will load it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::entity::ObstacleKind;
use crate::sim::zone::{Zone, ZoneMap, ZoneSpan};

/// One obstacle kind a lane may spawn, with its relative weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedKind {
    pub kind: ObstacleKind,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl WeightedKind {
    pub fn new(kind: ObstacleKind, weight: f32) -> Self {
        Self { kind, weight }
    }
}

/// Configuration of a single lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneDefinition {
    pub z_position: f32,
    /// +1 (towards +x) or -1
    pub direction: i8,
    pub speed: f32,
    pub types: Vec<WeightedKind>,
    /// Designer's expected population; the stream generator derives the real
    /// count from spacing and only logs a mismatch
    pub vehicles_per_lane: u32,
    /// Minimum gap between consecutive obstacles
    pub spacing: f32,
    /// Obstacle length override; defaults to the longest configured kind
    #[serde(default)]
    pub length: Option<f32>,
    /// Rideability override for every obstacle in the lane
    #[serde(default)]
    pub rideable: Option<bool>,
}

impl LaneDefinition {
    /// Length used for stream spacing
    pub fn entity_length(&self) -> f32 {
        self.length.unwrap_or_else(|| {
            self.types
                .iter()
                .map(|t| t.kind.descriptor().length)
                .fold(0.0, f32::max)
        })
    }

    pub fn rideable_for(&self, kind: ObstacleKind) -> bool {
        self.rideable.unwrap_or_else(|| kind.rideable_by_default())
    }

    fn validate(&self, level: u32, label: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidLevel {
            level,
            reason: format!("{label} at z={}: {reason}", self.z_position),
        };

        if !self.z_position.is_finite() {
            return Err(invalid("z position is not finite".into()));
        }
        if self.direction != 1 && self.direction != -1 {
            return Err(invalid(format!("direction must be +1 or -1, got {}", self.direction)));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(invalid(format!("speed must be >= 0, got {}", self.speed)));
        }
        if self.types.is_empty() {
            return Err(invalid("no obstacle types configured".into()));
        }
        if let Some(bad) = self
            .types
            .iter()
            .find(|t| !t.weight.is_finite() || t.weight <= 0.0)
        {
            return Err(invalid(format!(
                "weight for {} must be positive, got {}",
                bad.kind.as_str(),
                bad.weight
            )));
        }
        if self.vehicles_per_lane == 0 {
            return Err(invalid("vehicles_per_lane must be at least 1".into()));
        }
        if !self.spacing.is_finite() || self.spacing < 0.0 {
            return Err(invalid(format!("spacing must be >= 0, got {}", self.spacing)));
        }
        let length = self.entity_length();
        if !length.is_finite() || length <= 0.0 {
            return Err(invalid(format!("obstacle length must be positive, got {length}")));
        }
        Ok(())
    }
}

/// Configuration of a whole level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level index this data builds
    pub level: u32,
    #[serde(default)]
    pub name: String,
    pub frogs_needed: u32,
    /// Respawn coordinate (x, z)
    pub start: (f32, f32),
    pub zones: Vec<ZoneSpan>,
    #[serde(rename = "laneDefinitions", alias = "lanes")]
    pub lanes: Vec<LaneDefinition>,
    #[serde(rename = "waterLaneDefinitions", alias = "water_lanes")]
    pub water_lanes: Vec<LaneDefinition>,
    /// Kinds that end the attempt on the road; `None` means every
    /// non-rideable kind
    #[serde(default)]
    pub dangerous: Option<Vec<ObstacleKind>>,
}

impl LevelConfig {
    /// Check that every field the simulation needs is present and sane
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level;
        let invalid = |reason: String| ConfigError::InvalidLevel { level, reason };

        if self.frogs_needed == 0 {
            return Err(invalid("frogs_needed must be at least 1".into()));
        }
        if self.lanes.is_empty() && self.water_lanes.is_empty() {
            return Err(invalid("level has no lanes".into()));
        }

        let zones = ZoneMap::new(self.zones.clone()).map_err(|reason| invalid(reason))?;

        let (start_x, start_z) = self.start;
        if !start_x.is_finite() || zones.classify(start_z) != Zone::Start {
            return Err(invalid(format!(
                "start ({start_x}, {start_z}) is not inside a start zone"
            )));
        }
        if !self.zones.iter().any(|s| s.zone == Zone::Goal) {
            return Err(invalid("level has no goal zone".into()));
        }

        for lane in &self.lanes {
            lane.validate(level, "road lane")?;
            if zones.classify(lane.z_position) != Zone::Road {
                return Err(invalid(format!(
                    "road lane at z={} lies outside every road zone",
                    lane.z_position
                )));
            }
        }
        for lane in &self.water_lanes {
            lane.validate(level, "water lane")?;
            if zones.classify(lane.z_position) != Zone::Water {
                return Err(invalid(format!(
                    "water lane at z={} lies outside every water zone",
                    lane.z_position
                )));
            }
        }
        Ok(())
    }

    /// Whether `kind` is a road hazard on this level
    pub fn is_dangerous(&self, kind: ObstacleKind) -> bool {
        match &self.dangerous {
            Some(kinds) => kinds.contains(&kind),
            None => !kind.rideable_by_default(),
        }
    }
}

/// Level index -> configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable {
    levels: BTreeMap<u32, LevelConfig>,
}

impl LevelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON level table
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: LevelTable = serde_json::from_str(json)?;
        for config in table.levels.values() {
            config.validate()?;
        }
        log::info!("Loaded {} level definitions", table.levels.len());
        Ok(table)
    }

    pub fn insert(&mut self, index: u32, config: LevelConfig) {
        self.levels.insert(index, config);
    }

    pub fn get(&self, index: u32) -> Option<&LevelConfig> {
        self.levels.get(&index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn first_level(&self) -> Option<u32> {
        self.levels.keys().next().copied()
    }

    /// Next configured level after `index`, if any
    pub fn next_level(&self, index: u32) -> Option<u32> {
        self.levels
            .range(index.saturating_add(1)..)
            .next()
            .map(|(k, _)| *k)
    }

    pub fn is_final(&self, index: u32) -> bool {
        self.next_level(index).is_none()
    }

    /// The five shipped levels
    pub fn builtin() -> Self {
        use ObstacleKind::*;

        let mut table = Self::new();
        let builtins = [
            BuiltinLevel {
                level: 1,
                name: "Village Pond",
                frogs_needed: 3,
                road: [
                    row(&[(Sedan, 3.0), (Taxi, 1.0)], 3.0, 9.0),
                    row(&[(Tractor, 1.0)], 2.0, 12.0),
                    row(&[(Sedan, 1.0), (Truck, 1.0)], 3.5, 10.0),
                    row(&[(Taxi, 1.0)], 4.0, 9.0),
                    row(&[(Truck, 1.0)], 2.5, 14.0),
                ],
                water: [
                    row(&[(Log, 1.0)], 2.0, 4.0),
                    row(&[(Turtle, 3.0), (LilyPad, 1.0)], 1.5, 2.0),
                    row(&[(Log, 1.0)], 2.5, 4.0),
                    row(&[(LilyPad, 1.0)], 1.5, 2.5),
                    row(&[(Log, 1.0)], 3.0, 4.0),
                ],
            },
            BuiltinLevel {
                level: 2,
                name: "Harbour Road",
                frogs_needed: 4,
                road: [
                    row(&[(Sedan, 2.0), (Taxi, 2.0)], 4.0, 8.0),
                    row(&[(Truck, 1.0)], 3.0, 11.0),
                    row(&[(Taxi, 1.0)], 5.0, 8.0),
                    row(&[(Tractor, 1.0), (Sedan, 1.0)], 3.0, 9.0),
                    row(&[(Truck, 2.0), (Sedan, 1.0)], 3.5, 10.0),
                ],
                water: [
                    row(&[(Log, 1.0)], 2.5, 5.0),
                    row(&[(Turtle, 1.0)], 2.0, 3.0),
                    row(&[(Log, 1.0)], 3.0, 5.0),
                    row(&[(Turtle, 1.0), (LilyPad, 1.0)], 2.0, 3.0),
                    row(&[(Log, 1.0)], 3.5, 5.0),
                ],
            },
            BuiltinLevel {
                level: 3,
                name: "Tech Boulevard",
                frogs_needed: 5,
                road: [
                    row(&[(Cybertruck, 3.0), (Sedan, 1.0)], 5.0, 9.0),
                    row(&[(Cybertruck, 1.0)], 4.0, 10.0),
                    row(&[(Taxi, 1.0), (Cybertruck, 1.0)], 5.5, 8.0),
                    row(&[(Truck, 1.0)], 3.5, 10.0),
                    row(&[(Cybertruck, 1.0)], 6.0, 9.0),
                ],
                water: [
                    row(&[(Log, 1.0)], 3.0, 5.0),
                    row(&[(Turtle, 1.0)], 2.5, 3.5),
                    row(&[(Log, 1.0)], 3.5, 6.0),
                    row(&[(LilyPad, 1.0)], 2.5, 3.0),
                    row(&[(Log, 1.0)], 4.0, 6.0),
                ],
            },
            BuiltinLevel {
                level: 4,
                name: "Parade Route",
                frogs_needed: 5,
                road: [
                    row(&[(PatriotBus, 1.0)], 3.5, 12.0),
                    row(&[(Sedan, 1.0), (Taxi, 1.0)], 6.0, 8.0),
                    row(&[(PatriotBus, 1.0), (Truck, 1.0)], 4.0, 11.0),
                    row(&[(Cybertruck, 1.0)], 6.5, 9.0),
                    row(&[(PatriotBus, 1.0)], 5.0, 12.0),
                ],
                water: [
                    row(&[(Log, 1.0)], 3.5, 6.0),
                    row(&[(Turtle, 1.0)], 3.0, 4.0),
                    row(&[(Log, 1.0)], 4.0, 6.5),
                    row(&[(Turtle, 1.0), (LilyPad, 1.0)], 3.0, 4.0),
                    row(&[(Log, 1.0)], 4.5, 6.5),
                ],
            },
            BuiltinLevel {
                level: 5,
                name: "Capitol Crossing",
                frogs_needed: 6,
                road: [
                    row(&[(PatriotBus, 1.0), (Cybertruck, 1.0)], 6.0, 10.0),
                    row(&[(Taxi, 1.0)], 7.0, 8.0),
                    row(&[(Truck, 1.0), (PatriotBus, 1.0)], 5.0, 11.0),
                    row(&[(Cybertruck, 2.0), (Sedan, 1.0)], 7.5, 9.0),
                    row(&[(PatriotBus, 1.0)], 6.0, 12.0),
                ],
                water: [
                    row(&[(Log, 1.0)], 4.0, 7.0),
                    row(&[(Turtle, 1.0)], 3.5, 4.5),
                    row(&[(Log, 1.0)], 4.5, 7.0),
                    row(&[(LilyPad, 1.0)], 3.5, 4.5),
                    row(&[(Log, 1.0)], 5.0, 7.5),
                ],
            },
        ];

        for builtin in builtins {
            table.insert(builtin.level, builtin.build());
        }
        table
    }
}

type LaneRow = (&'static [(ObstacleKind, f32)], f32, f32);

fn row(types: &'static [(ObstacleKind, f32)], speed: f32, spacing: f32) -> LaneRow {
    (types, speed, spacing)
}

/// Compact description of a shipped level (kinds, speed, spacing per lane)
struct BuiltinLevel {
    level: u32,
    name: &'static str,
    frogs_needed: u32,
    road: [LaneRow; 5],
    water: [LaneRow; 5],
}

impl BuiltinLevel {
    // Layout: start [-1,1), road [1,11), median [11,13), water [13,23), goal [23,25)
    fn build(self) -> LevelConfig {
        let lane = |(types, speed, spacing): LaneRow, z: f32, direction: i8| LaneDefinition {
            z_position: z,
            direction,
            speed,
            types: types
                .iter()
                .map(|(kind, weight)| WeightedKind::new(*kind, *weight))
                .collect(),
            vehicles_per_lane: 4,
            spacing,
            length: None,
            rideable: None,
        };
        let alternate = |i: usize| if i % 2 == 0 { 1 } else { -1 };

        LevelConfig {
            level: self.level,
            name: self.name.to_string(),
            frogs_needed: self.frogs_needed,
            start: (0.0, 0.0),
            zones: vec![
                ZoneSpan::new(Zone::Start, -1.0, 1.0),
                ZoneSpan::new(Zone::Road, 1.0, 11.0),
                ZoneSpan::new(Zone::Median, 11.0, 13.0),
                ZoneSpan::new(Zone::Water, 13.0, 23.0),
                ZoneSpan::new(Zone::Goal, 23.0, 25.0),
            ],
            lanes: self
                .road
                .into_iter()
                .enumerate()
                .map(|(i, row)| lane(row, 2.0 + 2.0 * i as f32, alternate(i)))
                .collect(),
            water_lanes: self
                .water
                .into_iter()
                .enumerate()
                .map(|(i, row)| lane(row, 14.0 + 2.0 * i as f32, -alternate(i)))
                .collect(),
            dangerous: None,
        }
    }
}
