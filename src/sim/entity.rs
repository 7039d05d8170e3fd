//! Obstacles and the lanes they travel in
//!
//! An obstacle is a plain data record. What it *looks* like is a cosmetic
//! lookup on its kind; the simulation only cares about kind, rideability and
//! kinematics.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Obstacle type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    // Water platforms
    Log,
    Turtle,
    LilyPad,
    // Road vehicles
    Sedan,
    Taxi,
    Truck,
    Tractor,
    Cybertruck,
    PatriotBus,
}

/// Purely visual description of an obstacle kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosmeticDescriptor {
    /// Mesh key the render collaborator resolves
    pub mesh: &'static str,
    /// Length along the lane (world units), used for stream spacing
    pub length: f32,
    /// Resting height of the visual above the lane surface
    pub ride_height: f32,
    pub tint: u32,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 9] = [
        ObstacleKind::Log,
        ObstacleKind::Turtle,
        ObstacleKind::LilyPad,
        ObstacleKind::Sedan,
        ObstacleKind::Taxi,
        ObstacleKind::Truck,
        ObstacleKind::Tractor,
        ObstacleKind::Cybertruck,
        ObstacleKind::PatriotBus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Log => "log",
            ObstacleKind::Turtle => "turtle",
            ObstacleKind::LilyPad => "lilypad",
            ObstacleKind::Sedan => "sedan",
            ObstacleKind::Taxi => "taxi",
            ObstacleKind::Truck => "truck",
            ObstacleKind::Tractor => "tractor",
            ObstacleKind::Cybertruck => "cybertruck",
            ObstacleKind::PatriotBus => "patriotbus",
        }
    }

    /// Whether the frog can stand on this kind unless a lane says otherwise
    pub fn rideable_by_default(&self) -> bool {
        matches!(
            self,
            ObstacleKind::Log | ObstacleKind::Turtle | ObstacleKind::LilyPad
        )
    }

    pub fn descriptor(&self) -> CosmeticDescriptor {
        let (mesh, length, ride_height, tint) = match self {
            ObstacleKind::Log => ("log", 6.0, 0.1, 0x8b5a2b),
            ObstacleKind::Turtle => ("turtle", 2.0, 0.2, 0x2e8b57),
            ObstacleKind::LilyPad => ("lilypad", 1.5, 0.05, 0x55aa33),
            ObstacleKind::Sedan => ("sedan", 2.5, 0.5, 0xd03030),
            ObstacleKind::Taxi => ("taxi", 2.5, 0.5, 0xf2c200),
            ObstacleKind::Truck => ("truck", 5.0, 0.9, 0x3060d0),
            ObstacleKind::Tractor => ("tractor", 3.0, 0.8, 0x2f9e44),
            ObstacleKind::Cybertruck => ("cybertruck", 4.0, 0.7, 0xc0c0c8),
            ObstacleKind::PatriotBus => ("patriotbus", 7.0, 1.2, 0xb22234),
        };
        CosmeticDescriptor {
            mesh,
            length,
            ride_height,
            tint,
        }
    }
}

/// A moving body: a vehicle on the road or a platform on the water
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleEntity {
    pub id: u32,
    /// Index of the owning lane within the level
    pub lane: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    kind: ObstacleKind,
    rideable: bool,
}

impl ObstacleEntity {
    pub fn new(
        id: u32,
        lane: usize,
        kind: ObstacleKind,
        rideable: bool,
        position: Vec3,
        velocity: Vec3,
    ) -> Self {
        Self {
            id,
            lane,
            position,
            velocity,
            kind,
            rideable,
        }
    }

    pub fn kind(&self) -> ObstacleKind {
        self.kind
    }

    pub fn is_rideable(&self) -> bool {
        self.rideable
    }

    /// Lane direction sign derived from velocity (0 for a stopped lane)
    pub fn direction(&self) -> f32 {
        if self.velocity.x > 0.0 {
            1.0
        } else if self.velocity.x < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    /// Position and velocity are finite (safe to simulate)
    pub fn is_well_formed(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    /// Advance by velocity * dt
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

/// A fixed-depth corridor in which one stream of obstacles moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub index: usize,
    pub z_position: f32,
    /// +1 or -1
    pub direction: f32,
    pub speed: f32,
    /// Gap between consecutive obstacles at spawn time
    pub gap: f32,
    /// Obstacle length used for spacing
    pub length: f32,
    pub water: bool,
}

impl Lane {
    /// Distance between consecutive obstacle origins
    pub fn pitch(&self) -> f32 {
        self.length + self.gap
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::new(self.direction * self.speed, 0.0, 0.0)
    }
}
