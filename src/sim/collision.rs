//! Zone-based collision classification
//!
//! Each tick the frog's depth picks a zone, and the zone picks the rules:
//! water needs a platform underfoot, the road needs the frog to stay clear of
//! traffic, everything else is safe ground. The result carries a 0-2 danger
//! level for feedback, independent of whether the attempt actually failed.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{ObstacleEntity, ObstacleKind};
use super::ride::PlayerRideState;
use super::zone::{Zone, ZoneMap};
use crate::planar_distance;
use crate::tuning::Tuning;

/// Graduated danger signal (safe / caution / critical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DangerLevel {
    #[default]
    Safe = 0,
    Caution = 1,
    Critical = 2,
}

impl DangerLevel {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Why an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FailureCause {
    /// Struck by a road obstacle
    Hit { obstacle: u32, kind: ObstacleKind },
    /// In the water with no platform close enough
    Drowned,
    /// Carried off the edge of the screen on a platform
    SweptAway,
}

/// What the classifier decided this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionOutcome {
    pub zone: Zone,
    pub danger: DangerLevel,
    pub failure: Option<FailureCause>,
    /// Set when the frog landed on a new platform this tick
    pub attached: Option<u32>,
}

impl CollisionOutcome {
    fn safe(zone: Zone) -> Self {
        Self {
            zone,
            danger: DangerLevel::Safe,
            failure: None,
            attached: None,
        }
    }
}

/// Per-zone hit / ride / drown rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionClassifier {
    pub hit_radius: f32,
    pub contact_radius: f32,
    pub nearby_radius: f32,
    pub road_critical_radius: f32,
    pub road_caution_radius: f32,
    /// The frog is lost once carried beyond this |x|
    pub carry_limit: f32,
}

impl CollisionClassifier {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            hit_radius: tuning.hit_radius,
            contact_radius: tuning.contact_radius,
            nearby_radius: tuning.nearby_radius,
            road_critical_radius: tuning.road_critical_radius,
            road_caution_radius: tuning.road_caution_radius,
            carry_limit: tuning.visible_half_width(),
        }
    }

    /// Classify the frog against post-recycle obstacle positions.
    ///
    /// May move the frog (riding) and update the ride state; never touches
    /// lives or score.
    pub fn classify(
        &self,
        player: &mut Vec3,
        ride: &mut PlayerRideState,
        obstacles: &[ObstacleEntity],
        zones: &ZoneMap,
        dangerous: &[ObstacleKind],
    ) -> CollisionOutcome {
        let zone = zones.classify(player.z);
        match zone {
            Zone::Water => self.classify_water(player, ride, obstacles),
            Zone::Road => {
                ride.detach();
                self.classify_road(*player, obstacles, dangerous)
            }
            Zone::Start | Zone::Median | Zone::Goal => {
                ride.detach();
                CollisionOutcome::safe(zone)
            }
            Zone::Unknown => CollisionOutcome {
                danger: DangerLevel::Caution,
                ..CollisionOutcome::safe(zone)
            },
        }
    }

    fn classify_water(
        &self,
        player: &mut Vec3,
        ride: &mut PlayerRideState,
        obstacles: &[ObstacleEntity],
    ) -> CollisionOutcome {
        let mut outcome = CollisionOutcome::safe(Zone::Water);

        // Ride first so contact is measured from where the platform put us
        if let Some(x) = ride.carried_x(obstacles) {
            player.x = x;
            if x.abs() > self.carry_limit {
                ride.detach();
                outcome.danger = DangerLevel::Critical;
                outcome.failure = Some(FailureCause::SweptAway);
                return outcome;
            }
        }

        let nearest = nearest_obstacle(*player, obstacles, |o| o.is_rideable());

        match nearest {
            Some((obstacle, distance)) if distance < self.contact_radius => {
                if ride.attach(obstacle, player.x) {
                    outcome.attached = Some(obstacle.id);
                }
                if let Some(x) = ride.carried_x(obstacles) {
                    player.x = x;
                }
            }
            nearest => {
                // No contact drowns; a platform in the nearby band only softens the signal
                ride.detach();
                outcome.danger = match nearest {
                    Some((_, distance)) if distance < self.nearby_radius => DangerLevel::Caution,
                    _ => DangerLevel::Critical,
                };
                outcome.failure = Some(FailureCause::Drowned);
            }
        }
        outcome
    }

    fn classify_road(
        &self,
        player: Vec3,
        obstacles: &[ObstacleEntity],
        dangerous: &[ObstacleKind],
    ) -> CollisionOutcome {
        let mut outcome = CollisionOutcome::safe(Zone::Road);
        let mut nearest = f32::INFINITY;

        for obstacle in obstacles {
            if obstacle.is_rideable()
                || !obstacle.is_well_formed()
                || !dangerous.contains(&obstacle.kind())
            {
                continue;
            }
            let distance = planar_distance(obstacle.position, player);
            if distance < self.hit_radius {
                // First hit wins
                outcome.danger = DangerLevel::Critical;
                outcome.failure = Some(FailureCause::Hit {
                    obstacle: obstacle.id,
                    kind: obstacle.kind(),
                });
                return outcome;
            }
            nearest = nearest.min(distance);
        }

        outcome.danger = if nearest < self.road_critical_radius {
            DangerLevel::Critical
        } else if nearest < self.road_caution_radius {
            DangerLevel::Caution
        } else {
            DangerLevel::Safe
        };
        outcome
    }
}

/// Nearest matching obstacle by planar distance; the earliest in list order
/// wins exact ties
fn nearest_obstacle<'a>(
    point: Vec3,
    obstacles: &'a [ObstacleEntity],
    filter: impl Fn(&ObstacleEntity) -> bool,
) -> Option<(&'a ObstacleEntity, f32)> {
    let mut best: Option<(&ObstacleEntity, f32)> = None;
    for obstacle in obstacles {
        if !obstacle.is_well_formed() || !filter(obstacle) {
            continue;
        }
        let distance = planar_distance(obstacle.position, point);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((obstacle, distance));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::zone::ZoneSpan;

    fn zones() -> ZoneMap {
        ZoneMap::new(vec![
            ZoneSpan::new(Zone::Start, -1.0, 1.0),
            ZoneSpan::new(Zone::Road, 1.0, 11.0),
            ZoneSpan::new(Zone::Median, 11.0, 13.0),
            ZoneSpan::new(Zone::Water, 13.0, 23.0),
            ZoneSpan::new(Zone::Goal, 23.0, 25.0),
        ])
        .unwrap()
    }

    fn classifier() -> CollisionClassifier {
        CollisionClassifier::from_tuning(&Tuning::default())
    }

    fn platform(id: u32, x: f32, z: f32, vx: f32) -> ObstacleEntity {
        ObstacleEntity::new(
            id,
            0,
            ObstacleKind::Log,
            true,
            Vec3::new(x, 0.1, z),
            Vec3::new(vx, 0.0, 0.0),
        )
    }

    fn car(id: u32, x: f32, z: f32) -> ObstacleEntity {
        ObstacleEntity::new(
            id,
            0,
            ObstacleKind::Cybertruck,
            false,
            Vec3::new(x, 0.5, z),
            Vec3::new(3.0, 0.0, 0.0),
        )
    }

    const CARS: &[ObstacleKind] = &[ObstacleKind::Cybertruck];

    #[test]
    fn test_safe_zones_detach_and_report_zero() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        ride.attach(&platform(1, 0.0, 14.0, 1.0), 0.0);

        for z in [0.0, 12.0, 24.0] {
            let mut player = Vec3::new(0.0, 0.0, z);
            ride.attach(&platform(1, 0.0, 14.0, 1.0), 0.0);
            let out = c.classify(&mut player, &mut ride, &[car(2, 0.0, z)], &zones(), CARS);
            assert_eq!(out.danger, DangerLevel::Safe);
            assert!(out.failure.is_none());
            assert!(!ride.is_riding());
        }
    }

    #[test]
    fn test_unknown_zone_is_soft_warning() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 40.0);
        let out = c.classify(&mut player, &mut ride, &[], &zones(), CARS);
        assert_eq!(out.zone, Zone::Unknown);
        assert_eq!(out.danger, DangerLevel::Caution);
        assert!(out.failure.is_none());
    }

    #[test]
    fn test_road_hit_within_radius() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 4.0);
        let obstacles = [car(1, 10.0, 4.0), car(2, 1.5, 4.0), car(3, 0.5, 4.0)];
        let out = c.classify(&mut player, &mut ride, &obstacles, &zones(), CARS);
        assert_eq!(out.danger, DangerLevel::Critical);
        // Scan stops at the first obstacle inside the hit radius
        assert_eq!(
            out.failure,
            Some(FailureCause::Hit {
                obstacle: 2,
                kind: ObstacleKind::Cybertruck
            })
        );
    }

    #[test]
    fn test_road_graduated_danger() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let cases = [(2.5, DangerLevel::Critical), (4.0, DangerLevel::Caution), (8.0, DangerLevel::Safe)];
        for (dx, expected) in cases {
            let mut player = Vec3::new(0.0, 0.0, 4.0);
            let out = c.classify(&mut player, &mut ride, &[car(1, dx, 4.0)], &zones(), CARS);
            assert_eq!(out.danger, expected, "distance {dx}");
            assert!(out.failure.is_none());
        }
    }

    #[test]
    fn test_road_ignores_harmless_kinds() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 4.0);
        let mut taxi = car(1, 0.0, 4.0);
        taxi = ObstacleEntity::new(taxi.id, 0, ObstacleKind::Taxi, false, taxi.position, taxi.velocity);
        let out = c.classify(&mut player, &mut ride, &[taxi], &zones(), CARS);
        assert!(out.failure.is_none());
        assert_eq!(out.danger, DangerLevel::Safe);
    }

    #[test]
    fn test_water_contact_attaches() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 14.0);
        let obstacles = [platform(1, 2.5, 14.0, 2.0)];

        let out = c.classify(&mut player, &mut ride, &obstacles, &zones(), CARS);
        assert_eq!(out.danger, DangerLevel::Safe);
        assert_eq!(out.attached, Some(1));
        assert_eq!(ride.offset(), Some(-2.5));
        assert_eq!(player.x, 0.0);
    }

    #[test]
    fn test_water_nearest_platform_wins() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 14.0);
        let obstacles = [platform(1, 2.0, 14.0, 1.0), platform(2, -1.0, 14.0, 1.0)];
        let out = c.classify(&mut player, &mut ride, &obstacles, &zones(), CARS);
        assert_eq!(out.attached, Some(2));
    }

    #[test]
    fn test_water_nearby_without_contact_still_drowns() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 14.0);
        let out = c.classify(&mut player, &mut ride, &[platform(1, 4.0, 14.0, 0.0)], &zones(), CARS);
        assert_eq!(out.danger, DangerLevel::Caution);
        assert_eq!(out.failure, Some(FailureCause::Drowned));
        assert!(!ride.is_riding());
    }

    #[test]
    fn test_water_without_platform_drowns() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 14.0);
        let out = c.classify(&mut player, &mut ride, &[platform(1, 6.0, 14.0, 1.0)], &zones(), CARS);
        assert_eq!(out.danger, DangerLevel::Critical);
        assert_eq!(out.failure, Some(FailureCause::Drowned));
    }

    #[test]
    fn test_riding_follows_platform() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 14.0);
        let mut obstacles = [platform(1, 1.0, 14.0, 3.0)];
        c.classify(&mut player, &mut ride, &obstacles, &zones(), CARS);

        for _ in 0..30 {
            obstacles[0].integrate(1.0 / 60.0);
            let out = c.classify(&mut player, &mut ride, &obstacles, &zones(), CARS);
            assert_eq!(out.danger, DangerLevel::Safe);
            assert!((player.x - obstacles[0].position.x - -1.0).abs() < 1e-4);
        }
        assert!(player.x > 0.4);
    }

    #[test]
    fn test_carried_off_screen_is_swept_away() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(14.0, 0.0, 14.0);
        let mut obstacles = [platform(1, 14.0, 14.0, 6.0)];
        c.classify(&mut player, &mut ride, &obstacles, &zones(), CARS);

        obstacles[0].position.x = 15.5;
        let out = c.classify(&mut player, &mut ride, &obstacles, &zones(), CARS);
        assert_eq!(out.failure, Some(FailureCause::SweptAway));
        assert!(!ride.is_riding());
    }

    #[test]
    fn test_malformed_obstacles_are_skipped() {
        let c = classifier();
        let mut ride = PlayerRideState::default();
        let mut player = Vec3::new(0.0, 0.0, 4.0);
        let mut broken = car(1, 0.0, 4.0);
        broken.position.x = f32::NAN;
        let out = c.classify(&mut player, &mut ride, &[broken], &zones(), CARS);
        assert!(out.failure.is_none());
    }
}
