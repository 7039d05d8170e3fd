//! Player riding state
//!
//! While riding, the frog's x is slaved to the platform: `player.x =
//! platform.x + offset`. The offset is captured once, at first contact, and
//! only changes again through lateral hop input or a new contact.

use serde::{Deserialize, Serialize};

use super::entity::ObstacleEntity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRideState {
    /// Id of the obstacle being ridden
    riding: Option<u32>,
    /// Lateral distance from the platform; ignored when not riding
    offset: f32,
}

impl PlayerRideState {
    pub fn riding(&self) -> Option<u32> {
        self.riding
    }

    pub fn is_riding(&self) -> bool {
        self.riding.is_some()
    }

    /// Current offset, only meaningful while riding
    pub fn offset(&self) -> Option<f32> {
        self.riding.map(|_| self.offset)
    }

    /// Attach to `obstacle` unless already riding it. Returns true when a new
    /// attachment was made (offset recomputed).
    pub fn attach(&mut self, obstacle: &ObstacleEntity, player_x: f32) -> bool {
        if self.riding == Some(obstacle.id) {
            return false;
        }
        self.riding = Some(obstacle.id);
        self.offset = player_x - obstacle.position.x;
        true
    }

    pub fn detach(&mut self) {
        self.riding = None;
        self.offset = 0.0;
    }

    /// Lateral hop while riding: shifts the offset instead of the world x
    pub fn shift(&mut self, dx: f32) {
        if self.riding.is_some() {
            self.offset += dx;
        }
    }

    /// Player x implied by the ride, if the ridden obstacle is still present
    pub fn carried_x(&self, obstacles: &[ObstacleEntity]) -> Option<f32> {
        let id = self.riding?;
        obstacles
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.position.x + self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::ObstacleKind;
    use glam::Vec3;
    use proptest::prelude::*;

    fn log_at(id: u32, x: f32, vx: f32) -> ObstacleEntity {
        ObstacleEntity::new(
            id,
            0,
            ObstacleKind::Log,
            true,
            Vec3::new(x, 0.1, 14.0),
            Vec3::new(vx, 0.0, 0.0),
        )
    }

    #[test]
    fn test_attach_captures_offset_once() {
        let mut ride = PlayerRideState::default();
        let log = log_at(3, 4.0, 2.0);

        assert!(ride.attach(&log, 5.5));
        assert_eq!(ride.riding(), Some(3));
        assert_eq!(ride.offset(), Some(1.5));

        // Same obstacle again: offset is not recaptured
        assert!(!ride.attach(&log, 100.0));
        assert_eq!(ride.offset(), Some(1.5));
    }

    #[test]
    fn test_detach_clears() {
        let mut ride = PlayerRideState::default();
        ride.attach(&log_at(1, 0.0, 1.0), 1.0);
        ride.detach();
        assert!(!ride.is_riding());
        assert_eq!(ride.offset(), None);
        assert_eq!(ride.carried_x(&[log_at(1, 0.0, 1.0)]), None);
    }

    #[test]
    fn test_shift_moves_offset_only_while_riding() {
        let mut ride = PlayerRideState::default();
        ride.shift(2.0);
        assert_eq!(ride.offset(), None);

        ride.attach(&log_at(1, 0.0, 1.0), 0.5);
        ride.shift(-2.0);
        assert_eq!(ride.offset(), Some(-1.5));
    }

    #[test]
    fn test_missing_obstacle_carries_nowhere() {
        let mut ride = PlayerRideState::default();
        ride.attach(&log_at(9, 0.0, 1.0), 0.0);
        assert_eq!(ride.carried_x(&[log_at(1, 0.0, 1.0)]), None);
    }

    proptest! {
        #[test]
        fn prop_offset_is_stable_while_carried(
            start in -20.0f32..20.0,
            offset in -2.9f32..2.9,
            vx in -6.0f32..6.0,
            ticks in 1usize..300,
        ) {
            let mut ride = PlayerRideState::default();
            let mut log = log_at(1, start, vx);
            ride.attach(&log, start + offset);

            let dt = 1.0 / 60.0;
            for _ in 0..ticks {
                log.integrate(dt);
                let player_x = ride.carried_x(std::slice::from_ref(&log)).unwrap();
                prop_assert!((player_x - log.position.x - offset).abs() < 1e-3);
            }
        }
    }
}
