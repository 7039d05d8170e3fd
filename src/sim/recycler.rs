//! Stream recycling
//!
//! Obstacles that leave the playfield are teleported to the opposite bound,
//! so a fixed pool reads as an endless stream. Nothing is spawned or
//! destroyed during play.

use super::entity::{Lane, ObstacleEntity};
use crate::tuning::Tuning;
use crate::wrap_lateral;

/// Wraps obstacles at `±reset_bound`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamRecycler {
    pub reset_bound: f32,
}

impl StreamRecycler {
    pub fn new(visible_width: f32, margin: f32) -> Self {
        Self {
            reset_bound: visible_width / 2.0 + margin,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            reset_bound: tuning.reset_bound(),
        }
    }

    /// Teleport a single obstacle if it has crossed its outgoing bound.
    /// Returns true if it was moved.
    #[inline]
    pub fn recycle(&self, obstacle: &mut ObstacleEntity) -> bool {
        let bound = self.reset_bound;
        let dir = obstacle.direction();
        if dir > 0.0 && obstacle.position.x > bound {
            obstacle.position.x = -bound;
            true
        } else if dir < 0.0 && obstacle.position.x < -bound {
            obstacle.position.x = bound;
            true
        } else {
            false
        }
    }

    /// Recycle pass over every obstacle; returns how many were teleported
    pub fn recycle_all(&self, obstacles: &mut [ObstacleEntity]) -> usize {
        obstacles
            .iter_mut()
            .filter(|o| o.is_well_formed())
            .map(|o| self.recycle(o))
            .filter(|moved| *moved)
            .count()
    }

    /// Re-lay every lane at its spawn pitch
    ///
    /// Used when the game resumes after a long absence: instead of
    /// integrating a huge delta, each lane keeps its first obstacle (wrapped
    /// back into range) as an anchor and the rest follow at even spacing.
    pub fn renormalize(&self, lanes: &[Lane], obstacles: &mut [ObstacleEntity]) {
        let bound = self.reset_bound;
        for lane in lanes {
            let mut anchor: Option<f32> = None;
            let mut slot = 0usize;
            for obstacle in obstacles.iter_mut().filter(|o| o.lane == lane.index) {
                let base = match anchor {
                    Some(x) => x,
                    None => {
                        let x = if obstacle.position.x.is_finite() {
                            wrap_lateral(obstacle.position.x, bound)
                        } else {
                            -bound
                        };
                        anchor = Some(x);
                        x
                    }
                };
                obstacle.position.x = wrap_lateral(base + slot as f32 * lane.pitch(), bound);
                obstacle.position.z = lane.z_position;
                obstacle.velocity = lane.velocity();
                slot += 1;
            }
        }
        log::info!("Renormalized {} lanes after long absence", lanes.len());
    }
}
