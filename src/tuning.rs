//! Data-driven game balance
//!
//! Every empirically tuned number the simulation relies on lives here so it
//! can be overridden from JSON without touching code. Missing fields fall back
//! to the defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Tunable simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Lane streams ===
    /// Width of the camera's visible playfield
    pub visible_width: f32,
    /// Off-screen pre-population on each side at spawn time
    pub stream_buffer: f32,
    /// Distance beyond the visible edge where obstacles wrap
    pub reset_margin: f32,

    // === Collision radii ===
    pub hit_radius: f32,
    pub contact_radius: f32,
    pub nearby_radius: f32,
    pub road_critical_radius: f32,
    pub road_caution_radius: f32,

    // === Timing ===
    /// Hidden-tab absence (ms) after which lanes are re-laid on resume
    pub long_absence_ms: f64,
    /// Input cooldown window (ms)
    pub input_cooldown_ms: f32,
    /// Level complete / victory banner hold (seconds)
    pub transition_secs: f32,

    // === Movement ===
    pub hop_distance: f32,
    pub dash_hops: u32,

    // === Progress ===
    pub starting_lives: u8,
    pub hop_score: u64,
    pub rescue_score: u64,
    pub level_bonus: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            visible_width: VISIBLE_WIDTH,
            stream_buffer: STREAM_BUFFER,
            reset_margin: RESET_MARGIN,

            hit_radius: HIT_RADIUS,
            contact_radius: CONTACT_RADIUS,
            nearby_radius: NEARBY_RADIUS,
            road_critical_radius: ROAD_CRITICAL_RADIUS,
            road_caution_radius: ROAD_CAUTION_RADIUS,

            long_absence_ms: LONG_ABSENCE_MS,
            input_cooldown_ms: INPUT_COOLDOWN_MS,
            transition_secs: TRANSITION_SECS,

            hop_distance: HOP_DISTANCE,
            dash_hops: DASH_HOPS,

            starting_lives: STARTING_LIVES,
            hop_score: HOP_SCORE,
            rescue_score: RESCUE_SCORE,
            level_bonus: LEVEL_BONUS,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Obstacles wrap once they pass this lateral distance from the centre
    pub fn reset_bound(&self) -> f32 {
        self.visible_width / 2.0 + self.reset_margin
    }

    /// Half of the visible width; the frog is lost if carried past it
    pub fn visible_half_width(&self) -> f32 {
        self.visible_width / 2.0
    }

    pub fn input_cooldown_secs(&self) -> f32 {
        self.input_cooldown_ms / 1000.0
    }

    /// Transition banner hold in ticks of length `dt` (at least one)
    pub fn transition_ticks(&self, dt: f32) -> u32 {
        ((self.transition_secs / dt).round() as u32).max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidTuning {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }

        positive("visible_width", self.visible_width)?;
        positive("hit_radius", self.hit_radius)?;
        positive("contact_radius", self.contact_radius)?;
        positive("hop_distance", self.hop_distance)?;
        if self.stream_buffer.is_nan()
            || self.stream_buffer < 0.0
            || self.reset_margin.is_nan()
            || self.reset_margin < 0.0
        {
            return Err(ConfigError::InvalidTuning {
                field: "stream_buffer",
                reason: "buffer and margin must be non-negative".into(),
            });
        }
        if self.nearby_radius < self.contact_radius {
            return Err(ConfigError::InvalidTuning {
                field: "nearby_radius",
                reason: "must be at least contact_radius".into(),
            });
        }
        if self.road_caution_radius < self.road_critical_radius {
            return Err(ConfigError::InvalidTuning {
                field: "road_caution_radius",
                reason: "must be at least road_critical_radius".into(),
            });
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::InvalidTuning {
                field: "starting_lives",
                reason: "a run needs at least one life".into(),
            });
        }
        if self.long_absence_ms.is_nan()
            || self.long_absence_ms < 0.0
            || self.input_cooldown_ms.is_nan()
            || self.input_cooldown_ms < 0.0
        {
            return Err(ConfigError::InvalidTuning {
                field: "long_absence_ms",
                reason: "timings must be non-negative".into(),
            });
        }
        Ok(())
    }
}
