//! Error types for configuration parsing and level transitions

use thiserror::Error;

/// Problems found while parsing or validating level / tuning data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("level {level}: {reason}")]
    InvalidLevel { level: u32, reason: String },
    #[error("invalid tuning value `{field}`: {reason}")]
    InvalidTuning { field: &'static str, reason: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Failures surfaced by the level transition controller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    /// Requested level has no valid configuration; nothing was changed
    #[error("level {level} cannot be loaded: {reason}")]
    Configuration { level: u32, reason: String },
    /// An asset failed to load while constructing a level
    #[error("resource `{resource}` failed to load (fatal: {fatal})")]
    ResourceLoad { resource: String, fatal: bool },
    /// The tracked level index disagrees with the level actually built
    #[error("level state corrupted: tracking level {tracked}, constructed level {constructed}")]
    StateCorruption { tracked: u32, constructed: u32 },
    /// A load for another level is already in flight
    #[error("load of level {requested} rejected: level {in_flight} is still loading")]
    ConcurrentLoad { in_flight: u32, requested: u32 },
    /// Operation is not valid in the current phase
    #[error("cannot {action} while {phase}")]
    InvalidPhase { action: &'static str, phase: &'static str },
}

impl TransitionError {
    pub fn configuration(level: u32, err: impl std::fmt::Display) -> Self {
        TransitionError::Configuration {
            level,
            reason: err.to_string(),
        }
    }
}
