//! Game and matchmaking configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Game and matchmaking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Maximum number of concurrently open rooms
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,

    /// Turn time limit applied when the client does not choose one
    #[serde(default = "default_turn_limit")]
    pub default_turn_limit_secs: u32,

    /// Initial matchmaking window half-width in rating points
    #[serde(default = "default_initial_range")]
    pub matchmaking_initial_range: i32,

    /// Rating points added to the half-width per expansion interval
    #[serde(default = "default_expansion_step")]
    pub matchmaking_expansion_step: i32,

    /// Seconds between matchmaking window expansions
    #[serde(default = "default_expand_interval")]
    pub matchmaking_expand_interval_secs: u64,

    /// Seconds between periodic queue sweeps
    #[serde(default = "default_sweep_interval")]
    pub matchmaking_sweep_interval_secs: u64,
}

impl GameConfig {
    /// Validate game configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_rooms == 0 {
            return Err(ValidationError::InvalidRoomLimit);
        }
        if self.default_turn_limit_secs < 5 || self.default_turn_limit_secs > 600 {
            return Err(ValidationError::InvalidTurnLimit);
        }
        if self.matchmaking_initial_range <= 0
            || self.matchmaking_expansion_step <= 0
            || self.matchmaking_expand_interval_secs == 0
            || self.matchmaking_sweep_interval_secs == 0
        {
            return Err(ValidationError::InvalidMatchmakingWindow);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rooms: default_max_rooms(),
            default_turn_limit_secs: default_turn_limit(),
            matchmaking_initial_range: default_initial_range(),
            matchmaking_expansion_step: default_expansion_step(),
            matchmaking_expand_interval_secs: default_expand_interval(),
            matchmaking_sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_max_rooms() -> usize {
    100
}

fn default_turn_limit() -> u32 {
    60
}

fn default_initial_range() -> i32 {
    100
}

fn default_expansion_step() -> i32 {
    50
}

fn default_expand_interval() -> u64 {
    10
}

fn default_sweep_interval() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_config_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.max_rooms, 100);
        assert_eq!(config.default_turn_limit_secs, 60);
        assert_eq!(config.matchmaking_initial_range, 100);
        assert_eq!(config.matchmaking_expansion_step, 50);
        assert_eq!(config.matchmaking_expand_interval_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_rooms() {
        let config = GameConfig {
            max_rooms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_bounds_turn_limit() {
        let config = GameConfig {
            default_turn_limit_secs: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            default_turn_limit_secs: 700,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
