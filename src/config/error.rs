//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Room limit must be at least 1")]
    InvalidRoomLimit,

    #[error("Turn limit must be between 5 and 600 seconds")]
    InvalidTurnLimit,

    #[error("Matchmaking window parameters must be positive")]
    InvalidMatchmakingWindow,
}
