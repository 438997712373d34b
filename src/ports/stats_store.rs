//! Stats store port - external persistence of historical statistics.
//!
//! Rating and win/loss history outlive a process restart somewhere else;
//! the core records updates through this seam and never reads them back.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::domain::rating::Rank;

/// Post-game statistic change for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsUpdate {
    pub user_id: UserId,
    pub rating: i32,
    pub rating_change: i32,
    pub wins: u32,
    pub losses: u32,
    pub rank: Rank,
}

/// Errors from the stats backend.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Stats backend unavailable: {0}")]
    Unavailable(String),
}

/// Port for recording post-game statistics.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Records one player's updated statistics.
    ///
    /// Failures are logged by the caller and never affect game state; a
    /// finished game stays finished even when persistence is down.
    async fn record(&self, update: StatsUpdate) -> Result<(), StatsError>;
}
