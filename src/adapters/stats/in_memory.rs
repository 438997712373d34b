//! In-memory stats recording.
//!
//! Keeps the latest update per player for the lifetime of the process.
//! A database-backed implementation lives outside this crate.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{StatsError, StatsStore, StatsUpdate};

/// Process-local stats store.
#[derive(Debug, Default)]
pub struct InMemoryStatsStore {
    records: RwLock<HashMap<UserId, StatsUpdate>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest recorded update for a player, if any.
    pub async fn latest(&self, user_id: UserId) -> Option<StatsUpdate> {
        self.records.read().await.get(&user_id).cloned()
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn record(&self, update: StatsUpdate) -> Result<(), StatsError> {
        self.records.write().await.insert(update.user_id, update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rating::Rank;

    #[tokio::test]
    async fn record_overwrites_previous_entry() {
        let store = InMemoryStatsStore::new();
        let user_id = UserId::new();

        store
            .record(StatsUpdate {
                user_id,
                rating: 1016,
                rating_change: 16,
                wins: 1,
                losses: 0,
                rank: Rank::Silver,
            })
            .await
            .unwrap();
        store
            .record(StatsUpdate {
                user_id,
                rating: 1000,
                rating_change: -16,
                wins: 1,
                losses: 1,
                rank: Rank::Silver,
            })
            .await
            .unwrap();

        let latest = store.latest(user_id).await.unwrap();
        assert_eq!(latest.losses, 1);
        assert_eq!(latest.rating, 1000);
    }
}
