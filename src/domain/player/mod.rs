//! Player module - public profile information.
//!
//! Identity and credential storage are external; the server only consumes
//! the public projection of a player and mutates its in-memory rating and
//! win/loss counters as games finish.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::domain::rating::Rank;

/// Default rating for a fresh profile.
pub const INITIAL_RATING: i32 = 1000;

/// Public projection of a player, shared with every client in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub rating: i32,
    pub rank: Rank,
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub is_guest: bool,
}

impl PlayerProfile {
    /// Creates a guest profile with the default rating.
    pub fn guest(username: String, display_name: String) -> Self {
        Self {
            id: UserId::new(),
            username,
            display_name,
            rating: INITIAL_RATING,
            rank: Rank::for_rating(INITIAL_RATING),
            wins: 0,
            losses: 0,
            is_guest: true,
        }
    }
}
