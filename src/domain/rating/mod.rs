//! Rating module - Elo arithmetic and rank tiers.
//!
//! Ratings feed matchmaking windows and post-game stat updates; their
//! persistence is external.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Elo K-factor.
pub const K_FACTOR: f64 = 32.0;

/// Rank tier derived from rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Apex,
}

/// Ascending rating thresholds for each tier above Bronze.
static RANK_THRESHOLDS: Lazy<[(i32, Rank); 6]> = Lazy::new(|| {
    [
        (900, Rank::Silver),
        (1200, Rank::Gold),
        (1500, Rank::Platinum),
        (1800, Rank::Diamond),
        (2100, Rank::Master),
        (2400, Rank::Apex),
    ]
});

impl Rank {
    /// The tier a rating falls into.
    pub fn for_rating(rating: i32) -> Rank {
        let mut rank = Rank::Bronze;
        for &(threshold, tier) in RANK_THRESHOLDS.iter() {
            if rating >= threshold {
                rank = tier;
            }
        }
        rank
    }
}

/// Match outcome from one player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScore {
    Win,
    Draw,
    Loss,
}

impl MatchScore {
    fn value(&self) -> f64 {
        match self {
            MatchScore::Win => 1.0,
            MatchScore::Draw => 0.5,
            MatchScore::Loss => 0.0,
        }
    }
}

/// Result of re-rating one player after a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingChange {
    pub new_rating: i32,
    pub delta: i32,
    pub rank: Rank,
}

/// Probability of beating `opponent` implied by the rating gap.
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) as f64 / 400.0))
}

/// Computes a player's new rating, delta, and tier after a game.
///
/// Ratings never drop below zero.
pub fn rate(rating: i32, opponent: i32, score: MatchScore) -> RatingChange {
    let expected = expected_score(rating, opponent);
    let delta = (K_FACTOR * (score.value() - expected)).round() as i32;
    let new_rating = (rating + delta).max(0);

    RatingChange {
        new_rating,
        delta,
        rank: Rank::for_rating(new_rating),
    }
}
