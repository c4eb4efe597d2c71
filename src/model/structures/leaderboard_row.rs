use serde::{Deserialize, Serialize};

/// One displayed leaderboard line. `rating` is the rounded Elo value and
/// `rank` follows competition ranking (1, 1, 3, ...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub model: String,
    pub rating: i64
}

impl LeaderboardRow {
    pub fn new(rank: usize, model: impl Into<String>, rating: i64) -> LeaderboardRow {
        LeaderboardRow {
            rank,
            model: model.into(),
            rating
        }
    }
}
