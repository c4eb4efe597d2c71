//! Elo ratings over the battle log and the leaderboards built from them.

pub mod constants;
pub mod elo;
pub mod leaderboard;
pub mod structures;

pub use elo::{compute_ratings, EloParams, RatingTable};
pub use leaderboard::{rank_ratings, LeaderboardError, LeaderboardService};
