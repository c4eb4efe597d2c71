// Elo constants
pub const K_FACTOR: f64 = 4.0;
pub const SCALE: f64 = 400.0;
pub const BASE: f64 = 10.0;
pub const INITIAL_RATING: f64 = 1000.0;
// Leaderboard refresh cadence for the unfiltered views
pub const LEADERBOARD_UPDATE_INTERVAL_SECS: u64 = 600;
