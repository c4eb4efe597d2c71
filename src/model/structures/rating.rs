use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A model's rating as produced by the Elo fold. Derived data: it can
/// always be recomputed from the battle log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Rating {
    pub model: String,
    pub value: f64
}

/// What the rating store holds for one key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RatingSnapshot {
    pub ratings: Vec<Rating>,
    /// Time of the most recent write to this key
    pub timestamp: DateTime<Utc>
}
