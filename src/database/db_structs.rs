use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::structures::battle::{Battle, BattleError, Winner};

/// A `battles` row as read back for rating computation.
#[derive(Debug, Clone, Serialize)]
pub struct BattleRow {
    pub id: i64,
    pub model_a: String,
    pub model_b: String,
    pub winner: String,
    pub created_at: DateTime<Utc>
}

impl TryFrom<BattleRow> for Battle {
    type Error = BattleError;

    fn try_from(row: BattleRow) -> Result<Self, Self::Error> {
        let winner = Winner::parse(&row.winner)?;
        Battle::new(row.model_a, row.model_b, winner)
    }
}

/// A `ratings` row. One row per (document, model) pair.
#[derive(Debug, Clone, Serialize)]
pub struct RatingRow {
    pub doc_id: String,
    pub model: String,
    pub rating: f64,
    pub updated_at: DateTime<Utc>
}
