use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::structures::{
    battle::{Battle, NewBattle},
    battle_query::{BattleQuery, RatingKey},
    rating::{Rating, RatingSnapshot}
};

pub mod db;
pub mod db_structs;
pub mod memory;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("storage did not respond within {0:?}")]
    Timeout(Duration),

    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("invalid battle record {id}: {reason}")]
    InvalidRecord { id: i64, reason: String }
}

/// Append-only log of recorded battles.
#[async_trait]
pub trait BattleStore: Send + Sync {
    async fn append(&self, battle: &NewBattle) -> Result<(), StorageError>;

    /// Returns the battles matching `query`, oldest first.
    async fn query(&self, query: &BattleQuery) -> Result<Vec<Battle>, StorageError>;
}

/// Cache of the last computed ratings per filter key.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Merges `ratings` into the document at `key`. Models missing from
    /// `ratings` keep their stored value.
    async fn upsert(&self, key: &RatingKey, ratings: &[Rating], timestamp: DateTime<Utc>) -> Result<(), StorageError>;

    async fn get(&self, key: &RatingKey) -> Result<Option<RatingSnapshot>, StorageError>;
}
