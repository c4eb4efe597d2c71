use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        PoisonError, RwLock
    }
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::{BattleStore, RatingStore, StorageError};
use crate::model::structures::{
    battle::{Battle, NewBattle},
    battle_query::{BattleQuery, RatingKey},
    rating::{Rating, RatingSnapshot}
};

#[derive(Debug, Clone)]
struct RatingDocument {
    ratings: IndexMap<String, f64>,
    timestamp: DateTime<Utc>
}

/// In-process battle log and rating cache. Append order is record order.
///
/// The store can be marked unavailable, in which case every call fails the
/// way an unreachable database would.
#[derive(Debug)]
pub struct MemoryStore {
    battles: RwLock<Vec<NewBattle>>,
    ratings: RwLock<HashMap<RatingKey, RatingDocument>>,
    available: AtomicBool
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            battles: RwLock::new(Vec::new()),
            ratings: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true)
        }
    }

    pub fn with_battles(battles: Vec<NewBattle>) -> MemoryStore {
        let store = MemoryStore::new();
        *store.battles.write().unwrap_or_else(PoisonError::into_inner) = battles;

        store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn battle_count(&self) -> usize {
        self.battles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl BattleStore for MemoryStore {
    async fn append(&self, battle: &NewBattle) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.battles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(battle.clone());

        Ok(())
    }

    async fn query(&self, query: &BattleQuery) -> Result<Vec<Battle>, StorageError> {
        self.ensure_available()?;

        let battles = self.battles.read().unwrap_or_else(PoisonError::into_inner);
        Ok(battles
            .iter()
            .filter(|battle| query.matches(battle))
            .map(|battle| battle.battle.clone())
            .collect())
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn upsert(&self, key: &RatingKey, ratings: &[Rating], timestamp: DateTime<Utc>) -> Result<(), StorageError> {
        self.ensure_available()?;

        let mut documents = self.ratings.write().unwrap_or_else(PoisonError::into_inner);
        let document = documents.entry(key.clone()).or_insert_with(|| RatingDocument {
            ratings: IndexMap::new(),
            timestamp
        });

        for rating in ratings {
            document.ratings.insert(rating.model.clone(), rating.value);
        }
        document.timestamp = timestamp;

        Ok(())
    }

    async fn get(&self, key: &RatingKey) -> Result<Option<RatingSnapshot>, StorageError> {
        self.ensure_available()?;

        let documents = self.ratings.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(key).map(|document| RatingSnapshot {
            ratings: document
                .ratings
                .iter()
                .map(|(model, value)| Rating {
                    model: model.clone(),
                    value: *value
                })
                .collect(),
            timestamp: document.timestamp
        }))
    }
}
