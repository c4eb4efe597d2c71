use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, PoisonError, RwLock},
    time::Duration
};

use futures::future::join_all;
use itertools::Itertools;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    database::{BattleStore, RatingStore, StorageError},
    model::{
        elo::{compute_ratings, EloParams},
        structures::{
            battle_query::BattleQuery,
            category::Category,
            leaderboard_row::LeaderboardRow
        }
    }
};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("battle or rating store unavailable: {0}")]
    StorageUnavailable(#[from] StorageError)
}

/// Rounds half away from zero for the positive ratings Elo produces,
/// i.e. `floor(x + 0.5)`.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Sorts ratings descending and assigns competition ranks on the rounded
/// values: equal ratings share a rank and the next distinct rating takes
/// its 1-based position (1, 1, 3). Equal ratings keep their input order.
pub fn rank_ratings<S: Into<String>>(ratings: impl IntoIterator<Item = (S, f64)>) -> Vec<LeaderboardRow> {
    let mut rows = Vec::new();
    let mut previous: Option<i64> = None;
    let mut rank = 0;

    let sorted = ratings
        .into_iter()
        .sorted_by(|(_, a), (_, b)| b.total_cmp(a));

    for (index, (model, rating)) in sorted.enumerate() {
        let rounded = round_half_up(rating);
        if previous != Some(rounded) {
            rank = index + 1;
            previous = Some(rounded);
        }

        rows.push(LeaderboardRow::new(rank, model, rounded));
    }

    rows
}

/// Recomputes leaderboards from the battle log and caches the ratings.
///
/// Recomputation is unconditional: the rating store is written to, never
/// read from, on the normal path. It is only consulted by
/// [`LeaderboardService::load_or_last_known`] when the battle log cannot be
/// reached.
pub struct LeaderboardService {
    battles: Arc<dyn BattleStore>,
    ratings: Arc<dyn RatingStore>,
    params: EloParams,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
    // Rows from the last successful load of each query, served when storage is down.
    // Keyed by query since a source-only and a target-only filter share a rating key
    last_known: RwLock<HashMap<BattleQuery, Vec<LeaderboardRow>>>
}

impl LeaderboardService {
    pub fn new(battles: Arc<dyn BattleStore>, ratings: Arc<dyn RatingStore>) -> LeaderboardService {
        LeaderboardService {
            battles,
            ratings,
            params: EloParams::default(),
            clock: Arc::new(SystemClock),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            last_known: RwLock::new(HashMap::new())
        }
    }

    pub fn with_params(mut self, params: EloParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Loads the leaderboard for a category and optional language filters.
    /// `any`, blank and missing filters are equivalent.
    ///
    /// Returns `Ok(None)` when no battle matches the filters.
    pub async fn load_ratings(
        &self,
        category: Category,
        source_language: Option<&str>,
        target_language: Option<&str>
    ) -> Result<Option<Vec<LeaderboardRow>>, LeaderboardError> {
        self.load(&BattleQuery::new(category, source_language, target_language))
            .await
    }

    pub async fn load(&self, query: &BattleQuery) -> Result<Option<Vec<LeaderboardRow>>, LeaderboardError> {
        let key = query.rating_key();
        let battles = self.with_timeout(self.battles.query(query)).await?;

        if battles.is_empty() {
            debug!("No battles for '{}'", key);
            return Ok(None);
        }

        let table = compute_ratings(&battles, &self.params);
        info!(
            "Recomputed '{}' from {} battles across {} models",
            key,
            battles.len(),
            table.len()
        );

        self.with_timeout(self.ratings.upsert(&key, &table.to_ratings(), self.clock.now()))
            .await?;

        let rows = rank_ratings(table.iter());
        self.last_known
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.clone(), rows.clone());

        Ok(Some(rows))
    }

    /// Like [`LeaderboardService::load`], but never fails. When storage is
    /// unreachable the last rows produced in-process for the same query are
    /// returned, then the cached rating snapshot, then nothing.
    pub async fn load_or_last_known(&self, query: &BattleQuery) -> Vec<LeaderboardRow> {
        let error = match self.load(query).await {
            Ok(rows) => return rows.unwrap_or_default(),
            Err(e) => e
        };

        let key = query.rating_key();
        warn!("Serving last known leaderboard for '{}': {}", key, error);

        if let Some(rows) = self
            .last_known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
        {
            return rows.clone();
        }

        match self.with_timeout(self.ratings.get(&key)).await {
            Ok(Some(snapshot)) => rank_ratings(snapshot.ratings.into_iter().map(|r| (r.model, r.value))),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Rating cache for '{}' is unavailable too: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Recomputes the unfiltered view of every category.
    pub async fn refresh_global(&self) -> Vec<(Category, Result<Option<Vec<LeaderboardRow>>, LeaderboardError>)> {
        let queries: Vec<BattleQuery> = Category::iter().map(BattleQuery::global).collect();
        let results = join_all(queries.iter().map(|query| self.load(query))).await;

        queries.into_iter().map(|query| query.category).zip(results).collect()
    }

    async fn with_timeout<T>(&self, operation: impl Future<Output = Result<T, StorageError>>) -> Result<T, StorageError> {
        match tokio::time::timeout(self.store_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.store_timeout))
        }
    }
}
