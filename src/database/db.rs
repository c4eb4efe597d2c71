use super::{
    db_structs::{BattleRow, RatingRow},
    BattleStore, RatingStore, StorageError
};
use crate::model::structures::{
    battle::{Battle, BattleDetails, NewBattle},
    battle_query::{BattleQuery, RatingKey},
    category::Category,
    rating::{Rating, RatingSnapshot}
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgres_types::ToSql;
use std::sync::Arc;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS battles (
    id BIGSERIAL PRIMARY KEY,
    category TEXT NOT NULL,
    model_a TEXT NOT NULL,
    model_b TEXT NOT NULL,
    winner TEXT NOT NULL,
    model_a_response_language TEXT NULL,
    model_b_response_language TEXT NULL,
    source_language TEXT NULL,
    target_language TEXT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS battles_category_created_at_idx ON battles (category, created_at, id);
CREATE TABLE IF NOT EXISTS ratings (
    doc_id TEXT NOT NULL,
    model TEXT NOT NULL,
    rating DOUBLE PRECISION NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (doc_id, model)
);";

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, StorageError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    /// Creates the `battles` and `ratings` tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        self.client.batch_execute(SCHEMA).await?;
        info!("Database schema is up to date");

        Ok(())
    }

    fn battle_row(row: &Row) -> BattleRow {
        BattleRow {
            id: row.get("id"),
            model_a: row.get("model_a"),
            model_b: row.get("model_b"),
            winner: row.get("winner"),
            created_at: row.get("created_at")
        }
    }

    fn rating_row(row: &Row) -> RatingRow {
        RatingRow {
            doc_id: row.get("doc_id"),
            model: row.get("model"),
            rating: row.get("rating"),
            updated_at: row.get("updated_at")
        }
    }
}

#[async_trait]
impl BattleStore for DbClient {
    async fn append(&self, battle: &NewBattle) -> Result<(), StorageError> {
        let category = battle.category().as_str();
        let winner = battle.battle.winner.to_string();

        let (lang_a, lang_b, source, target) = match &battle.details {
            BattleDetails::Summarization {
                model_a_response_language,
                model_b_response_language
            } => (
                model_a_response_language.as_deref(),
                model_b_response_language.as_deref(),
                None,
                None
            ),
            BattleDetails::Translation {
                source_language,
                target_language
            } => (None, None, Some(source_language.as_str()), Some(target_language.as_str()))
        };

        self.client
            .execute(
                "INSERT INTO battles (category, model_a, model_b, winner, model_a_response_language, \
                model_b_response_language, source_language, target_language) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &category,
                    &battle.battle.model_a,
                    &battle.battle.model_b,
                    &winner,
                    &lang_a,
                    &lang_b,
                    &source,
                    &target
                ]
            )
            .await?;

        debug!(
            "Recorded {} battle {} vs {} ({})",
            category, battle.battle.model_a, battle.battle.model_b, winner
        );

        Ok(())
    }

    async fn query(&self, query: &BattleQuery) -> Result<Vec<Battle>, StorageError> {
        let category = query.category.as_str();
        let mut sql = "SELECT id, model_a, model_b, winner, created_at FROM battles WHERE category = $1".to_string();
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&category];

        match query.category {
            Category::Summarization => {
                if let Some(language) = &query.source_language {
                    params.push(language);
                    sql += &format!(
                        " AND model_a_response_language = ${n} AND model_b_response_language = ${n}",
                        n = params.len()
                    );
                }
            }
            Category::Translation => {
                if let Some(language) = &query.source_language {
                    params.push(language);
                    sql += &format!(" AND source_language = ${}", params.len());
                }

                if let Some(language) = &query.target_language {
                    params.push(language);
                    sql += &format!(" AND target_language = ${}", params.len());
                }
            }
        }

        sql += " ORDER BY created_at, id";

        let rows = self.client.query(sql.as_str(), &params).await?;

        rows.iter()
            .map(DbClient::battle_row)
            .map(|row| {
                let id = row.id;
                Battle::try_from(row).map_err(|e| StorageError::InvalidRecord {
                    id,
                    reason: e.to_string()
                })
            })
            .collect()
    }
}

#[async_trait]
impl RatingStore for DbClient {
    async fn upsert(&self, key: &RatingKey, ratings: &[Rating], timestamp: DateTime<Utc>) -> Result<(), StorageError> {
        let models: Vec<String> = ratings.iter().map(|r| r.model.clone()).collect();
        let values: Vec<f64> = ratings.iter().map(|r| r.value).collect();

        // A single statement, so the merge is atomic per document
        self.client
            .execute(
                "INSERT INTO ratings (doc_id, model, rating, updated_at) \
                SELECT $1, m.model, m.rating, $4 FROM UNNEST($2::TEXT[], $3::FLOAT8[]) AS m(model, rating) \
                ON CONFLICT (doc_id, model) DO UPDATE SET rating = EXCLUDED.rating, updated_at = EXCLUDED.updated_at",
                &[&key.as_str(), &models, &values, &timestamp]
            )
            .await?;

        info!("Saved {} ratings to '{}'", ratings.len(), key);

        Ok(())
    }

    async fn get(&self, key: &RatingKey) -> Result<Option<RatingSnapshot>, StorageError> {
        let rows = self
            .client
            .query(
                "SELECT doc_id, model, rating, updated_at FROM ratings WHERE doc_id = $1 ORDER BY rating DESC, model",
                &[&key.as_str()]
            )
            .await?;

        let rows: Vec<RatingRow> = rows.iter().map(DbClient::rating_row).collect();

        let Some(timestamp) = rows.iter().map(|row| row.updated_at).max() else {
            return Ok(None);
        };

        Ok(Some(RatingSnapshot {
            ratings: rows
                .into_iter()
                .map(|row| Rating {
                    model: row.model,
                    value: row.rating
                })
                .collect(),
            timestamp
        }))
    }
}
