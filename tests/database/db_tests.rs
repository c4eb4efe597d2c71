use std::sync::Arc;

use approx::assert_abs_diff_eq;
use arena_rating::{
    database::{BattleStore, RatingStore, StorageError},
    model::{
        structures::{
            battle::Winner,
            battle_query::BattleQuery,
            category::Category,
            rating::Rating
        },
        LeaderboardService
    },
    utils::test_utils::{generate_battle, generate_summarization, generate_translation}
};
use chrono::{TimeZone, Utc};
use serial_test::serial;

use super::test_helpers::TestDatabase;
use crate::common::init_test_env;

fn rating(model: &str, value: f64) -> Rating {
    Rating {
        model: model.to_string(),
        value
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a Docker daemon"]
async fn test_append_and_query_in_record_order() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let db_client = test_db.db_client().await.expect("Failed to connect");

    db_client
        .append(&generate_summarization("gpt-4", "gemini-pro", Winner::ModelA, Some("English")))
        .await
        .unwrap();
    db_client
        .append(&generate_summarization("gemini-pro", "llama-3", Winner::Tie, Some("korean")))
        .await
        .unwrap();
    db_client
        .append(&generate_translation("gpt-4", "llama-3", Winner::ModelB, "English", "Spanish"))
        .await
        .unwrap();

    let summaries = db_client
        .query(&BattleQuery::global(Category::Summarization))
        .await
        .unwrap();
    assert_eq!(
        summaries,
        vec![
            generate_battle("gpt-4", "gemini-pro", Winner::ModelA),
            generate_battle("gemini-pro", "llama-3", Winner::Tie)
        ]
    );

    let english = db_client
        .query(&BattleQuery::new(Category::Summarization, Some("ENGLISH"), None))
        .await
        .unwrap();
    assert_eq!(english, vec![generate_battle("gpt-4", "gemini-pro", Winner::ModelA)]);

    let translations = db_client
        .query(&BattleQuery::new(Category::Translation, Some("english"), Some("spanish")))
        .await
        .unwrap();
    assert_eq!(translations, vec![generate_battle("gpt-4", "llama-3", Winner::ModelB)]);

    let none = db_client
        .query(&BattleQuery::new(Category::Translation, Some("english"), Some("german")))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires a Docker daemon"]
async fn test_query_orders_by_created_at() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");

    test_db
        .insert_battle_at("gpt-4", "gemini-pro", "model_a", "2024-03-02 00:00:00+00")
        .await
        .unwrap();
    test_db
        .insert_battle_at("llama-3", "gpt-4", "tie", "2024-03-01 00:00:00+00")
        .await
        .unwrap();

    let db_client = test_db.db_client().await.expect("Failed to connect");
    let battles = db_client
        .query(&BattleQuery::global(Category::Summarization))
        .await
        .unwrap();

    assert_eq!(
        battles,
        vec![
            generate_battle("llama-3", "gpt-4", Winner::Tie),
            generate_battle("gpt-4", "gemini-pro", Winner::ModelA)
        ]
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a Docker daemon"]
async fn test_invalid_row_is_reported() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    test_db
        .insert_battle_at("gpt-4", "gemini-pro", "both_bad", "2024-03-01 00:00:00+00")
        .await
        .unwrap();

    let db_client = test_db.db_client().await.expect("Failed to connect");
    let result = db_client.query(&BattleQuery::global(Category::Summarization)).await;

    assert!(matches!(result, Err(StorageError::InvalidRecord { .. })));
}

#[tokio::test]
#[serial]
#[ignore = "requires a Docker daemon"]
async fn test_upsert_merges_per_model() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let db_client = test_db.db_client().await.expect("Failed to connect");

    let key = BattleQuery::new(Category::Translation, Some("english"), Some("spanish")).rating_key();
    let first = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

    db_client
        .upsert(&key, &[rating("gpt-4", 1010.0), rating("gemini-pro", 990.0)], first)
        .await
        .unwrap();
    db_client
        .upsert(&key, &[rating("gpt-4", 1004.5), rating("llama-3", 995.5)], second)
        .await
        .unwrap();

    let snapshot = db_client.get(&key).await.unwrap().unwrap();
    assert_eq!(snapshot.timestamp, second);
    assert_eq!(snapshot.ratings.len(), 3);

    let value = |model: &str| snapshot.ratings.iter().find(|r| r.model == model).unwrap().value;
    assert_abs_diff_eq!(value("gpt-4"), 1004.5);
    assert_abs_diff_eq!(value("gemini-pro"), 990.0);
    assert_abs_diff_eq!(value("llama-3"), 995.5);

    let other = BattleQuery::global(Category::Translation).rating_key();
    assert!(db_client.get(&other).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires a Docker daemon"]
async fn test_leaderboard_over_postgres() {
    init_test_env();
    let test_db = TestDatabase::new().await.expect("Failed to create test database");
    let db_client = Arc::new(test_db.db_client().await.expect("Failed to connect"));

    for battle in [
        generate_summarization("gpt-4", "gpt-3.5", Winner::ModelA, Some("english")),
        generate_summarization("gpt-4", "gpt-3.5", Winner::Tie, Some("english")),
        generate_summarization("gpt-3.5", "gpt-4", Winner::ModelB, Some("english"))
    ] {
        db_client.append(&battle).await.unwrap();
    }

    let service = LeaderboardService::new(db_client.clone(), db_client.clone());
    let rows = service
        .load_ratings(Category::Summarization, None, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].rank, rows[0].model.as_str(), rows[0].rating), (1, "gpt-4", 1004));
    assert_eq!((rows[1].rank, rows[1].model.as_str(), rows[1].rating), (2, "gpt-3.5", 996));

    let snapshot = db_client
        .get(&BattleQuery::global(Category::Summarization).rating_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.ratings.len(), 2);
}
