use std::sync::Arc;

use approx::assert_abs_diff_eq;
use arena_rating::{
    database::{memory::MemoryStore, BattleStore, RatingStore},
    model::{
        compute_ratings,
        structures::{battle::Winner, battle_query::BattleQuery, category::Category},
        EloParams, LeaderboardService
    },
    utils::test_utils::{generate_battles, generate_new_battles, generate_summarization, generate_translation}
};
use chrono::TimeDelta;
use itertools::Itertools;

use crate::common::{init_test_env, manual_clock, MODELS};

fn seeded_store() -> Arc<MemoryStore> {
    let mut battles = generate_new_battles(
        Category::Summarization,
        generate_battles(300, &MODELS, 42),
        &["english", "korean"]
    );
    battles.extend(generate_new_battles(
        Category::Translation,
        generate_battles(200, &MODELS, 43),
        &["english", "spanish", "german"]
    ));

    Arc::new(MemoryStore::with_battles(battles))
}

#[tokio::test]
async fn test_global_leaderboards_cover_every_model() {
    init_test_env();
    let store = seeded_store();
    let service = LeaderboardService::new(store.clone(), store.clone()).with_clock(manual_clock());

    let results = service.refresh_global().await;
    assert_eq!(results.len(), 2);

    for (category, result) in results {
        let rows = result.unwrap().unwrap();
        assert_eq!(rows.len(), MODELS.len(), "{} leaderboard", category);

        // Ranks start at 1, never decrease, and ratings are sorted descending
        assert_eq!(rows[0].rank, 1);
        for (previous, row) in rows.iter().tuple_windows() {
            assert!(previous.rating >= row.rating);
            assert!(previous.rank <= row.rank);
            if previous.rating == row.rating {
                assert_eq!(previous.rank, row.rank);
            }
        }

        // Elo is zero-sum, so the mean stays at the initial rating
        let total: i64 = rows.iter().map(|row| row.rating).sum();
        assert!((total - 1000 * MODELS.len() as i64).abs() <= MODELS.len() as i64);
    }
}

#[tokio::test]
async fn test_leaderboard_matches_direct_computation() {
    init_test_env();
    let store = seeded_store();
    let service = LeaderboardService::new(store.clone(), store.clone()).with_clock(manual_clock());
    let query = BattleQuery::new(Category::Summarization, Some("Korean"), Some("ignored"));

    let rows = service.load(&query).await.unwrap().unwrap();

    let battles = store.query(&query).await.unwrap();
    let table = compute_ratings(&battles, &EloParams::default());
    for row in &rows {
        let exact = table.get(&row.model).unwrap();
        assert_eq!(row.rating, (exact + 0.5).floor() as i64);
    }

    let snapshot = store.get(&query.rating_key()).await.unwrap().unwrap();
    assert_eq!(query.rating_key().as_str(), "summarization#korean");
    for rating in snapshot.ratings {
        assert_abs_diff_eq!(rating.value, table.get(&rating.model).unwrap());
    }
}

#[tokio::test]
async fn test_translation_filters_are_independent() {
    init_test_env();
    let store = Arc::new(MemoryStore::with_battles(vec![
        generate_translation("gpt-4", "gemini-pro", Winner::ModelA, "English", "Spanish"),
        generate_translation("gpt-4", "llama-3", Winner::ModelB, "English", "German"),
        generate_translation("gemini-pro", "llama-3", Winner::Tie, "German", "Spanish")
    ]));
    let service = LeaderboardService::new(store.clone(), store.clone()).with_clock(manual_clock());

    let from_english = service
        .load_ratings(Category::Translation, Some("english"), Some("any"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(from_english.len(), 3);

    let into_spanish = service
        .load_ratings(Category::Translation, None, Some("Spanish"))
        .await
        .unwrap()
        .unwrap();
    let models: Vec<&str> = into_spanish.iter().map(|row| row.model.as_str()).sorted().collect();
    assert_eq!(models, vec!["gemini-pro", "gpt-4", "llama-3"]);

    let exact = service
        .load_ratings(Category::Translation, Some("english"), Some("spanish"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exact.len(), 2);
    assert_eq!(exact[0].model, "gpt-4");
    assert_eq!(exact[0].rating, 1002);
    assert_eq!(exact[1].rating, 998);

    let nothing = service
        .load_ratings(Category::Translation, Some("korean"), None)
        .await
        .unwrap();
    assert!(nothing.is_none());
}

#[tokio::test]
async fn test_outage_serves_last_known_rows() {
    init_test_env();
    let store = Arc::new(MemoryStore::with_battles(vec![generate_summarization(
        "gpt-4",
        "gemini-pro",
        Winner::ModelA,
        Some("english")
    )]));
    let clock = manual_clock();
    let service = LeaderboardService::new(store.clone(), store.clone()).with_clock(clock.clone());
    let query = BattleQuery::global(Category::Summarization);

    let fresh = service.load_or_last_known(&query).await;
    assert_eq!(fresh.len(), 2);

    // New votes arrive, then storage goes away before the next refresh
    store
        .append(&generate_summarization("gemini-pro", "gpt-4", Winner::ModelA, None))
        .await
        .unwrap();
    clock.advance(TimeDelta::minutes(10));
    store.set_available(false);

    assert!(service.load(&query).await.is_err());
    assert_eq!(service.load_or_last_known(&query).await, fresh);

    store.set_available(true);
    let recovered = service.load_or_last_known(&query).await;
    assert_eq!(recovered.len(), 2);
    assert_eq!(recovered[0].rating, recovered[1].rating);
    assert_eq!((recovered[0].rank, recovered[1].rank), (1, 1));
}

#[tokio::test]
async fn test_outage_without_history_is_empty() {
    init_test_env();
    let store = seeded_store();
    store.set_available(false);
    let service = LeaderboardService::new(store.clone(), store.clone()).with_clock(manual_clock());

    let rows = service
        .load_or_last_known(&BattleQuery::global(Category::Translation))
        .await;

    assert!(rows.is_empty());
}
