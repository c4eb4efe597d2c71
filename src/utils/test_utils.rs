use chrono::{DateTime, Duration, Utc};
use rand::{seq::index, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::model::structures::{
    battle::{Battle, BattleDetails, NewBattle, Winner},
    category::Category
};

pub fn generate_battle(model_a: &str, model_b: &str, winner: Winner) -> Battle {
    Battle::new(model_a, model_b, winner).unwrap_or_else(|e| panic!("Invalid test battle: {}", e))
}

pub fn generate_summarization(model_a: &str, model_b: &str, winner: Winner, language: Option<&str>) -> NewBattle {
    NewBattle {
        battle: generate_battle(model_a, model_b, winner),
        details: BattleDetails::summarization(language, language)
    }
}

pub fn generate_translation(model_a: &str, model_b: &str, winner: Winner, source: &str, target: &str) -> NewBattle {
    NewBattle {
        battle: generate_battle(model_a, model_b, winner),
        details: BattleDetails::translation(source, target)
    }
}

/// Generates `n` battles between distinct random pairs of `models`.
/// The same seed always yields the same sequence.
pub fn generate_battles(n: usize, models: &[&str], seed: u64) -> Vec<Battle> {
    if models.len() < 2 {
        panic!("At least two models are required to generate battles");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut battles = Vec::with_capacity(n);

    for _ in 0..n {
        let pair = index::sample(&mut rng, models.len(), 2);
        let winner = match rng.random_range(0..3) {
            0 => Winner::ModelA,
            1 => Winner::ModelB,
            _ => Winner::Tie
        };

        battles.push(generate_battle(models[pair.index(0)], models[pair.index(1)], winner));
    }

    battles
}

/// Wraps generated battles as records of `category`, cycling through
/// `languages` for the classification fields.
pub fn generate_new_battles(category: Category, battles: Vec<Battle>, languages: &[&str]) -> Vec<NewBattle> {
    battles
        .into_iter()
        .enumerate()
        .map(|(i, battle)| {
            let language = languages[i % languages.len()];
            let details = match category {
                Category::Summarization => BattleDetails::summarization(Some(language), Some(language)),
                Category::Translation => BattleDetails::translation(language, languages[(i + 1) % languages.len()])
            };

            NewBattle { battle, details }
        })
        .collect()
}

/// Evenly spaced timestamps, one second apart, starting at `start`.
pub fn generate_timestamps(n: usize, start: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    (0..n).map(|i| start + Duration::seconds(i as i64)).collect()
}
