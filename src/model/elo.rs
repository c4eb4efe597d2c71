use indexmap::IndexMap;

use crate::model::{
    constants::{BASE, INITIAL_RATING, K_FACTOR, SCALE},
    structures::{battle::Battle, rating::Rating}
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloParams {
    pub k: f64,
    pub scale: f64,
    pub base: f64,
    pub initial_rating: f64
}

impl Default for EloParams {
    fn default() -> Self {
        EloParams {
            k: K_FACTOR,
            scale: SCALE,
            base: BASE,
            initial_rating: INITIAL_RATING
        }
    }
}

/// Ratings keyed by model, in order of first appearance in the battle log.
/// Reading an unknown model yields the initial rating without inserting it.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingTable {
    ratings: IndexMap<String, f64>,
    initial_rating: f64
}

impl RatingTable {
    pub fn new(initial_rating: f64) -> RatingTable {
        RatingTable {
            ratings: IndexMap::new(),
            initial_rating
        }
    }

    pub fn get(&self, model: &str) -> Option<f64> {
        self.ratings.get(model).copied()
    }

    pub fn get_or_default(&self, model: &str) -> f64 {
        self.get(model).unwrap_or(self.initial_rating)
    }

    fn set(&mut self, model: &str, rating: f64) {
        match self.ratings.get_mut(model) {
            Some(value) => *value = rating,
            None => {
                self.ratings.insert(model.to_string(), rating);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ratings.iter().map(|(model, rating)| (model.as_str(), *rating))
    }

    pub fn to_ratings(&self) -> Vec<Rating> {
        self.iter()
            .map(|(model, value)| Rating {
                model: model.to_string(),
                value
            })
            .collect()
    }
}

/// Logistic expected score of a player rated `rating` against `opponent`.
pub fn expected_score(rating: f64, opponent: f64, params: &EloParams) -> f64 {
    1.0 / (1.0 + params.base.powf((opponent - rating) / params.scale))
}

/// Applies one battle. Both sides are updated from the pre-battle ratings.
pub fn apply_battle(table: &mut RatingTable, battle: &Battle, params: &EloParams) {
    let rating_a = table.get_or_default(&battle.model_a);
    let rating_b = table.get_or_default(&battle.model_b);

    let expected_a = expected_score(rating_a, rating_b, params);
    let expected_b = expected_score(rating_b, rating_a, params);

    let score_a = battle.winner.score_a();

    table.set(&battle.model_a, rating_a + params.k * (score_a - expected_a));
    table.set(&battle.model_b, rating_b + params.k * ((1.0 - score_a) - expected_b));
}

/// Folds the battles, in log order, into a rating per model.
///
/// Every model that appears in at least one battle is present in the result.
/// An empty input gives an empty table, which callers treat as "no data".
/// Battles are assumed to be well formed (distinct models, known winner).
pub fn compute_ratings(battles: &[Battle], params: &EloParams) -> RatingTable {
    let mut table = RatingTable::new(params.initial_rating);

    for battle in battles {
        apply_battle(&mut table, battle, params);
    }

    table
}
