use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::model::structures::category::Category;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BattleError {
    #[error("a model cannot battle itself ({0})")]
    SelfBattle(String),

    #[error("unknown winner '{0}', expected one of model_a, model_b, tie")]
    UnknownWinner(String),

    #[error("model names must not be empty")]
    EmptyModel
}

/// Outcome of a single vote, from the point of view of the left-hand model.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Winner {
    ModelA,
    ModelB,
    Tie
}

impl Winner {
    /// Points scored by model A: 1 for a win, 0.5 for a tie, 0 for a loss.
    pub fn score_a(&self) -> f64 {
        match self {
            Winner::ModelA => 1.0,
            Winner::ModelB => 0.0,
            Winner::Tie => 0.5
        }
    }

    pub fn parse(value: &str) -> Result<Winner, BattleError> {
        value.parse().map_err(|_| BattleError::UnknownWinner(value.to_string()))
    }
}

/// A recorded pairwise comparison. Only the fields the rating fold needs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    pub model_a: String,
    pub model_b: String,
    pub winner: Winner
}

impl Battle {
    /// Builds a battle, rejecting empty names and self-battles.
    pub fn new(model_a: impl Into<String>, model_b: impl Into<String>, winner: Winner) -> Result<Battle, BattleError> {
        let model_a = model_a.into();
        let model_b = model_b.into();

        if model_a.is_empty() || model_b.is_empty() {
            return Err(BattleError::EmptyModel);
        }

        if model_a == model_b {
            return Err(BattleError::SelfBattle(model_a));
        }

        Ok(Battle {
            model_a,
            model_b,
            winner
        })
    }
}

/// Classification attached to a battle when it is recorded. Languages are
/// stored lower-cased so filters compare by plain equality.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum BattleDetails {
    Summarization {
        model_a_response_language: Option<String>,
        model_b_response_language: Option<String>
    },
    Translation {
        source_language: String,
        target_language: String
    }
}

impl BattleDetails {
    pub fn summarization(model_a_response_language: Option<&str>, model_b_response_language: Option<&str>) -> Self {
        BattleDetails::Summarization {
            model_a_response_language: model_a_response_language.map(str::to_lowercase),
            model_b_response_language: model_b_response_language.map(str::to_lowercase)
        }
    }

    pub fn translation(source_language: &str, target_language: &str) -> Self {
        BattleDetails::Translation {
            source_language: source_language.to_lowercase(),
            target_language: target_language.to_lowercase()
        }
    }

    pub fn category(&self) -> Category {
        match self {
            BattleDetails::Summarization { .. } => Category::Summarization,
            BattleDetails::Translation { .. } => Category::Translation
        }
    }
}

/// A battle on its way into the battle log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewBattle {
    pub battle: Battle,
    pub details: BattleDetails
}

impl NewBattle {
    pub fn category(&self) -> Category {
        self.details.category()
    }
}
