use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::structures::{
    battle::{BattleDetails, NewBattle},
    category::Category
};

/// Filter value that means "do not filter on this language".
pub const ANY_LANGUAGE: &str = "any";

const KEY_SEPARATOR: &str = "#";

/// Turns a raw UI filter value into an optional, lower-cased language.
/// Missing, blank and `any` values all mean "no filter".
pub fn normalize_language(value: Option<&str>) -> Option<String> {
    let value = value?.trim();

    if value.is_empty() || value.eq_ignore_ascii_case(ANY_LANGUAGE) {
        return None;
    }

    Some(value.to_lowercase())
}

/// Selects the battles a leaderboard view is computed over.
///
/// For summarization, `source_language` is the response language and must
/// match on both sides of a battle; `target_language` is always `None`.
/// For translation the two languages filter independently.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct BattleQuery {
    pub category: Category,
    pub source_language: Option<String>,
    pub target_language: Option<String>
}

impl BattleQuery {
    pub fn new(category: Category, source_language: Option<&str>, target_language: Option<&str>) -> BattleQuery {
        let source_language = normalize_language(source_language);
        let target_language = match category {
            Category::Summarization => None,
            Category::Translation => normalize_language(target_language)
        };

        BattleQuery {
            category,
            source_language,
            target_language
        }
    }

    /// The unfiltered view of a category.
    pub fn global(category: Category) -> BattleQuery {
        BattleQuery::new(category, None, None)
    }

    pub fn is_global(&self) -> bool {
        self.source_language.is_none() && self.target_language.is_none()
    }

    pub fn matches(&self, battle: &NewBattle) -> bool {
        match &battle.details {
            BattleDetails::Summarization {
                model_a_response_language,
                model_b_response_language
            } => {
                self.category == Category::Summarization
                    && self.source_language.as_ref().map_or(true, |lang| {
                        model_a_response_language.as_ref() == Some(lang) && model_b_response_language.as_ref() == Some(lang)
                    })
            }
            BattleDetails::Translation {
                source_language,
                target_language
            } => {
                self.category == Category::Translation
                    && self.source_language.as_ref().map_or(true, |lang| lang == source_language)
                    && self.target_language.as_ref().map_or(true, |lang| lang == target_language)
            }
        }
    }

    pub fn rating_key(&self) -> RatingKey {
        let mut parts = vec![self.category.as_str()];
        parts.extend(self.source_language.as_deref());
        parts.extend(self.target_language.as_deref());

        RatingKey(parts.join(KEY_SEPARATOR))
    }
}

/// Document id of a cached rating snapshot, e.g. `translation#english#spanish`.
/// Absent filters are omitted from the key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RatingKey(String);

impl RatingKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
