//! Relevance scoring for exercise search.
//!
//! Scores are additive integers. The name contributes through exactly one
//! tier, checked in order exact -> prefix -> substring -> fuzzy; every other
//! signal (filter hits, text hits) adds independently. A score of zero means
//! the record did not match the query at all.
//!
//! | Signal                                   | Default |
//! |------------------------------------------|---------|
//! | name equals query                        | 100     |
//! | name starts with query                   | 50      |
//! | name contains query                      | 25      |
//! | name within fuzzy tolerance of query     | 3       |
//! | category in filter categories            | 20      |
//! | any equipment in filter equipment        | 15      |
//! | any primary muscle in filter muscles     | 10      |
//! | description or instructions contain query| 5       |
//! | difficulty equals filter difficulty      | 5       |

use serde::{Deserialize, Serialize};

use super::fuzzy::{DEFAULT_FUZZY_TOLERANCE, is_fuzzy_match};
use crate::model::types::{Exercise, SearchFilters};

/// Tunable weights for [`score_exercise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub exact_name: u32,
    pub name_prefix: u32,
    pub name_substring: u32,
    pub fuzzy_name: u32,
    pub category: u32,
    pub equipment: u32,
    pub primary_muscle: u32,
    pub text: u32,
    pub difficulty: u32,
    /// Maximum edit distance for the fuzzy name tier.
    pub fuzzy_tolerance: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_name: 100,
            name_prefix: 50,
            name_substring: 25,
            fuzzy_name: 3,
            category: 20,
            equipment: 15,
            primary_muscle: 10,
            text: 5,
            difficulty: 5,
            fuzzy_tolerance: DEFAULT_FUZZY_TOLERANCE,
        }
    }
}

/// Score one exercise against a query that is already trimmed and lower-cased.
pub fn score_exercise(
    exercise: &Exercise,
    query: &str,
    filters: &SearchFilters,
    weights: &ScoringWeights,
) -> u32 {
    let mut score: u32 = 0;
    let name = exercise.name.to_lowercase();

    if name == query {
        score = score.saturating_add(weights.exact_name);
    } else if name.starts_with(query) {
        score = score.saturating_add(weights.name_prefix);
    } else if name.contains(query) {
        score = score.saturating_add(weights.name_substring);
    } else if is_fuzzy_match(&name, query, weights.fuzzy_tolerance) {
        score = score.saturating_add(weights.fuzzy_name);
    }

    if let Some(categories) = filters.active_categories()
        && let Some(category) = &exercise.category
        && categories.contains(category)
    {
        score = score.saturating_add(weights.category);
    }

    if let Some(equipment) = filters.active_equipment()
        && exercise
            .equipment_values()
            .any(|e| equipment.iter().any(|f| f == e))
    {
        score = score.saturating_add(weights.equipment);
    }

    if let Some(muscles) = filters.active_muscles()
        && exercise.primary_muscles.iter().any(|m| muscles.contains(m))
    {
        score = score.saturating_add(weights.primary_muscle);
    }

    let in_description = exercise
        .description
        .as_ref()
        .is_some_and(|d| d.to_lowercase().contains(query));
    let in_instructions = exercise
        .instructions
        .as_ref()
        .is_some_and(|i| i.contains_lowercase(query));
    if in_description || in_instructions {
        score = score.saturating_add(weights.text);
    }

    if let Some(difficulty) = filters.active_difficulty()
        && exercise.difficulty.as_deref() == Some(difficulty)
    {
        score = score.saturating_add(weights.difficulty);
    }

    score
}
