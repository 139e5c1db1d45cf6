//! Structural filtering applied client-side after a store fetch.

use crate::model::types::{Exercise, SearchFilters};

/// Whether `exercise` satisfies every active filter dimension.
///
/// Membership is exact and case-sensitive. A record missing a field that an
/// active dimension constrains does not match; unrecognised filter values
/// simply match nothing.
pub fn matches_filters(exercise: &Exercise, filters: &SearchFilters) -> bool {
    if let Some(categories) = filters.active_categories() {
        match &exercise.category {
            Some(category) if categories.contains(category) => {}
            _ => return false,
        }
    }

    if let Some(equipment) = filters.active_equipment()
        && !exercise
            .equipment_values()
            .any(|e| equipment.iter().any(|f| f == e))
    {
        return false;
    }

    if let Some(muscles) = filters.active_muscles()
        && !exercise.primary_muscles.iter().any(|m| muscles.contains(m))
    {
        return false;
    }

    if let Some(difficulty) = filters.active_difficulty()
        && exercise.difficulty.as_deref() != Some(difficulty)
    {
        return false;
    }

    true
}
