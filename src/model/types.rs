//! Catalog records and the request/response types of the search layer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single searchable exercise as stored in a catalog collection.
///
/// Stores are free to carry more fields than the search layer understands;
/// anything unknown lands in `extra` and is written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Instructions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Equipment>,

    #[serde(
        default,
        alias = "primaryMuscles",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub primary_muscles: Vec<String>,

    #[serde(
        default,
        alias = "secondaryMuscles",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub secondary_muscles: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,

    /// Catalogs list several mechanics for some records; those are joined with ", ".
    #[serde(
        default,
        alias = "mechanicsType",
        alias = "mechanics_type",
        deserialize_with = "mechanics_from_string_or_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub mechanics: Option<String>,

    /// Fields the search layer does not interpret (video urls, images, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Equipment values as a flat iterator, whether stored as one value or a list.
    pub fn equipment_values(&self) -> impl Iterator<Item = &str> {
        self.equipment.iter().flat_map(Equipment::iter)
    }
}

/// Instructions arrive either as one block of text or as a list of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instructions {
    Text(String),
    Steps(Vec<String>),
}

impl Instructions {
    /// Case-insensitive substring test against every step. `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            Self::Text(text) => text.to_lowercase().contains(needle),
            Self::Steps(steps) => steps.iter().any(|s| s.to_lowercase().contains(needle)),
        }
    }
}

/// Equipment is a single value in some catalogs and a list in others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Equipment {
    One(String),
    Many(Vec<String>),
}

impl Equipment {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        };
        slice.iter().map(String::as_str)
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "exercise id must be a string or number, got {other}"
        ))),
    }
}

fn mechanics_from_string_or_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Equipment>::deserialize(deserializer)? {
        Some(Equipment::One(value)) => Some(value),
        Some(Equipment::Many(values)) if !values.is_empty() => Some(values.join(", ")),
        _ => None,
    })
}

/// Structural constraints on a search. `None` (or an empty list) never excludes a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl SearchFilters {
    pub fn with_categories<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_equipment<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.equipment = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_muscles<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.muscles = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    /// True when no dimension constrains the search.
    pub fn is_empty(&self) -> bool {
        self.canonical() == Self::default()
    }

    /// Order-insensitive form: lists sorted and de-duplicated, empties dropped.
    ///
    /// Two filter sets with the same membership semantics produce equal
    /// canonical forms, which is what the result cache keys on.
    pub fn canonical(&self) -> Self {
        fn list(values: &Option<Vec<String>>) -> Option<Vec<String>> {
            let mut values = values.clone()?;
            values.sort();
            values.dedup();
            (!values.is_empty()).then_some(values)
        }

        Self {
            categories: list(&self.categories),
            equipment: list(&self.equipment),
            muscles: list(&self.muscles),
            difficulty: self.difficulty.clone().filter(|d| !d.is_empty()),
        }
    }

    /// Active category list, `None` when the dimension is unconstrained.
    pub fn active_categories(&self) -> Option<&[String]> {
        active(&self.categories)
    }

    pub fn active_equipment(&self) -> Option<&[String]> {
        active(&self.equipment)
    }

    pub fn active_muscles(&self) -> Option<&[String]> {
        active(&self.muscles)
    }

    pub fn active_difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref().filter(|d| !d.is_empty())
    }
}

fn active(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|v| !v.is_empty())
}

/// One search request as issued by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    /// Maximum number of results; the client's configured default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_score: bool,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_scores(mut self) -> Self {
        self.include_score = true;
        self
    }
}

/// A ranked exercise, optionally annotated with the score that placed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredExercise {
    #[serde(flatten)]
    pub exercise: Exercise,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<u32>,
}

/// The ranked, limited answer to one search, as cached and returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub exercises: Vec<ScoredExercise>,
    /// Number of records that matched before the limit was applied.
    pub total: usize,
    pub query: String,
    pub filters: SearchFilters,
}

impl SearchResult {
    pub fn empty(query: impl Into<String>, filters: SearchFilters) -> Self {
        Self {
            exercises: Vec::new(),
            total: 0,
            query: query.into(),
            filters,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Copy of this result with every per-record score removed.
    pub fn without_scores(&self) -> Self {
        let mut stripped = self.clone();
        for hit in &mut stripped.exercises {
            hit.relevance_score = None;
        }
        stripped
    }
}
