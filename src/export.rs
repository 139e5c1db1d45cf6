//! Rendering of search results for humans and scripts.
//!
//! - Markdown - headers, a field table per exercise, optional instructions
//! - JSON - the result plus export metadata
//! - Plain Text - simple, copy-paste friendly format

use chrono::Utc;

use crate::model::types::{Instructions, ScoredExercise, SearchResult};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// Markdown format with headers and field tables
    #[default]
    Markdown,
    /// JSON format for programmatic consumption
    Json,
    /// Plain text format for simple copy-paste
    #[value(name = "text")]
    PlainText,
}

/// Options for export customization
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include instruction steps under each exercise
    pub include_instructions: bool,
    /// Maximum length of any free-text field (0 = unlimited)
    pub max_text_len: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_instructions: false,
            max_text_len: 300,
        }
    }
}

/// Export a search result to the specified format
pub fn export_result(result: &SearchResult, format: ExportFormat, options: &ExportOptions) -> String {
    match format {
        ExportFormat::Markdown => export_markdown(result, options),
        ExportFormat::Json => export_json(result),
        ExportFormat::PlainText => export_plain_text(result, options),
    }
}

/// Escape special Markdown characters to prevent formatting issues or injection.
fn escape_markdown(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('*', "\\*")
        .replace('_', "\\_")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('`', "\\`")
}

fn instruction_lines(instructions: &Instructions) -> Vec<&str> {
    match instructions {
        Instructions::Text(text) => text.lines().collect(),
        Instructions::Steps(steps) => steps.iter().map(String::as_str).collect(),
    }
}

/// Label/value pairs shown for each exercise, skipping absent fields.
fn fields(hit: &ScoredExercise) -> Vec<(&'static str, String)> {
    let ex = &hit.exercise;
    let mut out = Vec::new();
    if let Some(category) = &ex.category {
        out.push(("Category", category.clone()));
    }
    let equipment: Vec<&str> = ex.equipment_values().collect();
    if !equipment.is_empty() {
        out.push(("Equipment", equipment.join(", ")));
    }
    if !ex.primary_muscles.is_empty() {
        out.push(("Primary muscles", ex.primary_muscles.join(", ")));
    }
    if !ex.secondary_muscles.is_empty() {
        out.push(("Secondary muscles", ex.secondary_muscles.join(", ")));
    }
    if let Some(difficulty) = &ex.difficulty {
        out.push(("Difficulty", difficulty.clone()));
    }
    if let Some(mechanics) = &ex.mechanics {
        out.push(("Mechanics", mechanics.clone()));
    }
    if let Some(score) = hit.relevance_score {
        out.push(("Score", score.to_string()));
    }
    out
}

fn filter_summary(result: &SearchResult) -> Option<String> {
    let filters = &result.filters;
    let mut parts = Vec::new();
    if let Some(v) = filters.active_categories() {
        parts.push(format!("category={}", v.join("|")));
    }
    if let Some(v) = filters.active_equipment() {
        parts.push(format!("equipment={}", v.join("|")));
    }
    if let Some(v) = filters.active_muscles() {
        parts.push(format!("muscle={}", v.join("|")));
    }
    if let Some(v) = filters.active_difficulty() {
        parts.push(format!("difficulty={v}"));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Export to Markdown format
fn export_markdown(result: &SearchResult, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("# Exercise Search Results\n\n");

    if !result.query.trim().is_empty() {
        output.push_str(&format!("**Query:** `{}`\n\n", result.query.replace('`', "")));
    }
    if let Some(summary) = filter_summary(result) {
        output.push_str(&format!("**Filters:** {}\n\n", escape_markdown(&summary)));
    }

    output.push_str(&format!(
        "**Results:** {} of {} | **Exported:** {}\n\n",
        result.exercises.len(),
        result.total,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str("---\n\n");

    for (i, hit) in result.exercises.iter().enumerate() {
        output.push_str(&format!("## {}. {}\n\n", i + 1, escape_markdown(&hit.exercise.name)));

        let rows = fields(hit);
        if !rows.is_empty() {
            output.push_str("| Field | Value |\n");
            output.push_str("|-------|-------|\n");
            for (label, value) in rows {
                output.push_str(&format!("| {label} | {} |\n", escape_markdown(&value)));
            }
            output.push('\n');
        }

        if let Some(description) = &hit.exercise.description {
            output.push_str(&escape_markdown(&truncate_text(description, options.max_text_len)));
            output.push_str("\n\n");
        }

        if options.include_instructions
            && let Some(instructions) = &hit.exercise.instructions
        {
            output.push_str("### Instructions\n\n");
            for (n, line) in instruction_lines(instructions).into_iter().enumerate() {
                output.push_str(&format!(
                    "{}. {}\n",
                    n + 1,
                    escape_markdown(&truncate_text(line, options.max_text_len))
                ));
            }
            output.push('\n');
        }

        output.push_str("---\n\n");
    }

    output
}

/// Export to JSON format
fn export_json(result: &SearchResult) -> String {
    let export_data = serde_json::json!({
        "query": result.query,
        "filters": result.filters,
        "count": result.exercises.len(),
        "total": result.total,
        "exported_at": Utc::now().to_rfc3339(),
        "exercises": result.exercises,
    });

    serde_json::to_string_pretty(&export_data).unwrap_or_else(|_| "{}".to_string())
}

/// Export to plain text format
fn export_plain_text(result: &SearchResult, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("EXERCISE SEARCH RESULTS\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');

    if !result.query.trim().is_empty() {
        output.push_str(&format!("Query: {}\n", result.query));
    }
    if let Some(summary) = filter_summary(result) {
        output.push_str(&format!("Filters: {summary}\n"));
    }
    output.push_str(&format!(
        "Results: {} of {}\n",
        result.exercises.len(),
        result.total
    ));

    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for (i, hit) in result.exercises.iter().enumerate() {
        output.push_str(&format!("[{}] {}\n", i + 1, hit.exercise.name));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for (label, value) in fields(hit) {
            output.push_str(&format!("{label}: {value}\n"));
        }

        if options.include_instructions
            && let Some(instructions) = &hit.exercise.instructions
        {
            output.push_str("Instructions:\n");
            for line in instruction_lines(instructions) {
                output.push_str(&format!("  {}\n", truncate_text(line, options.max_text_len)));
            }
        }

        output.push('\n');
    }

    output
}

/// Truncate text to max length (in characters), adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return text.to_string();
    }

    let char_count = text.chars().count();
    if char_count <= max_len {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
