//! Solved-problem domain model.

use serde::{Deserialize, Serialize};

/// One derivation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathStep {
    /// Short label for the step.
    pub title: String,
    /// Prose explanation of what the step does.
    pub explanation: String,
    /// Typesettable formula, when the step has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

/// Full solved-problem payload returned by the reasoning engine.
///
/// Deserialization goes through [`RawMathResponse::validate`](super::RawMathResponse::validate)
/// as well, so `steps` is never empty and the answer fields are never blank,
/// whether the value came from the engine or from stored history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "super::RawMathResponse")]
pub struct MathResponse {
    /// Classification of the problem, e.g. "Algebra".
    pub domain: String,
    /// The original problem, restated by the engine.
    pub problem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
    /// Derivation steps in order.
    pub steps: Vec<MathStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_methods: Option<Vec<String>>,
    /// Plain-text conclusion.
    pub final_answer: String,
    /// Typesettable conclusion.
    pub latex_answer: String,
}

/// A persisted unit of history: one successful solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRecord {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Creation time in Unix milliseconds.
    pub timestamp: i64,
    /// The text the user submitted.
    pub problem: String,
    pub response: MathResponse,
}

impl CalculationRecord {
    /// Short preview of the problem, cut at `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let single_line = self.problem.split_whitespace().collect::<Vec<_>>().join(" ");
        if single_line.chars().count() <= max_chars {
            single_line
        } else {
            let cut: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{cut}…")
        }
    }
}
