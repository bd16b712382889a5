//! Untrusted wire shape of an engine reply and its validation.
//!
//! The reasoning API is asked to follow the response schema, but nothing
//! guarantees it does. Replies are first decoded into [`RawMathResponse`],
//! where every field is optional, and only a successful [`RawMathResponse::validate`]
//! yields a [`MathResponse`].

use serde::Deserialize;

use super::model::{MathResponse, MathStep};
use crate::error::{AxiomError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMathStep {
    pub title: Option<String>,
    pub explanation: Option<String>,
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMathResponse {
    pub domain: Option<String>,
    pub problem: Option<String>,
    pub assumptions: Option<Vec<String>>,
    pub steps: Option<Vec<RawMathStep>>,
    pub alternative_methods: Option<Vec<String>>,
    pub final_answer: Option<String>,
    pub latex_answer: Option<String>,
}

impl RawMathResponse {
    /// Checks the mandatory-field invariant and normalizes optional fields.
    ///
    /// Mandatory: `domain`, `problem`, `finalAnswer`, `latexAnswer` (present and
    /// not blank) and `steps` (present, non-empty, each with `title` and
    /// `explanation`). Blank formulas and empty optional lists become `None`.
    pub fn validate(self) -> Result<MathResponse> {
        let domain = required_text("domain", self.domain)?;
        let problem = required_text("problem", self.problem)?;
        let final_answer = required_text("finalAnswer", self.final_answer)?;
        let latex_answer = required_text("latexAnswer", self.latex_answer)?;

        let raw_steps = self
            .steps
            .ok_or_else(|| AxiomError::schema("steps", "is missing"))?;
        if raw_steps.is_empty() {
            return Err(AxiomError::schema("steps", "must contain at least one step"));
        }

        let steps = raw_steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| {
                let title = required_text(&format!("steps[{index}].title"), step.title)?;
                let explanation =
                    required_text(&format!("steps[{index}].explanation"), step.explanation)?;
                Ok(MathStep {
                    title,
                    explanation,
                    formula: step.formula.filter(|formula| !formula.trim().is_empty()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MathResponse {
            domain,
            problem,
            assumptions: non_empty_list(self.assumptions),
            steps,
            alternative_methods: non_empty_list(self.alternative_methods),
            final_answer,
            latex_answer,
        })
    }
}

impl TryFrom<RawMathResponse> for MathResponse {
    type Error = AxiomError;

    fn try_from(raw: RawMathResponse) -> Result<Self> {
        raw.validate()
    }
}

/// Parses the engine's reply text into a validated [`MathResponse`].
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
pub fn parse_math_response(text: &str) -> Result<MathResponse> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(AxiomError::api("No response from engine."));
    }

    let raw: RawMathResponse = serde_json::from_str(body).map_err(|err| {
        tracing::debug!(error = %err, "engine reply is not valid JSON for the response schema");
        AxiomError::schema("$", format!("could not be parsed: {err}"))
    })?;
    raw.validate()
}

fn required_text(field: &str, value: Option<String>) -> Result<String> {
    match value {
        None => Err(AxiomError::schema(field, "is missing")),
        Some(text) if text.trim().is_empty() => Err(AxiomError::schema(field, "is empty")),
        Some(text) => Ok(text),
    }
}

fn non_empty_list(list: Option<Vec<String>>) -> Option<Vec<String>> {
    list.map(|items| {
        items
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .collect::<Vec<_>>()
    })
    .filter(|items| !items.is_empty())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line ("json", "JSON", or nothing).
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
