//! Machine-readable output shape sent to the reasoning API.
//!
//! Uses the OpenAPI subset accepted by Gemini's `responseSchema`
//! (upper-case type names, `required` lists, `description` hints).

use serde_json::{Value, json};

/// Fields every reply must carry.
pub const REQUIRED_FIELDS: [&str; 5] = ["domain", "problem", "steps", "finalAnswer", "latexAnswer"];

/// Returns the response schema describing [`MathResponse`](super::MathResponse).
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "domain": {
                "type": "STRING",
                "description": "The mathematical domain of the problem."
            },
            "problem": {
                "type": "STRING",
                "description": "The original problem restated."
            },
            "assumptions": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Assumptions made during solving."
            },
            "steps": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "explanation": { "type": "STRING" },
                        "formula": {
                            "type": "STRING",
                            "description": "LaTeX formula if applicable."
                        }
                    },
                    "required": ["title", "explanation"]
                }
            },
            "alternativeMethods": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "finalAnswer": { "type": "STRING" },
            "latexAnswer": { "type": "STRING" }
        },
        "required": REQUIRED_FIELDS,
    })
}
