//! GeminiSolver - Direct REST API implementation of the solve adapter.
//!
//! Sends one `generateContent` request per problem, constrained to the
//! response schema, and validates the reply into a `MathResponse`.

use std::time::Duration;

use async_trait::async_trait;
use axiom_core::config::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, SolverConfig};
use axiom_core::error::{AxiomError, Result};
use axiom_core::schema::{MathResponse, parse_math_response, response_schema};
use axiom_core::solver::MathSolver;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prompt::system_instruction;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Solve adapter that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiSolver {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    thinking_budget: Option<u32>,
    system_instruction: String,
}

impl GeminiSolver {
    /// Creates a solver with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            thinking_budget: None,
            system_instruction: system_instruction(),
        }
    }

    /// Creates a solver from configuration.
    ///
    /// The optional `timeout_secs` is applied to the underlying HTTP client.
    pub fn from_config(config: &SolverConfig, api_key: impl Into<String>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AxiomError::config(format!("Failed to build HTTP client: {e}")))?;

        let model = if config.model.trim().is_empty() {
            DEFAULT_GEMINI_MODEL.to_string()
        } else {
            config.model.clone()
        };

        Ok(Self {
            client,
            api_key: api_key.into(),
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            thinking_budget: Some(config.thinking_budget).filter(|budget| *budget > 0),
            system_instruction: system_instruction(),
        })
    }

    /// Replaces the HTTP client, e.g. to change proxy or timeout settings.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL (everything before `/{model}:generateContent`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the thinking token budget sent with every request.
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, problem_text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: self.system_instruction.clone(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: problem_text.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                thinking_config: self.thinking_budget.map(|thinking_budget| ThinkingConfig {
                    thinking_budget,
                }),
            },
        }
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| AxiomError::api(format!("Gemini API request failed: {}", err.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AxiomError::api(format!("Failed to parse Gemini response: {}", err.without_url())))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl MathSolver for GeminiSolver {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn solve(&self, problem_text: &str) -> Result<MathResponse> {
        if problem_text.trim().is_empty() {
            return Err(AxiomError::EmptyInput);
        }

        tracing::info!(
            model = %self.model,
            problem_chars = problem_text.chars().count(),
            "sending solve request"
        );

        let request = self.build_request(problem_text);
        let result = self
            .send_request(&request)
            .await
            .and_then(|text| parse_math_response(&text));

        match &result {
            Ok(response) => tracing::info!(
                domain = %response.domain,
                steps = response.steps.len(),
                "solve request succeeded"
            ),
            Err(err) => tracing::warn!(error = %err, "solve request failed"),
        }
        result
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Joins the answer text of the first candidate, skipping thought parts.
fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        return Err(AxiomError::api(format!("Gemini blocked the request: {reason}")));
    }

    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AxiomError::api("No response from engine."));
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: String) -> AxiomError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let message = if message.trim().is_empty() {
        status.to_string()
    } else {
        message
    };

    AxiomError::api(format!("Gemini API error ({}): {}", status.as_u16(), message))
}
