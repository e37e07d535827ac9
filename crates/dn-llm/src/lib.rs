//! Claude API integration for the availability notifier.
//!
//! Provides the free-day advisor: given free-text hints about past
//! availability and leave schedules, asks the model for candidate dates.
//! Output is advisory; callers validate every date before showing it.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const SUGGESTION_MAX_TOKENS: u32 = 600;
const SUGGESTION_TEMPERATURE: f32 = 0.4;

/// Default model used for suggestions.
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Claude API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            endpoint: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Sends requests to `endpoint` instead of the public Messages API.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Asks the model for candidate free days.
    pub async fn suggest_free_days(
        &self,
        model: &str,
        input: &FreeDaysRequest,
    ) -> Result<FreeDaysSuggestion, LlmError> {
        let request = MessageRequest {
            model: model.to_string(),
            max_tokens: SUGGESTION_MAX_TOKENS,
            temperature: SUGGESTION_TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: build_free_days_prompt(input),
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| LlmError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let payload: MessageResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        let text = extract_text(payload.content)?;
        parse_free_days(&text)
    }
}

/// Input context for free-day suggestions.
#[derive(Debug, Clone)]
pub struct FreeDaysRequest {
    /// Reference day as `YYYY-MM-DD`; suggestions must not precede it.
    pub today: String,
    /// Description of past and current availability.
    pub past_availability: String,
    /// Free-text leave schedules supplied by the admin; may be empty.
    pub leave_schedules: String,
    pub count: u32,
}

/// Raw model answer. Dates are unvalidated strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeDaysSuggestion {
    pub suggested_dates: Vec<String>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

fn extract_text(blocks: Vec<ContentBlock>) -> Result<String, LlmError> {
    let mut pieces = Vec::new();
    for block in blocks {
        let ContentBlock::Text { text } = block;
        pieces.push(text);
    }
    if pieces.is_empty() {
        return Err(LlmError::InvalidResponse(
            "missing text content".to_string(),
        ));
    }
    Ok(pieces.join("\n"))
}

fn parse_api_error(body: &str) -> Option<LlmError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| LlmError::Api {
            message: payload.error.message,
        })
}

fn build_free_days_prompt(input: &FreeDaysRequest) -> String {
    let mut lines = Vec::new();
    lines.push(
        "You are an assistant helping an admin plan their availability by suggesting potential free days."
            .to_string(),
    );
    lines.push(
        "Return strict JSON: {\"suggested_free_days\":[\"YYYY-MM-DD\"],\"reasoning\":\"...\"}"
            .to_string(),
    );
    lines.push("Rules:".to_string());
    lines.push("- Dates use ISO 8601 calendar format (YYYY-MM-DD), no times.".to_string());
    lines.push(format!(
        "- Suggest exactly {} distinct dates.",
        input.count
    ));
    lines.push(format!(
        "- Today is {}; suggest dates on or after today.",
        input.today
    ));
    lines.push("- Keep the reasoning to one or two sentences.".to_string());
    lines.push(String::new());
    lines.push("Historical availability:".to_string());
    lines.push(input.past_availability.trim().to_string());
    lines.push(String::new());
    lines.push("Common leave schedules:".to_string());
    let schedules = input.leave_schedules.trim();
    if schedules.is_empty() {
        lines.push("(none provided)".to_string());
    } else {
        lines.push(schedules.to_string());
    }
    lines.join("\n")
}

/// Strips a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_free_days(text: &str) -> Result<FreeDaysSuggestion, LlmError> {
    #[derive(serde::Deserialize)]
    struct Payload {
        suggested_free_days: Vec<String>,
        #[serde(default)]
        reasoning: Option<String>,
    }

    let payload: Payload = serde_json::from_str(strip_code_fence(text))
        .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
    Ok(FreeDaysSuggestion {
        suggested_dates: payload
            .suggested_free_days
            .into_iter()
            .map(|date| date.trim().to_string())
            .collect(),
        reasoning: payload.reasoning,
    })
}
