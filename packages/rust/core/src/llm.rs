//! Text-generation backend.
//!
//! [`TextGenerator`] is the seam the orchestrator talks to. [`OpenRouterClient`]
//! implements it for any OpenAI-compatible chat-completions endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use brandplanner_shared::{CallBudget, LlmConfig, PlannerError, Result, Retryable, resolve_api_key};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("BrandPlanner/", env!("CARGO_PKG_VERSION"));

/// Longest API error body kept in a failure message.
const MAX_ERROR_BODY: usize = 200;

/// One prompt plus the sampling parameters for it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, budget: CallBudget) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens: budget.max_tokens,
            temperature: budget.temperature,
        }
    }
}

/// Typed failure of a single generation call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationFailure {
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl Retryable for GenerationFailure {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Anything that turns a prompt into text.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = std::result::Result<String, GenerationFailure>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Chat-completions client for OpenRouter or any compatible API.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    api_key: String,
    system_prompt: String,
}

impl OpenRouterClient {
    /// Build a client, reading the API key from the configured env var.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        Self::new(config, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlannerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    #[instrument(skip_all, fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn complete(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationFailure> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "BrandPlanner")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationFailure::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(GenerationFailure::RateLimited { retry_after });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationFailure::Api {
                status: status.as_u16(),
                message: truncate(text.trim(), MAX_ERROR_BODY),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationFailure::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| {
                GenerationFailure::Malformed("no choices[0].message.content".into())
            })?;

        debug!(chars = content.len(), "completion received");
        Ok(content)
    }
}

impl TextGenerator for OpenRouterClient {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = std::result::Result<String, GenerationFailure>> + Send {
        self.complete(request)
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
