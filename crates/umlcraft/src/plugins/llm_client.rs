//! Provider client backed by the `llm` crate
//!
//! Mistral and Gemini use their native backends. The custom provider speaks
//! the OpenAI chat-completions protocol against the user's endpoint, through
//! the OpenAI-compatible backend with its base URL overridden.

use ::llm::builder::{LLMBackend, LLMBuilder};
use ::llm::chat::ChatMessage;
use ::llm::error::LLMError;
use async_trait::async_trait;
use tracing::{debug, span, Instrument, Level};

use crate::core::{Provider, ProviderClient, ProviderError, ProviderRequest};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

fn backend_for(provider: Provider) -> LLMBackend {
    match provider {
        Provider::Mistral => LLMBackend::Mistral,
        Provider::Gemini => LLMBackend::Google,
        // POSTs to `<base_url>/chat/completions`
        Provider::Custom => LLMBackend::Mistral,
    }
}

/// Normalize a user-supplied endpoint into a base URL
///
/// Users tend to paste the full `.../v1/chat/completions` URL; the backend
/// appends that path itself.
pub fn base_url_for(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let base = trimmed
        .strip_suffix("/chat/completions")
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    format!("{}/", base)
}

/// Pull the HTTP status code out of an llm error message
///
/// Chat-completions backends report `... API returned error status: 503 ...`;
/// backends using `error_for_status` report `HTTP status server error (503 ...)`.
fn status_code(message: &str) -> Option<u16> {
    ["error status: ", "client error (", "server error ("]
        .iter()
        .find_map(|marker| {
            let start = message.find(marker)? + marker.len();
            let digits: String = message[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
}

fn classify(error: LLMError) -> ProviderError {
    let (message, detail) = match error {
        LLMError::ResponseFormatError {
            message,
            raw_response,
        } => (message, raw_response),
        other => (other.to_string(), String::new()),
    };

    if let Some(status) = status_code(&message) {
        let message = if detail.trim().is_empty() {
            message
        } else {
            detail.trim().to_string()
        };
        return ProviderError::Status { status, message };
    }

    let lower = message.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") {
        ProviderError::Timeout
    } else {
        ProviderError::Transport { message }
    }
}

/// Talks to Mistral, Gemini or an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct LlmProviderClient {
    timeout_seconds: u64,
}

impl Default for LlmProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProviderClient {
    pub fn new() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Transport timeout applied to every request
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn builder(&self, request: &ProviderRequest) -> Result<LLMBuilder, ProviderError> {
        let mut builder = LLMBuilder::new()
            .backend(backend_for(request.provider))
            .model(&request.model)
            .system(&request.system)
            .temperature(request.temperature as f32)
            .timeout_seconds(self.timeout_seconds);

        if !request.api_key.is_empty() {
            builder = builder.api_key(&request.api_key);
        }

        if request.provider == Provider::Custom {
            let endpoint = request
                .endpoint
                .as_deref()
                .ok_or_else(|| ProviderError::configuration("custom provider requires an endpoint"))?;
            builder = builder.base_url(base_url_for(endpoint));
        }

        Ok(builder)
    }
}

#[async_trait]
impl ProviderClient for LlmProviderClient {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let request_span = span!(
            Level::DEBUG,
            "provider_request",
            provider = %request.provider,
            model = %request.model,
            prompt_len = request.prompt.len()
        );

        async {
            let llm = self
                .builder(request)?
                .build()
                .map_err(|e| ProviderError::configuration(format!("build LLM: {}", e)))?;

            let messages = vec![ChatMessage::user().content(&request.prompt).build()];

            debug!("Sending chat request");
            let response = llm.chat(&messages).await.map_err(classify)?;

            // Blank replies are left for the render step to reject
            Ok(response.text().unwrap_or_default())
        }
        .instrument(request_span)
        .await
    }
}
