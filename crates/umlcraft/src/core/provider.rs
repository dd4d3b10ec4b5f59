//! Generative text provider contract
//!
//! The pipeline hands a [`ProviderRequest`] to a [`ProviderClient`] and gets
//! raw response text back. Wire formats belong to the client implementations
//! in `plugins`.

use std::fmt;

use async_trait::async_trait;

use super::config::{Provider, ProviderConfig};
use super::error::ProviderError;

/// Instruction sent alongside every prompt
pub const SYSTEM_PROMPT: &str = "You are a software architect who writes UML diagrams in Mermaid syntax. \
Answer with exactly one fenced ```mermaid code block containing a complete, valid Mermaid diagram. \
Do not add explanations before or after the block.";

/// Logical provider request
#[derive(Clone, PartialEq)]
pub struct ProviderRequest {
    pub provider: Provider,
    pub model: String,
    pub temperature: f64,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub system: String,
    pub prompt: String,
}

impl ProviderRequest {
    /// Build a request from a config snapshot and a full prompt
    pub fn new(config: &ProviderConfig, prompt: impl Into<String>) -> Self {
        Self {
            provider: config.provider(),
            model: config.model().to_string(),
            temperature: config.temperature(),
            api_key: config.api_key().to_string(),
            endpoint: config.custom_endpoint().map(str::to_string),
            system: SYSTEM_PROMPT.to_string(),
            prompt: prompt.into(),
        }
    }
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRequest")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("prompt_len", &self.prompt.len())
            .finish()
    }
}

/// Sends prompts to a generative text backend
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Get the name of this client
    fn name(&self) -> &'static str;

    /// Send the request and return the raw response text
    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_snapshots_config() {
        let config = ProviderConfig::default()
            .set_provider(Provider::Custom)
            .with_api_key("sk-secret")
            .with_custom_endpoint(Some("https://llm.local/v1".to_string()));
        let request = ProviderRequest::new(&config, "draw");
        assert_eq!(request.provider, Provider::Custom);
        assert_eq!(request.model, "custom-model");
        assert_eq!(request.endpoint.as_deref(), Some("https://llm.local/v1"));
        assert_eq!(request.prompt, "draw");
        assert!(request.system.contains("```mermaid"));
    }

    #[test]
    fn test_request_debug_hides_key() {
        let config = ProviderConfig::default().with_api_key("sk-secret");
        let request = ProviderRequest::new(&config, "draw");
        assert!(!format!("{:?}", request).contains("sk-secret"));
    }
}
