//! Provider configuration record
//!
//! [`ProviderConfig`] keeps the invariant `model ∈ models_for(provider)` and a
//! temperature inside `[0.0, 1.0]`. Fields are private: every update goes
//! through a method that returns a new, valid record. Deserialization runs
//! the same validation, so a stored record that breaks the invariant fails
//! to parse instead of producing an invalid value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Supported generative text backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Mistral,
    Gemini,
    /// Any OpenAI-compatible endpoint supplied by the user
    Custom,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Mistral, Provider::Gemini, Provider::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Mistral => "mistral",
            Provider::Gemini => "gemini",
            Provider::Custom => "custom",
        }
    }

    /// Models that may be selected for this provider; the first is the default
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Provider::Mistral => &[
                "mistral-small-latest",
                "mistral-large-latest",
                "pixtral-large-latest",
            ],
            Provider::Gemini => &["gemini-2.0-flash", "gemini-2.0-flash-exp"],
            Provider::Custom => &["custom-model"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0]
    }

    pub fn supports_model(&self, model: &str) -> bool {
        self.models().contains(&model)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mistral" => Ok(Provider::Mistral),
            "gemini" => Ok(Provider::Gemini),
            "custom" => Ok(Provider::Custom),
            _ => Err(ConfigError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

/// Models valid for `provider`
pub fn models_for(provider: Provider) -> &'static [&'static str] {
    provider.models()
}

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// User-controlled provider settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProviderConfig")]
pub struct ProviderConfig {
    provider: Provider,
    api_key: String,
    model: String,
    temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_endpoint: Option<String>,
}

/// Unvalidated shape of the stored record
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProviderConfig {
    provider: Provider,
    #[serde(default)]
    api_key: String,
    model: String,
    temperature: f64,
    #[serde(default)]
    custom_endpoint: Option<String>,
}

impl TryFrom<RawProviderConfig> for ProviderConfig {
    type Error = ConfigError;

    fn try_from(raw: RawProviderConfig) -> Result<Self, Self::Error> {
        ProviderConfig::new(
            raw.provider,
            raw.api_key,
            raw.model,
            raw.temperature,
            raw.custom_endpoint,
        )
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Mistral,
            api_key: String::new(),
            model: Provider::Mistral.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            custom_endpoint: None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.masked_api_key())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("custom_endpoint", &self.custom_endpoint)
            .finish()
    }
}

fn check_temperature(value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::TemperatureOutOfRange { value })
    }
}

impl ProviderConfig {
    /// Build a validated record
    pub fn new(
        provider: Provider,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f64,
        custom_endpoint: Option<String>,
    ) -> Result<Self, ConfigError> {
        let model = model.into();
        if !provider.supports_model(&model) {
            return Err(ConfigError::UnknownModel { provider, model });
        }

        Ok(Self {
            provider,
            api_key: api_key.into(),
            model,
            temperature: check_temperature(temperature)?,
            custom_endpoint: custom_endpoint.filter(|url| !url.trim().is_empty()),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn custom_endpoint(&self) -> Option<&str> {
        self.custom_endpoint.as_deref()
    }

    /// Switch provider, resetting the model to the new provider's default
    pub fn set_provider(&self, provider: Provider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            ..self.clone()
        }
    }

    pub fn with_model(&self, model: &str) -> Result<Self, ConfigError> {
        if !self.provider.supports_model(model) {
            return Err(ConfigError::UnknownModel {
                provider: self.provider,
                model: model.to_string(),
            });
        }
        Ok(Self {
            model: model.to_string(),
            ..self.clone()
        })
    }

    pub fn with_temperature(&self, temperature: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            temperature: check_temperature(temperature)?,
            ..self.clone()
        })
    }

    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..self.clone()
        }
    }

    /// Set or clear the custom endpoint; blank strings clear it
    pub fn with_custom_endpoint(&self, endpoint: Option<String>) -> Self {
        Self {
            custom_endpoint: endpoint.filter(|url| !url.trim().is_empty()),
            ..self.clone()
        }
    }

    /// Re-check the invariants; only fails for records built outside `new`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.provider.supports_model(&self.model) {
            return Err(ConfigError::UnknownModel {
                provider: self.provider,
                model: self.model.clone(),
            });
        }
        check_temperature(self.temperature).map(|_| ())
    }

    /// A generation may only be attempted with a credential present
    pub fn is_usable(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The api key with everything but the last four characters hidden
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider(), Provider::Mistral);
        assert_eq!(config.model(), "mistral-small-latest");
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(config.api_key(), "");
        assert!(config.custom_endpoint().is_none());
        assert!(!config.is_usable());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_set_provider_resets_model() {
        let config = ProviderConfig::default()
            .with_model("mistral-large-latest")
            .unwrap()
            .with_api_key("secret");
        let switched = config.set_provider(Provider::Gemini);
        assert_eq!(switched.provider(), Provider::Gemini);
        assert_eq!(switched.model(), "gemini-2.0-flash");
        assert_eq!(switched.api_key(), "secret");
        assert_eq!(switched.temperature(), config.temperature());
    }

    #[test]
    fn test_with_model_rejects_foreign_model() {
        let config = ProviderConfig::default();
        let err = config.with_model("gemini-2.0-flash").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModel { .. }));
    }

    #[test]
    fn test_temperature_bounds() {
        let config = ProviderConfig::default();
        assert!(config.with_temperature(0.0).is_ok());
        assert!(config.with_temperature(1.0).is_ok());
        assert!(config.with_temperature(1.01).is_err());
        assert!(config.with_temperature(-0.1).is_err());
        assert!(config.with_temperature(f64::NAN).is_err());
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("custom".parse::<Provider>().unwrap(), Provider::Custom);
        assert!("openai".parse::<Provider>().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let config = ProviderConfig::default().with_api_key("k");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["provider"], "mistral");
        assert_eq!(json["apiKey"], "k");
        assert_eq!(json["model"], "mistral-small-latest");
        assert!(json.get("customEndpoint").is_none());
    }

    #[test]
    fn test_deserialize_rejects_invariant_violation() {
        let json = r#"{"provider":"gemini","apiKey":"k","model":"mistral-small-latest","temperature":0.5}"#;
        assert!(serde_json::from_str::<ProviderConfig>(json).is_err());
    }

    #[test]
    fn test_deserialize_custom_endpoint() {
        let json = r#"{"provider":"custom","apiKey":"k","model":"custom-model","temperature":0.2,"customEndpoint":"https://llm.internal/v1"}"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.custom_endpoint(), Some("https://llm.internal/v1"));
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = ProviderConfig::default().with_api_key("sk-1234567890");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-1234567890"));
        assert!(debug.contains("7890"));
        assert_eq!(config.masked_api_key(), "*********7890");
    }
}
