//! Core error types for the generation pipeline
//!
//! Every failure the pipeline can hit is a value here. The orchestrator folds
//! them into an [`ErrorKind`] plus a message on the terminal `Failed` state.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::config::Provider;

/// Classification of a failed generation attempt
///
/// The first three kinds are detected locally before any network I/O. All
/// kinds are recoverable: the user corrects input or settings and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    MissingCredential,
    EmptyInput,
    UnknownCategory,
    ProviderError,
    RenderFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingCredential => "missing-credential",
            ErrorKind::EmptyInput => "empty-input",
            ErrorKind::UnknownCategory => "unknown-category",
            ErrorKind::ProviderError => "provider-error",
            ErrorKind::RenderFailure => "render-failure",
        }
    }

    /// Whether this failure was detected without contacting the provider
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ErrorKind::MissingCredential | ErrorKind::EmptyInput | ErrorKind::UnknownCategory
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by a catalog lookup for an id outside the fixed catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown diagram category: {id}")]
pub struct CategoryNotFound {
    pub id: String,
}

/// Rejected configuration updates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown provider: {name}")]
    UnknownProvider { name: String },

    #[error("Model '{model}' is not available for provider {provider}")]
    UnknownModel { provider: Provider, model: String },

    #[error("Temperature {value} is outside [0.0, 1.0]")]
    TemperatureOutOfRange { value: f64 },
}

/// Failures of the external key-value store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

/// Failures talking to the generative text provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider configuration error: {message}")]
    Configuration { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Provider request timed out")]
    Timeout,
}

impl ProviderError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// A diagram source that could not be turned into an artifact
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The synchronous rejection for blank sources
    pub fn empty_source() -> Self {
        Self::new("empty source")
    }
}
