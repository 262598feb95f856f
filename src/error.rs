//! Error types for the price poster

use thiserror::Error;

/// Errors that can occur when fetching prices from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Response did not contain every requested symbol
    #[error("Missing symbols: {}", .0.join(", "))]
    MissingSymbols(Vec<String>),

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Failover was configured without any providers
    #[error("No providers configured")]
    NoProviders,
}

/// Errors that can occur when persisting the post state
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that can occur while rendering an artifact
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("failed to decode template {path}: {reason}")]
    TemplateDecode { path: String, reason: String },

    #[error("font unavailable ({path}): {reason}")]
    FontUnavailable { path: String, reason: String },

    #[error("failed to draw price text: {0}")]
    Draw(String),

    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Errors that can occur while delivering an artifact
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    /// Creates an InvalidValue error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
