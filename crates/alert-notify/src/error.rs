//! Error types for the Google Chat output.

use thiserror::Error;

/// Errors that can occur when delivering a payload to the webhook.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The webhook answered with a non-success status
    #[error("Google Chat returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors raised while compiling or rendering a message template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template source is not valid Handlebars
    #[error("invalid message template: {0}")]
    Compile(#[from] handlebars::TemplateError),

    /// Rendering failed against a concrete event
    #[error("failed to render message template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Errors raised while loading output settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// Unknown output format
    #[error("invalid output format {0:?}, expected \"text\" or \"fields\"")]
    InvalidOutputFormat(String),

    /// Timeout is not a whole number of seconds
    #[error("invalid timeout {0:?}")]
    InvalidTimeout(String),

    /// Message template failed to compile
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// HTTP client could not be built
    #[error(transparent)]
    Client(#[from] ChannelError),
}

/// Errors raised while decoding an incoming alert event.
#[derive(Debug, Error)]
pub enum EventError {
    /// The event is not valid JSON for the alert schema
    #[error("invalid alert event: {0}")]
    Json(#[from] serde_json::Error),

    /// An output field carries a value that has no display form
    #[error("output field {key:?} is not a scalar value")]
    NonScalarField { key: String },
}
