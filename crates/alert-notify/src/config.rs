//! Output settings for the Google Chat webhook.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::template::MessageTemplate;

/// Environment variable for the Google Chat webhook URL.
pub const ENV_WEBHOOK_URL: &str = "GOOGLECHAT_WEBHOOK_URL";

/// Environment variable selecting `text` or `fields` output.
pub const ENV_OUTPUT_FORMAT: &str = "GOOGLECHAT_OUTPUT_FORMAT";

/// Environment variable holding the message template.
pub const ENV_MESSAGE_FORMAT: &str = "GOOGLECHAT_MESSAGE_FORMAT";

/// Environment variable for the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "GOOGLECHAT_TIMEOUT_SECS";

/// Environment variable for a DogStatsD `host:port` to count deliveries on.
pub const ENV_STATSD_ADDR: &str = "STATSD_ADDR";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How an alert is laid out in the chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Only the templated `text` is sent
    Text,
    /// A card with one row per field, plus the templated `text` if any
    #[default]
    Fields,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "fields" | "all" | "" => Ok(Self::Fields),
            _ => Err(ConfigError::InvalidOutputFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Fields => f.write_str("fields"),
        }
    }
}

/// What the payload builder needs to lay out a message.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub output_format: OutputFormat,
    pub message_template: Option<MessageTemplate>,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(output_format: OutputFormat) -> Self {
        Self {
            output_format,
            message_template: None,
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: MessageTemplate) -> Self {
        self.message_template = Some(template);
        self
    }
}

/// Raw settings for the Google Chat output, before template compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleChatSettings {
    pub webhook_url: String,
    pub output_format: OutputFormat,
    pub message_format: Option<String>,
    pub timeout: Duration,
}

impl GoogleChatSettings {
    /// Settings with defaults for everything but the webhook URL.
    #[must_use]
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            output_format: OutputFormat::default(),
            message_format: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load settings from environment variables.
    ///
    /// # Errors
    /// Returns an error if the webhook URL is unset or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_url = std::env::var(ENV_WEBHOOK_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_WEBHOOK_URL))?;

        let output_format = match std::env::var(ENV_OUTPUT_FORMAT) {
            Ok(v) => v.parse()?,
            Err(_) => OutputFormat::default(),
        };

        let message_format = std::env::var(ENV_MESSAGE_FORMAT)
            .ok()
            .filter(|v| !v.is_empty());

        let timeout = match std::env::var(ENV_TIMEOUT_SECS) {
            Ok(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(v.clone()))?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        debug!(
            output_format = %output_format,
            templated = message_format.is_some(),
            timeout_secs = timeout.as_secs(),
            "Loaded Google Chat settings"
        );

        Ok(Self {
            webhook_url,
            output_format,
            message_format,
            timeout,
        })
    }

    /// Compile the message template and produce the builder configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Template`] if the template does not compile.
    pub fn output_config(&self) -> Result<OutputConfig, ConfigError> {
        let mut config = OutputConfig::new(self.output_format);
        if let Some(source) = &self.message_format {
            config = config.with_template(MessageTemplate::compile(source)?);
        }
        Ok(config)
    }
}
