//! Google Chat output for security alert events.
//!
//! This crate converts an [`AlertEvent`] into a Google Chat webhook message,
//! posts it, and records the outcome in local counters, external metrics
//! sinks and the log. Delivery is fire-and-forget: a failed event is
//! counted and dropped, never retried.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use alert_notify::{AlertEvent, Dispatcher, GoogleChatSettings, OutputStats, Priority};
//!
//! # async fn example() -> Result<(), alert_notify::ConfigError> {
//! let settings = GoogleChatSettings::from_env()?;
//! let dispatcher = Dispatcher::from_settings(&settings, Arc::new(OutputStats::new()))?;
//!
//! let event = AlertEvent::new("Terminal shell in container", Priority::Notice, "syscall", chrono::Utc::now())
//!     .with_hostname("node-1")
//!     .with_field("proc.name", "bash");
//!
//! dispatcher.dispatch(&event).await;
//! dispatcher.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `GOOGLECHAT_WEBHOOK_URL`: incoming webhook URL (required)
//! - `GOOGLECHAT_OUTPUT_FORMAT`: `text` or `fields` (default `fields`)
//! - `GOOGLECHAT_MESSAGE_FORMAT`: Handlebars template for the message text
//! - `GOOGLECHAT_TIMEOUT_SECS`: request timeout (default 10)
//!
//! # Architecture
//!
//! - [`build_payload`] is a pure function from event and [`OutputConfig`]
//!   to [`GoogleChatPayload`]
//! - [`Transport`] posts a payload; [`WebhookClient`] is the HTTP
//!   implementation
//! - [`Dispatcher`] sequences build, post and outcome accounting through
//!   [`OutputStats`] and any number of [`MetricsSink`]s

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod metrics;
pub mod payload;
pub mod stats;
pub mod template;
pub mod transport;

pub use config::{GoogleChatSettings, OutputConfig, OutputFormat};
pub use dispatcher::Dispatcher;
pub use error::{ChannelError, ConfigError, EventError, TemplateError};
pub use events::{AlertEvent, FieldValue, Priority};
pub use metrics::{DeliveryStatus, MetricsSink, OutputLabels, PrometheusMetrics, StatsdMetrics};
pub use payload::{build_payload, GoogleChatPayload, KeyValue};
pub use stats::{OutputStats, StatKind, StatsSnapshot};
pub use template::MessageTemplate;
pub use transport::{Transport, WebhookClient};

/// Destination label used in logs and metrics.
pub const DESTINATION: &str = "googlechat";
