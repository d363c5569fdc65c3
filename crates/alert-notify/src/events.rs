//! Alert event types consumed by the Google Chat output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::EventError;

/// Priority of a triggered rule, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Priority {
    Debug,
    Informational,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Priority {
    /// Get display name for this priority.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Informational => "Informational",
            Self::Notice => "Notice",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Critical => "Critical",
            Self::Alert => "Alert",
            Self::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "informational" | "info" => Ok(Self::Informational),
            "notice" => Ok(Self::Notice),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            "alert" => Ok(Self::Alert),
            "emergency" => Ok(Self::Emergency),
            other => Err(format!("unknown priority {other:?}")),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.as_str().to_string()
    }
}

/// A scalar value attached to an alert under a field name.
///
/// Display form: strings verbatim, numbers and booleans through their
/// `Display` implementation. Integers above `i64::MAX` decode as
/// `Unsigned` so they keep every digit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Unsigned(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A security alert to forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Name of the triggered rule
    pub rule: String,
    pub priority: Priority,
    /// Subsystem the alert originates from (e.g. `syscall`)
    pub source: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub time: DateTime<Utc>,
    /// Free-form fields; a `BTreeMap` keeps them in key order
    #[serde(default)]
    pub output_fields: BTreeMap<String, FieldValue>,
}

impl AlertEvent {
    /// Create an event with no hostname, tags or output fields.
    #[must_use]
    pub fn new(
        rule: impl Into<String>,
        priority: Priority,
        source: impl Into<String>,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            rule: rule.into(),
            priority,
            source: source.into(),
            hostname: String::new(),
            tags: vec![],
            time,
            output_fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.output_fields.insert(key.into(), value.into());
        self
    }

    /// Decode an event from its JSON form.
    ///
    /// # Errors
    /// Returns [`EventError::NonScalarField`] when an output field holds
    /// null, an array or an object, and [`EventError::Json`] for any other
    /// schema mismatch.
    pub fn from_json(input: &str) -> Result<Self, EventError> {
        let value: serde_json::Value = serde_json::from_str(input)?;

        if let Some(fields) = value.get("output_fields").and_then(|v| v.as_object()) {
            for (key, field) in fields {
                if !(field.is_string() || field.is_number() || field.is_boolean()) {
                    return Err(EventError::NonScalarField { key: key.clone() });
                }
            }
        }

        Ok(serde_json::from_value(value)?)
    }
}
