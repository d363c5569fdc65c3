//! Google Chat message construction.
//!
//! [`build_payload`] turns an [`AlertEvent`] into the card layout the
//! incoming-webhook API expects. It does no I/O and never fails: a template
//! that cannot be rendered is logged and leaves `text` empty.
//!
//! In [`OutputFormat::Fields`] mode the card holds one row per output field,
//! sorted by key, followed by fixed rows in this order:
//! `rule`, `priority`, `source`, `hostname` (if set), `tags` (if any), `time`.
//! The `time` row uses chrono's `Display` form (`2024-05-01 12:00:00.120 UTC`),
//! which keeps millisecond padding and prints no numeric offset, unlike
//! Go's `Time.String()` (`2024-05-01 12:00:00.12 +0000 UTC`).

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::{OutputConfig, OutputFormat};
use crate::events::AlertEvent;
use crate::DESTINATION;

/// Build the webhook payload for an event.
#[must_use]
pub fn build_payload(event: &AlertEvent, config: &OutputConfig) -> GoogleChatPayload {
    let text = config
        .message_template
        .as_ref()
        .and_then(|template| match template.render(event) {
            Ok(text) => Some(text),
            Err(e) => {
                error!(
                    destination = DESTINATION,
                    rule = %event.rule,
                    error = %e,
                    "Failed to expand Google Chat message template"
                );
                None
            }
        })
        .unwrap_or_default();

    if config.output_format == OutputFormat::Text {
        return GoogleChatPayload {
            text,
            cards: vec![],
        };
    }

    GoogleChatPayload {
        text,
        cards: vec![Card {
            sections: vec![Section {
                widgets: display_rows(event),
            }],
        }],
    }
}

/// Rows for the card: sorted output fields, then the fixed summary rows.
fn display_rows(event: &AlertEvent) -> Vec<Widget> {
    // BTreeMap iterates in ascending key order
    let mut widgets: Vec<Widget> = event
        .output_fields
        .iter()
        .map(|(key, value)| Widget::key_value(key, value.to_string()))
        .collect();

    widgets.push(Widget::key_value("rule", &event.rule));
    widgets.push(Widget::key_value("priority", event.priority.as_str()));
    widgets.push(Widget::key_value("source", &event.source));

    if !event.hostname.is_empty() {
        widgets.push(Widget::key_value("hostname", &event.hostname));
    }

    if !event.tags.is_empty() {
        widgets.push(Widget::key_value("tags", event.tags.join(", ")));
    }

    widgets.push(Widget::key_value("time", event.time.to_string()));

    widgets
}

// =============================================================================
// Google Chat API types
// =============================================================================

/// Body posted to the Google Chat webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleChatPayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
}

impl GoogleChatPayload {
    /// All display rows across every card and section, in order.
    pub fn rows(&self) -> impl Iterator<Item = &KeyValue> {
        self.cards
            .iter()
            .flat_map(|card| &card.sections)
            .flat_map(|section| &section.widgets)
            .map(|widget| &widget.key_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    #[serde(rename = "keyValue")]
    pub key_value: KeyValue,
}

impl Widget {
    fn key_value(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key_value: KeyValue {
                top_label: label.into(),
                content: content.into(),
            },
        }
    }
}

/// One label/value display row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    pub top_label: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FieldValue, Priority};
    use crate::template::MessageTemplate;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn scenario_event() -> AlertEvent {
        AlertEvent::new("r1", Priority::Warning, "syscall", t0())
            .with_field("proc.name", "bash")
            .with_field("fd.num", "3")
    }

    fn labels(payload: &GoogleChatPayload) -> Vec<&str> {
        payload.rows().map(|kv| kv.top_label.as_str()).collect()
    }

    fn fields_config() -> OutputConfig {
        OutputConfig::new(OutputFormat::Fields)
    }

    fn text_config(template: &str) -> OutputConfig {
        OutputConfig::new(OutputFormat::Text).with_template(MessageTemplate::compile(template).unwrap())
    }

    #[test]
    fn test_fields_scenario_without_template() {
        let payload = build_payload(&scenario_event(), &fields_config());

        let rows: Vec<(&str, &str)> = payload
            .rows()
            .map(|kv| (kv.top_label.as_str(), kv.content.as_str()))
            .collect();
        let time = t0().to_string();
        assert_eq!(
            rows,
            vec![
                ("fd.num", "3"),
                ("proc.name", "bash"),
                ("rule", "r1"),
                ("priority", "Warning"),
                ("source", "syscall"),
                ("time", time.as_str()),
            ]
        );
        assert_eq!(payload.text, "");
        assert_eq!(payload.cards.len(), 1);
        assert_eq!(payload.cards[0].sections.len(), 1);
    }

    #[test]
    fn test_text_scenario_with_template() {
        let payload = build_payload(&scenario_event(), &text_config("ALERT {{rule}}"));

        assert_eq!(
            payload,
            GoogleChatPayload {
                text: "ALERT r1".to_string(),
                cards: vec![],
            }
        );
    }

    #[test]
    fn test_text_mode_ignores_rows() {
        let event = scenario_event()
            .with_hostname("node-1")
            .with_tags(["container"]);
        let payload = build_payload(&event, &OutputConfig::new(OutputFormat::Text));

        assert!(payload.cards.is_empty());
        assert_eq!(payload.rows().count(), 0);
        assert_eq!(payload.text, "");
    }

    #[test]
    fn test_optional_rows_keep_fixed_order() {
        let event = scenario_event()
            .with_hostname("node-1")
            .with_tags(["container", "mitre_execution", "shell"]);
        let payload = build_payload(&event, &fields_config());

        assert_eq!(
            labels(&payload),
            vec![
                "fd.num", "proc.name", "rule", "priority", "source", "hostname", "tags", "time"
            ]
        );
        let tags = payload.rows().find(|kv| kv.top_label == "tags").unwrap();
        assert_eq!(tags.content, "container, mitre_execution, shell");
    }

    #[test]
    fn test_tags_without_hostname() {
        let event = scenario_event().with_tags(["k8s"]);
        let payload = build_payload(&event, &fields_config());

        assert_eq!(
            labels(&payload)[2..],
            ["rule", "priority", "source", "tags", "time"]
        );
    }

    #[test]
    fn test_dynamic_rows_sorted_by_key() {
        let event = AlertEvent::new("r1", Priority::Notice, "k8s_audit", t0())
            .with_field("user.name", "admin")
            .with_field("ka.verb", "create")
            .with_field("container.id", "abc")
            .with_field("Zeta", "upper-case sorts first")
            .with_field("evt.num", 42_i64)
            .with_field("evt.failed", true);
        let payload = build_payload(&event, &fields_config());

        let dynamic: Vec<&str> = labels(&payload)
            .into_iter()
            .take(event.output_fields.len())
            .collect();
        assert_eq!(
            dynamic,
            vec!["Zeta", "container.id", "evt.failed", "evt.num", "ka.verb", "user.name"]
        );
        assert!(dynamic.windows(2).all(|w| w[0] < w[1]));

        let num = payload.rows().find(|kv| kv.top_label == "evt.num").unwrap();
        assert_eq!(num.content, "42");
        let failed = payload.rows().find(|kv| kv.top_label == "evt.failed").unwrap();
        assert_eq!(failed.content, "true");
    }

    #[test]
    fn test_large_unsigned_field_keeps_digits() {
        let event = scenario_event().with_field("evt.num", u64::MAX);
        let payload = build_payload(&event, &fields_config());

        let num = payload.rows().find(|kv| kv.top_label == "evt.num").unwrap();
        assert_eq!(num.content, "18446744073709551615");
    }

    #[test]
    fn test_fields_mode_keeps_template_text() {
        let config = fields_config().with_template(MessageTemplate::compile("{{priority}} {{rule}}").unwrap());
        let payload = build_payload(&scenario_event(), &config);

        assert_eq!(payload.text, "Warning r1");
        assert_eq!(payload.rows().count(), 6);
    }

    #[test]
    fn test_template_failure_degrades_to_empty_text() {
        let config = fields_config().with_template(MessageTemplate::compile("{{missing.field}}").unwrap());
        let payload = build_payload(&scenario_event(), &config);

        assert_eq!(payload.text, "");
        assert_eq!(payload.rows().count(), 6);

        let payload = build_payload(&scenario_event(), &text_config("{{missing}}"));
        assert_eq!(payload, GoogleChatPayload::default());
    }

    #[test]
    fn test_build_is_deterministic() {
        let event = scenario_event()
            .with_hostname("node-1")
            .with_tags(["a", "b"])
            .with_field("n", FieldValue::Float(0.5));
        let config = fields_config().with_template(MessageTemplate::compile("{{rule}}").unwrap());

        assert_eq!(build_payload(&event, &config), build_payload(&event, &config));
    }

    #[test]
    fn test_serialized_shape() {
        let payload = build_payload(&AlertEvent::new("r1", Priority::Critical, "syscall", t0()), &fields_config());
        let json = serde_json::to_value(&payload).unwrap();

        assert!(json.get("text").is_none());
        assert_eq!(
            json["cards"][0]["sections"][0]["widgets"][0],
            serde_json::json!({"keyValue": {"topLabel": "rule", "content": "r1"}})
        );
        assert_eq!(json["cards"][0].as_object().unwrap().len(), 1);

        let json = serde_json::to_value(build_payload(
            &scenario_event(),
            &text_config("ALERT {{rule}}"),
        ))
        .unwrap();
        assert_eq!(json, serde_json::json!({"text": "ALERT r1"}));
    }

    #[test]
    fn test_time_row_uses_chrono_display() {
        let time = t0() + chrono::Duration::milliseconds(120);
        let payload = build_payload(&AlertEvent::new("r1", Priority::Notice, "syscall", time), &fields_config());

        assert_eq!(
            payload.rows().last().map(|row| row.content.as_str()),
            Some("2024-05-01 12:00:00.120 UTC")
        );
    }
}
