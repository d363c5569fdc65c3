//! Message templates rendered into the payload's `text` field.
//!
//! Templates use Handlebars syntax and see the alert in its JSON form:
//!
//! ```text
//! {{priority}}: {{rule}} on {{hostname}} ({{output_fields.[proc.name]}})
//! ```
//!
//! Strict mode is on, so referencing a field the event does not carry is a
//! render error rather than silently empty output.

use handlebars::Handlebars;
use std::fmt;
use std::sync::Arc;

use crate::error::TemplateError;
use crate::events::AlertEvent;

const TEMPLATE_NAME: &str = "message";

/// A compiled message template, cheap to clone.
#[derive(Clone)]
pub struct MessageTemplate {
    registry: Arc<Handlebars<'static>>,
    source: String,
}

impl MessageTemplate {
    /// Compile a template from source.
    ///
    /// # Errors
    /// Returns [`TemplateError::Compile`] if the source is not valid Handlebars.
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Chat text is not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(TEMPLATE_NAME, source)?;

        Ok(Self {
            registry: Arc::new(handlebars),
            source: source.to_string(),
        })
    }

    /// Render the template against an event.
    ///
    /// # Errors
    /// Returns [`TemplateError::Render`] if rendering fails, e.g. on a
    /// missing variable.
    pub fn render(&self, event: &AlertEvent) -> Result<String, TemplateError> {
        Ok(self.registry.render(TEMPLATE_NAME, event)?)
    }
}

impl fmt::Debug for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageTemplate")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
