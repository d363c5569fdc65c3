//! Builds, sends and accounts for one alert at a time.

use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

use crate::config::{GoogleChatSettings, OutputConfig};
use crate::error::ConfigError;
use crate::events::AlertEvent;
use crate::metrics::{DeliveryStatus, MetricsSink, OutputLabels};
use crate::payload::{build_payload, GoogleChatPayload};
use crate::stats::{OutputStats, StatKind};
use crate::transport::{Transport, WebhookClient};
use crate::DESTINATION;

/// Google Chat output dispatcher.
///
/// Delivery is fire-and-forget: failures are counted and logged, never
/// returned, and a failed event is dropped. External metrics sinks are
/// updated from detached tasks that `dispatch` does not wait for; call
/// [`Dispatcher::shutdown`] to drain them before exiting.
pub struct Dispatcher {
    output: OutputConfig,
    transport: Arc<dyn Transport>,
    stats: Arc<OutputStats>,
    metrics: Vec<Arc<dyn MetricsSink>>,
    tasks: TaskTracker,
}

impl Dispatcher {
    /// Create a dispatcher with no external metrics sinks.
    #[must_use]
    pub fn new(output: OutputConfig, transport: Arc<dyn Transport>, stats: Arc<OutputStats>) -> Self {
        Self {
            output,
            transport,
            stats,
            metrics: vec![],
            tasks: TaskTracker::new(),
        }
    }

    /// Create a dispatcher posting to the configured webhook.
    ///
    /// # Errors
    /// Returns an error if the template does not compile or the HTTP
    /// client cannot be built.
    pub fn from_settings(
        settings: &GoogleChatSettings,
        stats: Arc<OutputStats>,
    ) -> Result<Self, ConfigError> {
        let output = settings.output_config()?;
        let transport = WebhookClient::new(settings.webhook_url.clone(), settings.timeout)?;

        debug!(
            destination = DESTINATION,
            output_format = %output.output_format,
            "Google Chat output initialized"
        );

        Ok(Self::new(output, Arc::new(transport), stats))
    }

    /// Add an external metrics sink.
    #[must_use]
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics.push(sink);
        self
    }

    /// Local counters shared with this dispatcher.
    #[must_use]
    pub fn stats(&self) -> &Arc<OutputStats> {
        &self.stats
    }

    /// Build the payload an event would be sent as, without sending it.
    #[must_use]
    pub fn payload_for(&self, event: &AlertEvent) -> GoogleChatPayload {
        build_payload(event, &self.output)
    }

    /// Deliver one event.
    ///
    /// Never fails from the caller's point of view: the outcome is visible
    /// only through the stats, the metrics sinks and the log.
    pub async fn dispatch(&self, event: &AlertEvent) {
        self.stats.add(StatKind::Total, 1);

        let payload = build_payload(event, &self.output);

        match self.transport.post(&payload).await {
            Ok(()) => {
                self.stats.add(StatKind::Ok, 1);
                self.count_metric(DeliveryStatus::Ok);
                debug!(destination = DESTINATION, rule = %event.rule, "Alert delivered");
            }
            Err(e) => {
                self.stats.add(StatKind::Error, 1);
                self.count_metric(DeliveryStatus::Error);
                error!(
                    destination = DESTINATION,
                    rule = %event.rule,
                    error = %e,
                    "Failed to deliver alert to Google Chat"
                );
            }
        }
    }

    /// Wait for every pending metrics update to finish.
    ///
    /// Dispatching after shutdown still works; its metric updates are
    /// simply not waited for by this call.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    fn count_metric(&self, status: DeliveryStatus) {
        let labels = OutputLabels::new(DESTINATION, status);

        for sink in &self.metrics {
            let sink = Arc::clone(sink);

            self.tasks.spawn(async move {
                sink.increment(&labels);
                debug!(sink = sink.name(), status = %labels.status, "Metric recorded");
            });
        }
    }
}
