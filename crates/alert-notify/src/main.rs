//! Send one alert event to Google Chat.
//!
//! Reads the event as JSON from a file or stdin, dispatches it, then prints
//! the delivery counters.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alert_notify::config::{
    ENV_MESSAGE_FORMAT, ENV_OUTPUT_FORMAT, ENV_STATSD_ADDR, ENV_TIMEOUT_SECS, ENV_WEBHOOK_URL,
};
use alert_notify::{
    AlertEvent, Dispatcher, GoogleChatSettings, OutputFormat, OutputStats, PrometheusMetrics,
    StatsdMetrics,
};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "alert-notify", version, about = "Send a security alert to Google Chat")]
struct Cli {
    /// Path to the alert event JSON, or `-` for stdin
    #[arg(default_value = "-")]
    event: PathBuf,

    /// Google Chat incoming webhook URL
    #[arg(long, env = ENV_WEBHOOK_URL)]
    webhook_url: Option<String>,

    /// `text` or `fields`
    #[arg(long, env = ENV_OUTPUT_FORMAT, default_value = "fields")]
    output_format: OutputFormat,

    /// Handlebars template for the message text
    #[arg(long, env = ENV_MESSAGE_FORMAT)]
    message_format: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS, default_value_t = 10)]
    timeout_secs: u64,

    /// DogStatsD `host:port` that also receives delivery counts
    #[arg(long, env = ENV_STATSD_ADDR)]
    statsd_addr: Option<String>,

    /// Print the payload instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Print Prometheus metrics after dispatching
    #[arg(long)]
    print_metrics: bool,
}

impl Cli {
    fn settings(&self) -> Result<GoogleChatSettings> {
        let webhook_url = match (&self.webhook_url, self.dry_run) {
            (Some(url), _) => url.clone(),
            // Never contacted in dry-run mode
            (None, true) => "http://localhost/dry-run".to_string(),
            (None, false) => anyhow::bail!("{ENV_WEBHOOK_URL} or --webhook-url is required"),
        };

        Ok(GoogleChatSettings {
            webhook_url,
            output_format: self.output_format,
            message_format: self.message_format.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    fn read_event(&self) -> Result<AlertEvent> {
        let input = if self.event.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        } else {
            std::fs::read_to_string(&self.event)
                .with_context(|| format!("Failed to read event: {}", self.event.display()))?
        };

        AlertEvent::from_json(&input).context("Failed to decode alert event")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    let event = cli.read_event()?;

    let registry = prometheus::Registry::new();
    let metrics = PrometheusMetrics::register(&registry, "alert_notify")
        .context("Failed to register metrics")?;
    let stats = Arc::new(OutputStats::new());

    let mut dispatcher = Dispatcher::from_settings(&settings, Arc::clone(&stats))
        .context("Invalid Google Chat settings")?
        .with_metrics_sink(Arc::new(metrics));

    if let Some(addr) = &cli.statsd_addr {
        let statsd = StatsdMetrics::connect(addr.as_str(), "alert_notify.")
            .with_context(|| format!("Failed to set up statsd sink for {addr}"))?;
        dispatcher = dispatcher.with_metrics_sink(Arc::new(statsd));
    }

    if cli.dry_run {
        let payload = dispatcher.payload_for(&event);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    info!(rule = %event.rule, priority = %event.priority, "Dispatching alert");
    dispatcher.dispatch(&event).await;
    dispatcher.shutdown().await;

    println!("{}", serde_json::to_string(&stats.snapshot())?);

    if cli.print_metrics {
        use prometheus::Encoder;

        let mut buffer = vec![];
        prometheus::TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        print!("{}", String::from_utf8_lossy(&buffer));
    }

    Ok(())
}
