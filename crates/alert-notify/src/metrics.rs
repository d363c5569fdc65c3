//! External, labeled delivery metrics.
//!
//! Sinks are incremented from detached tasks by the dispatcher, so an
//! implementation must be cheap, thread-safe, and must not assume it runs
//! before `dispatch` returns.

use prometheus::{IntCounterVec, Opts, Registry};
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::warn;

/// Outcome of a delivery as seen by metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Ok,
    Error,
}

impl DeliveryStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label set for one increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputLabels {
    pub destination: &'static str,
    pub status: DeliveryStatus,
}

impl OutputLabels {
    #[must_use]
    pub const fn new(destination: &'static str, status: DeliveryStatus) -> Self {
        Self {
            destination,
            status,
        }
    }
}

/// A labeled counter registry.
pub trait MetricsSink: Send + Sync {
    /// Get the name of this sink.
    fn name(&self) -> &'static str;

    /// Increment the counter for a label set by one.
    fn increment(&self, labels: &OutputLabels);
}

/// Prometheus counter `<namespace>_outputs{destination, status}`.
#[derive(Debug, Clone)]
pub struct PrometheusMetrics {
    outputs: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create the counter and register it on `registry`.
    ///
    /// # Errors
    /// Returns an error if a collector with the same name is already
    /// registered.
    pub fn register(registry: &Registry, namespace: &str) -> prometheus::Result<Self> {
        let outputs = IntCounterVec::new(
            Opts::new("outputs", "Alert deliveries per destination and status")
                .namespace(namespace),
            &["destination", "status"],
        )?;
        registry.register(Box::new(outputs.clone()))?;

        Ok(Self { outputs })
    }

    /// Current value for a label set.
    #[must_use]
    pub fn get(&self, labels: &OutputLabels) -> u64 {
        self.outputs
            .with_label_values(&[labels.destination, labels.status.as_str()])
            .get()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn name(&self) -> &'static str {
        "prometheus"
    }

    fn increment(&self, labels: &OutputLabels) {
        self.outputs
            .with_label_values(&[labels.destination, labels.status.as_str()])
            .inc();
    }
}

/// DogStatsD counter `<prefix>outputs` tagged `output:<destination>` and
/// `status:<status>`, sent as one UDP datagram per increment.
#[derive(Debug)]
pub struct StatsdMetrics {
    socket: UdpSocket,
    prefix: String,
}

impl StatsdMetrics {
    /// Open a non-blocking socket connected to the agent at `addr`.
    ///
    /// # Errors
    /// Returns an error if `addr` does not resolve or the socket cannot be
    /// bound.
    pub fn connect(addr: impl ToSocketAddrs, prefix: impl Into<String>) -> io::Result<Self> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "statsd address did not resolve")
        })?;
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(addr)?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            socket,
            prefix: prefix.into(),
        })
    }

    fn line(&self, labels: &OutputLabels) -> String {
        format!(
            "{}outputs:1|c|#output:{},status:{}",
            self.prefix, labels.destination, labels.status
        )
    }
}

impl MetricsSink for StatsdMetrics {
    fn name(&self) -> &'static str {
        "statsd"
    }

    fn increment(&self, labels: &OutputLabels) {
        if let Err(e) = self.socket.send(self.line(labels).as_bytes()) {
            warn!(sink = "statsd", error = %e, "Failed to send metric");
        }
    }
}
