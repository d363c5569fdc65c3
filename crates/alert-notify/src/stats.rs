//! Local delivery counters for an output.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter kinds tracked per output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Every dispatch attempt
    Total,
    /// Deliveries accepted by the webhook
    Ok,
    /// Deliveries that failed
    Error,
}

/// Monotonic, lock-free counters shared across concurrent dispatches.
#[derive(Debug, Default)]
pub struct OutputStats {
    total: AtomicU64,
    ok: AtomicU64,
    error: AtomicU64,
}

impl OutputStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to a counter.
    pub fn add(&self, kind: StatKind, delta: u64) {
        self.counter(kind).fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value of a counter.
    #[must_use]
    pub fn get(&self, kind: StatKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.get(StatKind::Total),
            ok: self.get(StatKind::Ok),
            error: self.get(StatKind::Error),
        }
    }

    const fn counter(&self, kind: StatKind) -> &AtomicU64 {
        match kind {
            StatKind::Total => &self.total,
            StatKind::Ok => &self.ok,
            StatKind::Error => &self.error,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub ok: u64,
    pub error: u64,
}
