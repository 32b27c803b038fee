//! State shared by all handlers

use sentinel_quorum::Collector;
use sentinel_telemetry::{MetricsRegistry, QuorumMetrics};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    pub collector: Arc<Collector>,
    pub metrics: QuorumMetrics,
    pub registry: MetricsRegistry,
    next_nonce: AtomicU64,
}

impl AppState {
    pub fn new(collector: Arc<Collector>, registry: MetricsRegistry, metrics: QuorumMetrics) -> Self {
        Self {
            collector,
            metrics,
            registry,
            next_nonce: AtomicU64::new(0),
        }
    }

    /// Reserve the nonce for a new proposal
    pub fn allocate_nonce(&self) -> u64 {
        self.next_nonce.fetch_add(1, Ordering::SeqCst)
    }

    pub fn next_nonce(&self) -> u64 {
        self.next_nonce.load(Ordering::SeqCst)
    }
}
