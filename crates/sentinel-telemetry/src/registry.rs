//! Per-orchestrator metrics registry

use prometheus::core::Collector;
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

use crate::error::{MetricError, MetricResult};

/// Prometheus registry owned by one orchestrator instance.
///
/// Clones share the same underlying registry.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `collector` and hand back the handle used to update it
    pub fn register<C>(&self, collector: C) -> MetricResult<C>
    where
        C: Collector + Clone + 'static,
    {
        let name = collector
            .desc()
            .first()
            .map(|desc| desc.fq_name.clone())
            .unwrap_or_default();
        self.registry
            .register(Box::new(collector.clone()))
            .map_err(|source| MetricError::Registration { name, source })?;
        Ok(collector)
    }

    /// Text exposition format, as served on `/metrics`
    pub fn render(&self) -> MetricResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricError::Render(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricError::Render(e.to_string()))
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry").finish_non_exhaustive()
    }
}
