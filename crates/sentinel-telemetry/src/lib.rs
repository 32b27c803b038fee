//! Prometheus metrics for the orchestrator.
//!
//! Every [`MetricsRegistry`] owns its own Prometheus registry, so several
//! orchestrators (or tests) in one process never share counters.

pub mod error;
pub mod http;
pub mod metrics;
pub mod registry;

pub use http::metrics_router;
pub use metrics::{ExecutionOutcome, QuorumMetrics};
pub use registry::MetricsRegistry;
pub use error::{MetricError, MetricResult};
