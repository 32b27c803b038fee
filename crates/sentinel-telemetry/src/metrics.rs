//! Signature collection metrics.

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts};

use crate::registry::MetricsRegistry;
use crate::error::MetricResult;

/// How an execution request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The sink accepted the proposal
    Success,
    /// The sink reported an error; the proposal is still `Executed`
    SinkFailed,
    /// Rejected before reaching the sink
    Rejected,
}

impl ExecutionOutcome {
    fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::SinkFailed => "sink_failed",
            Self::Rejected => "rejected",
        }
    }
}

/// Counters and gauges updated by the orchestrator
#[derive(Clone, Debug)]
pub struct QuorumMetrics {
    proposals_created: IntCounter,
    signatures_accepted: IntCounter,
    signatures_rejected: IntCounterVec,
    executions: IntCounterVec,
    open_proposals: IntGauge,
}

impl QuorumMetrics {
    /// Create the metrics and register them with `registry`
    pub fn register(registry: &MetricsRegistry) -> MetricResult<Self> {
        let proposals_created = registry.register(IntCounter::new(
            "sentinel_proposals_created_total",
            "Total number of proposals registered",
        )?)?;
        let signatures_accepted = registry.register(IntCounter::new(
            "sentinel_signatures_accepted_total",
            "Total number of signatures accepted",
        )?)?;
        let signatures_rejected = registry.register(IntCounterVec::new(
            Opts::new(
                "sentinel_signatures_rejected_total",
                "Total number of signatures rejected, by reason",
            ),
            &["reason"],
        )?)?;
        let executions = registry.register(IntCounterVec::new(
            Opts::new("sentinel_executions_total", "Execution requests, by outcome"),
            &["outcome"],
        )?)?;
        let open_proposals = registry.register(IntGauge::new(
            "sentinel_open_proposals",
            "Proposals registered but not yet executed",
        )?)?;

        Ok(Self {
            proposals_created,
            signatures_accepted,
            signatures_rejected,
            executions,
            open_proposals,
        })
    }

    pub fn proposal_created(&self) {
        self.proposals_created.inc();
        self.open_proposals.inc();
    }

    pub fn signature_accepted(&self) {
        self.signatures_accepted.inc();
    }

    /// `reason` is a short snake_case label such as `duplicate_signer`
    pub fn signature_rejected(&self, reason: &str) {
        self.signatures_rejected.with_label_values(&[reason]).inc();
    }

    pub fn execution(&self, outcome: ExecutionOutcome) {
        self.executions.with_label_values(&[outcome.label()]).inc();
        if outcome != ExecutionOutcome::Rejected {
            self.open_proposals.dec();
        }
    }

    pub fn open_proposals(&self) -> i64 {
        self.open_proposals.get()
    }
}
