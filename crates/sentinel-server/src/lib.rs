//! Orchestrator HTTP server.
//!
//! Wraps a [`Collector`] in a REST API: proposals are registered with a
//! fresh nonce, signatures are verified and counted, and execution is
//! handed to an [`ExecutionSink`] once the quorum is met.

pub mod error;
pub mod executor;
pub mod health;
pub mod rest;
pub mod state;

use axum::Router;
use sentinel_quorum::{Collector, ExecutionSink, QuorumPolicy};
use sentinel_telemetry::{MetricError, MetricsRegistry, QuorumMetrics};
use sentinel_types::config::{Config, ServerConfig};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use executor::LoggingExecutor;
pub use rest::create_router;
pub use state::AppState;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Bind error
    #[error("failed to bind to address: {0}")]
    Bind(String),

    /// Serve error
    #[error("server error: {0}")]
    Serve(String),

    /// Quorum settings rejected
    #[error("invalid configuration: {0}")]
    Config(#[from] sentinel_errors::Error),

    #[error(transparent)]
    Metrics(#[from] MetricError),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// HTTP server for the orchestrator
pub struct OrchestratorServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl OrchestratorServer {
    /// Server whose execution sink only logs
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_sink(config, Arc::new(LoggingExecutor))
    }

    pub fn with_sink(config: &Config, sink: Arc<dyn ExecutionSink>) -> Result<Self> {
        let policy = QuorumPolicy::from_config(&config.quorum)?;
        if !policy.is_restricted() {
            warn!(
                total_signers = policy.total_signers(),
                "quorum.owners is empty; the first signers to submit take the seats"
            );
        }
        let registry = MetricsRegistry::new();
        let metrics = QuorumMetrics::register(&registry)?;
        let collector = Arc::new(Collector::new(policy, sink));

        Ok(Self {
            config: config.server.clone(),
            state: Arc::new(AppState::new(collector, registry, metrics)),
        })
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Build the router
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state), &self.config)
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let app = self.router();

        let listener = TcpListener::bind(&self.config.listen_address)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {e}", self.config.listen_address)))?;

        let policy = self.state.collector.policy();
        info!(
            address = %self.config.listen_address,
            threshold = policy.threshold(),
            total_signers = policy.total_signers(),
            "Orchestrator listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        info!("Orchestrator stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
