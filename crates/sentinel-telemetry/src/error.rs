use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricError {
    /// Metric options were rejected by prometheus (bad name or labels)
    #[error("invalid metric definition: {0}")]
    Definition(#[from] prometheus::Error),

    /// A collector with the same descriptor already lives in the registry
    #[error("metric {name} already registered: {source}")]
    Registration {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("failed to render metrics: {0}")]
    Render(String),
}

pub type MetricResult<T> = Result<T, MetricError>;
