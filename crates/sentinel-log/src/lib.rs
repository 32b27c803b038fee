//! Logging setup for sentinel binaries.
//!
//! Library crates only emit events through `tracing`; each binary calls
//! [`init`] once at startup to install a subscriber.

pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither a directive nor `RUST_LOG` is given
pub const DEFAULT_FILTER: &str = "info";

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Output flavour of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event on stdout, for the long-running server
    Json,
    /// Single-line human output on stderr, keeping stdout free for
    /// command results
    Compact,
}

/// Pick the filter: an explicit directive wins over `RUST_LOG`, which wins
/// over [`DEFAULT_FILTER`]. A malformed explicit directive is an error.
pub fn resolve_filter(directive: Option<&str>) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(format: LogFormat, directive: Option<&str>) -> InitResult {
    let filter = resolve_filter(directive)?;
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init()?,
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?,
    }
    Ok(())
}
