//! # Structured Logging
//!
//! One `tracing` subscriber for the whole binary. The ledger in
//! `estate_contracts` logs accepted transitions at info and rejected calls at
//! warn; `tower_http` adds a span per HTTP request.
//!
//! Output goes to stderr. `simulate` prints its event log on stdout, so the
//! two never interleave.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "estate_node=info,estate_contracts=info,tower_http=debug";

/// Log output format, chosen with `--log-format` or `ESTATE_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines with source locations, for local runs.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// `RUST_LOG` when it parses, otherwise [`DEFAULT_FILTER`].
///
/// ```text
/// RUST_LOG=estate_node=debug,estate_contracts=trace
/// ```
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Call once, before the ledger is built;
/// a second call panics.
pub fn init_logging(format: LogFormat) {
    let pretty = (format == LogFormat::Pretty).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
    });
    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter())
        .with(pretty)
        .with(json)
        .init();

    tracing::debug!(?format, "logging initialized");
}
