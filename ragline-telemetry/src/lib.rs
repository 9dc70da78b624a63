//! # ragline-telemetry
//!
//! Logging setup shared by the ragline binaries, plus an in-memory layer for
//! asserting on spans and events in tests.
//!
//! ```rust,no_run
//! ragline_telemetry::init_telemetry("info").ok();
//! tracing::info!(collection = "docs", "ready");
//! ```

pub mod memory;

pub use memory::{CaptureLayer, CapturedEvent, CapturedSpan, CapturedSpans};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, one line per event.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. `"info"` or
/// `"ragline_rag=debug"`) is used. Fails if a global subscriber already exists.
pub fn init_telemetry(default_level: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };
    install(filter, LogFormat::Compact)
}

/// Install a subscriber with an explicit filter directive, ignoring `RUST_LOG`.
pub fn init_with_filter(filter: &str, format: LogFormat) -> Result<(), TelemetryError> {
    install(EnvFilter::try_new(filter)?, format)
}

fn install(filter: EnvFilter, format: LogFormat) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }
    Ok(())
}
