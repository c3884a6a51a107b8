//! Tracing subscriber setup
//!
//! Filter comes from `RUST_LOG` when set, otherwise [`DEFAULT_FILTER`].

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

pub const DEFAULT_FILTER: &str = "student_records=debug,sqlx=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter());

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?,
    }

    tracing::debug!(?format, "Tracing initialized");
    Ok(())
}

/// Subscriber for tests: writes through the test harness capture, ignores
/// repeat installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}
