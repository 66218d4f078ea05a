//! Logging and metrics setup

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directives for `level`, scoped to the marketplace crates
#[must_use]
pub fn default_directives(level: &str) -> String {
    format!(
        "marketplace={level},marketplace_client={level},marketplace_runtime={level},marketplace_core={level}"
    )
}

/// Install the global tracing subscriber and describe the metrics
///
/// `RUST_LOG` wins over `level` when set.
///
/// # Errors
///
/// Returns [`TryInitError`] if a global subscriber is already installed.
pub fn init(level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    marketplace_runtime::metrics::describe_metrics();
    Ok(())
}
