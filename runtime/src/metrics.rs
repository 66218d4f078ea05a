//! Metrics emitted by the store and the HTTP wrapper.
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op. Call [`describe_metrics`] once after
//! installing a recorder to attach descriptions.

use metrics::{describe_counter, describe_histogram};
use std::time::Duration;

pub use metrics::{counter, histogram};

/// Actions accepted by the store
pub const COMMANDS_TOTAL: &str = "store.commands.total";
/// Actions rejected because the store is shutting down
pub const REJECTED_TOTAL: &str = "store.shutdown.rejected_actions";
/// Time spent inside the reducer
pub const REDUCER_DURATION: &str = "store.reducer.duration_seconds";
/// Effects returned per reduction
pub const EFFECTS_COUNT: &str = "store.effects.count";
/// Effects executed, labelled by `type`
pub const EFFECTS_EXECUTED: &str = "store.effects.executed";
/// Shutdown phases, labelled by `outcome`
pub const SHUTDOWN_TOTAL: &str = "store.shutdown.total";
/// HTTP requests, labelled by `method` and `outcome`
pub const API_REQUESTS_TOTAL: &str = "api.requests.total";
/// HTTP request latency, labelled by `method`
pub const API_REQUEST_DURATION: &str = "api.request.duration_seconds";

/// Register all metric descriptions.
pub fn describe_metrics() {
    describe_counter!(COMMANDS_TOTAL, "Total number of actions processed by the store");
    describe_counter!(
        REJECTED_TOTAL,
        "Total number of actions rejected during shutdown"
    );
    describe_histogram!(REDUCER_DURATION, "Time taken to execute the reducer");
    describe_histogram!(EFFECTS_COUNT, "Number of effects returned per action");
    describe_counter!(EFFECTS_EXECUTED, "Total number of effects executed");
    describe_counter!(SHUTDOWN_TOTAL, "Store shutdown phases");
    describe_counter!(API_REQUESTS_TOTAL, "Total number of HTTP requests sent");
    describe_histogram!(API_REQUEST_DURATION, "Time taken by HTTP requests");
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record an accepted action.
    pub fn record_command() {
        counter!(COMMANDS_TOTAL).increment(1);
    }

    /// Record an action rejected during shutdown.
    pub fn record_rejected() {
        counter!(REJECTED_TOTAL).increment(1);
    }

    /// Record one reducer run.
    pub fn record_reducer(duration: Duration, effects: usize) {
        histogram!(REDUCER_DURATION).record(duration.as_secs_f64());
        // Precision loss acceptable for effect counts
        #[allow(clippy::cast_precision_loss)]
        histogram!(EFFECTS_COUNT).record(effects as f64);
    }

    /// Record an executed effect.
    pub fn record_effect(kind: &'static str) {
        counter!(EFFECTS_EXECUTED, "type" => kind).increment(1);
    }

    /// Record a shutdown phase.
    pub fn record_shutdown(outcome: &'static str) {
        counter!(SHUTDOWN_TOTAL, "outcome" => outcome).increment(1);
    }
}

/// HTTP wrapper metrics recorder.
pub struct ApiMetrics;

impl ApiMetrics {
    /// Record a completed request; `outcome` is the status code or `"network"`.
    pub fn record_request(method: &'static str, outcome: String, duration: Duration) {
        counter!(API_REQUESTS_TOTAL, "method" => method, "outcome" => outcome).increment(1);
        histogram!(API_REQUEST_DURATION, "method" => method).record(duration.as_secs_f64());
    }
}
