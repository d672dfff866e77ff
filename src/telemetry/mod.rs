//! Prometheus metrics module
//!
//! Recording goes through the `metrics` facade, so pipeline code can record
//! unconditionally; without an installed recorder (unit tests) the calls are
//! no-ops. [`RelayMetrics`] owns the exporter handle used by `/metrics`.

use crate::error::RelayError;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;

/// Pipeline stages timed by `relay_stage_duration_seconds`
pub mod stages {
    pub const FETCH: &str = "fetch_object";
    pub const PUBLISH: &str = "publish";
    pub const INVOCATION: &str = "invocation";
}

/// Relay metrics exporter
#[derive(Clone)]
pub struct RelayMetrics {
    handle: Arc<PrometheusHandle>,
}

impl RelayMetrics {
    /// Install the global Prometheus recorder and return its handle
    pub fn install() -> Result<Self, RelayError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| RelayError::Telemetry(e.to_string()))?;

        Self::register_metrics();

        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    /// Register metric descriptions
    fn register_metrics() {
        describe_counter!(
            "relay_invocations_total",
            Unit::Count,
            "Total relay invocations by reported status"
        );
        describe_counter!(
            "relay_publish_entries_total",
            Unit::Count,
            "Per-message publish outcomes (success/failure)"
        );
        describe_counter!(
            "relay_errors_total",
            Unit::Count,
            "Fatal relay errors by error type"
        );
        describe_histogram!(
            "relay_stage_duration_seconds",
            Unit::Seconds,
            "Time spent in each pipeline stage"
        );
    }

    /// Render metrics in Prometheus format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Record a completed invocation
pub fn record_invocation(status: u16) {
    counter!("relay_invocations_total", "status" => status.to_string()).increment(1);
}

/// Record one per-entry publish outcome
pub fn record_publish_entry(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("relay_publish_entries_total", "outcome" => outcome).increment(1);
}

/// Record a fatal error
pub fn record_error(err: &RelayError) {
    counter!("relay_errors_total", "error_type" => err.error_type_label()).increment(1);
}

/// Record how long a pipeline stage took
pub fn record_stage_duration(stage: &'static str, duration: Duration) {
    histogram!("relay_stage_duration_seconds", "stage" => stage).record(duration.as_secs_f64());
}
