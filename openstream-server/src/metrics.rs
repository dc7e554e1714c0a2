//! Prometheus exposition
//!
//! The recorder is process-global; install it once at startup and hand the
//! handle to [`AppState`](crate::AppState).

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use openstream_core::metrics::{HTTP_REQUEST_DURATION, describe};

use crate::ServerError;

/// Request-latency buckets in seconds.
const HTTP_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Install the global Prometheus recorder and describe all metrics.
pub fn install_recorder() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(HTTP_REQUEST_DURATION.to_string()), HTTP_BUCKETS)
        .map_err(|e| ServerError::Metrics(e.to_string()))?
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;
    describe();
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}
