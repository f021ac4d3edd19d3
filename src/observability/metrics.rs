//! Metrics collection and exposition.
//!
//! # Metrics
//! - `policy_pilot_attempts_total` (counter): attempts by operation, outcome
//! - `policy_pilot_attempt_duration_seconds` (histogram): per-attempt latency
//! - `policy_pilot_exhausted_total` (counter): logical calls with no answer
//! - `policy_pilot_backend_health` (gauge): 1=healthy, 0=unhealthy, absent until settled
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

const ATTEMPTS_TOTAL: &str = "policy_pilot_attempts_total";
const ATTEMPT_DURATION: &str = "policy_pilot_attempt_duration_seconds";
const EXHAUSTED_TOTAL: &str = "policy_pilot_exhausted_total";
const BACKEND_HEALTH: &str = "policy_pilot_backend_health";

/// Buckets spanning fast local answers up to the longest chat timeout.
const ATTEMPT_BUCKETS: [f64; 10] = [0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0];

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(&ATTEMPT_BUCKETS)
        .map_err(|e| format!("Failed to configure histogram buckets: {}", e))?
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!(metrics_addr = %addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Record one settled attempt.
pub fn record_attempt(operation: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!(ATTEMPTS_TOTAL, "operation" => operation, "outcome" => outcome).increment(1);
    histogram!(ATTEMPT_DURATION, "operation" => operation).record(elapsed.as_secs_f64());
}

/// Record a logical call that fell through every candidate.
pub fn record_exhausted(operation: &'static str) {
    counter!(EXHAUSTED_TOTAL, "operation" => operation).increment(1);
}

/// Record the probe's view of a candidate.
pub fn record_backend_health(candidate: &str, healthy: bool) {
    gauge!(BACKEND_HEALTH, "candidate" => candidate.to_string()).set(if healthy { 1.0 } else { 0.0 });
}
