//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define breaker metrics (state, transitions, rejections, failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `spoolguard_breaker_state` (gauge): 0=closed, 1=open, 2=damaged
//! - `spoolguard_breaker_transitions_total` (counter): by breaker, target state
//! - `spoolguard_breaker_rejections_total` (counter): fail-fast rejections
//! - `spoolguard_breaker_failures_total` (counter): by breaker, failure class
//! - `spoolguard_notifications_total` (counter): by topic, severity
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users and
//!   tests pay nothing

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::breaker::CircuitStatus;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_breaker_state(breaker: &str, status: CircuitStatus) {
    gauge!("spoolguard_breaker_state", "breaker" => breaker.to_string()).set(status.as_gauge());
}

pub fn record_transition(breaker: &str, to: CircuitStatus) {
    counter!(
        "spoolguard_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
    record_breaker_state(breaker, to);
}

pub fn record_rejection(breaker: &str) {
    counter!("spoolguard_breaker_rejections_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_failure(breaker: &str, class: &'static str) {
    counter!(
        "spoolguard_breaker_failures_total",
        "breaker" => breaker.to_string(),
        "class" => class
    )
    .increment(1);
}

pub fn record_notification(topic: &'static str, severity: &'static str) {
    counter!(
        "spoolguard_notifications_total",
        "topic" => topic,
        "severity" => severity
    )
    .increment(1);
}
