//! Metrics collection and exposition.
//!
//! # Metrics
//! - `producer_messages_total` (counter): enqueue attempts by operation, status
//! - `producer_publish_duration_seconds` (histogram): publish latency by topic, status
//! - `consumer_messages_processed_total` (counter): processed messages by source, status
//! - `consumer_processing_duration_seconds` (histogram): whole process-span wall time
//! - `consumer_fetch_errors_total`, `consumer_commit_errors_total`,
//!   `consumer_decode_errors_total` (counters): operational failures
//!
//! # Design Decisions
//! - `metrics` facade; without an installed recorder every call is a no-op
//! - Prometheus exposition via `metrics-exporter-prometheus`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Outcome label values.
pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_enqueue(status: &'static str) {
    counter!("producer_messages_total", "operation" => "enqueue", "status" => status).increment(1);
}

pub fn record_publish_duration(topic: &str, status: &'static str, start: Instant) {
    histogram!(
        "producer_publish_duration_seconds",
        "operation" => "publish",
        "topic" => topic.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_processed(source: &str) {
    counter!(
        "consumer_messages_processed_total",
        "source" => source.to_string(),
        "status" => STATUS_SUCCESS
    )
    .increment(1);
}

pub fn record_processing_duration(start: Instant) {
    histogram!("consumer_processing_duration_seconds", "operation" => "process_message")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_fetch_error() {
    counter!("consumer_fetch_errors_total").increment(1);
}

pub fn record_commit_error() {
    counter!("consumer_commit_errors_total").increment(1);
}

pub fn record_decode_error() {
    counter!("consumer_decode_errors_total").increment(1);
}
