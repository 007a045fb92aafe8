//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for both services.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::queue::StartOffset;

/// Root configuration shared by the producer and consumer services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Message bus connection and topic.
    pub broker: BrokerConfig,

    /// Producer service settings.
    pub producer: ProducerConfig,

    /// Consumer service settings.
    pub consumer: ConsumerConfig,

    /// Logging, metrics and tracing settings.
    pub observability: ObservabilityConfig,
}

/// Which transport carries the messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// In-process broker, only meaningful when both services share a process.
    Memory,
    /// Kafka cluster (requires the `kafka` feature).
    Kafka,
}

/// Message bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub kind: BrokerKind,

    /// Comma-separated bootstrap servers (e.g., "kafka:9092").
    pub brokers: String,

    /// Topic shared by both services.
    pub topic: String,

    /// Upper bound the transport client applies to a single publish.
    pub publish_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            kind: BrokerKind::Kafka,
            brokers: "kafka:9092".to_string(),
            topic: "trace-events".to_string(),
            publish_timeout_ms: 5000,
        }
    }
}

/// Producer service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Service name used in responses, spans and the `source` marker.
    pub service_name: String,

    /// HTTP bind address (e.g., "0.0.0.0:8002").
    pub bind_address: String,

    /// Inbound request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            service_name: "event-producer".to_string(),
            bind_address: "0.0.0.0:8002".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Consumer service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Service name used in responses, spans and as processor identity.
    pub service_name: String,

    /// HTTP bind address for the stats endpoint.
    pub bind_address: String,

    /// Inbound request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Consumer group id.
    pub group_id: String,

    /// Start position for a group with no committed offset.
    pub start_offset: StartOffset,

    /// Pause after a failed fetch, in milliseconds.
    pub fetch_backoff_ms: u64,

    /// Fixed part of the simulated work delay, in milliseconds.
    pub simulated_work_base_ms: u64,

    /// Window for the offset-dependent part of the delay (0 disables it).
    pub simulated_work_window_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            service_name: "event-consumer".to_string(),
            bind_address: "0.0.0.0:8003".to_string(),
            request_timeout_secs: 30,
            group_id: "event-consumer-group".to_string(),
            start_offset: StartOffset::Latest,
            fetch_backoff_ms: 1000,
            simulated_work_base_ms: 100,
            simulated_work_window_ms: 200,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// OTLP gRPC collector endpoint (e.g., "http://otel-collector:4317").
    pub otlp_endpoint: Option<String>,

    /// Reported as `service.namespace` on the trace resource.
    pub service_namespace: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
            otlp_endpoint: None,
            service_namespace: "tracebridge".to_string(),
        }
    }
}
