//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events carrying trace_id/span_id)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (OpenTelemetry spans threaded as explicit Contexts)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Distributed tracing (OTLP collector, `otlp` feature)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace ids flow through log fields, not through thread-local state
//! - Metrics are cheap (atomic increments); no recorder means no-ops
//! - The tracer provider is built once and handed to each service

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::tracing::{correlation_ids, init_tracer_provider, TelemetryError};
