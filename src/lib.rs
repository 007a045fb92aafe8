//! Trace-context propagation across an asynchronous message queue.
//!
//! A producer service accepts HTTP requests and publishes events whose
//! headers carry the W3C trace context of the publish span. A consumer
//! service resumes that context for every message it processes, so both
//! sides land in one distributed trace.

pub mod config;
pub mod consumer;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod producer;
pub mod propagation;
pub mod queue;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
