//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider for a service
//! - Export spans over OTLP when the `otlp` feature and an endpoint are set
//! - Expose trace/span ids of an explicit `Context` for log correlation
//!
//! # Design Decisions
//! - No global provider: services receive the provider at construction
//! - Without an exporter spans are still created, so ids and propagation work

use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use thiserror::Error;

use crate::config::ObservabilityConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("span exporter: {0}")]
    Exporter(String),
}

/// Build the tracer provider for `service_name`.
pub fn init_tracer_provider(
    service_name: &str,
    config: &ObservabilityConfig,
) -> Result<SdkTracerProvider, TelemetryError> {
    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attribute(KeyValue::new("service.namespace", config.service_namespace.clone()))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build();

    #[allow(unused_mut)]
    let mut builder = SdkTracerProvider::builder().with_resource(resource);

    match config.otlp_endpoint.as_deref() {
        #[cfg(feature = "otlp")]
        Some(endpoint) => {
            use opentelemetry_otlp::WithExportConfig;

            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.to_string())
                .build()
                .map_err(|e| TelemetryError::Exporter(e.to_string()))?;
            builder = builder.with_batch_exporter(exporter);

            tracing::info!(endpoint = %endpoint, service = %service_name, "OTLP span export enabled");
        }
        #[cfg(not(feature = "otlp"))]
        Some(endpoint) => {
            tracing::warn!(
                endpoint = %endpoint,
                "Collector endpoint configured but built without the otlp feature; spans are not exported"
            );
        }
        None => {
            tracing::debug!(service = %service_name, "No collector endpoint; spans are not exported");
        }
    }

    Ok(builder.build())
}

/// Hex trace and span ids of the span active in `cx`.
///
/// Both are all-zero for a root context with no span.
pub fn correlation_ids(cx: &Context) -> (String, String) {
    let span = cx.span();
    let span_context = span.span_context();
    (
        span_context.trace_id().to_string(),
        span_context.span_id().to_string(),
    )
}
