//! Enqueue path: request → traced publish.

use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer, TracerProvider};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracerProvider;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{EnqueueError, RequestError};
use crate::observability::correlation_ids;
use crate::observability::metrics;
use crate::propagation::Propagation;
use crate::queue::{Delivery, HeaderBag, MessageEnvelope, MessagePublisher, OutboundMessage};

/// Header naming the publishing service.
pub const SOURCE_HEADER: &str = "source";

const TRACER_NAME: &str = "tracebridge.producer";

/// Body of `POST /enqueue`.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    pub message: String,
    #[serde(default)]
    pub trace_id: String,
}

impl EnqueueRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.message.is_empty() {
            return Err(RequestError::EmptyMessage);
        }
        Ok(())
    }
}

/// What the broker acknowledged for one enqueue.
#[derive(Debug, Clone)]
pub struct EnqueueReceipt {
    pub trace_id: String,
    pub delivery: Delivery,
    pub payload_size: usize,
}

/// Builds, traces and publishes messages for the producer service.
pub struct Enqueuer {
    publisher: Arc<dyn MessagePublisher>,
    propagation: Propagation,
    provider: SdkTracerProvider,
    topic: String,
    service_name: String,
}

impl Enqueuer {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        provider: SdkTracerProvider,
        topic: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            propagation: Propagation::new(),
            provider,
            topic: topic.into(),
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn propagation(&self) -> &Propagation {
        &self.propagation
    }

    /// Publish `request` as a child of `parent`.
    ///
    /// `request` must already be validated. A root `parent` makes the
    /// enqueue span a trace root.
    pub async fn enqueue(
        &self,
        parent: &Context,
        request: &EnqueueRequest,
    ) -> Result<EnqueueReceipt, EnqueueError> {
        let tracer = self.provider.tracer(TRACER_NAME);
        let span = tracer
            .span_builder("producer.enqueue")
            .with_kind(SpanKind::Server)
            .with_attributes([
                KeyValue::new("message.trace_id", request.trace_id.clone()),
                KeyValue::new("message.length", request.message.len() as i64),
            ])
            .start_with_context(&tracer, parent);
        let cx = parent.with_span(span);

        let (trace_id, span_id) = correlation_ids(&cx);
        tracing::info!(
            trace_id = %trace_id,
            span_id = %span_id,
            correlation_id = %request.trace_id,
            "Received enqueue request"
        );

        let result = self.publish(&cx, request).await;

        let span = cx.span();
        match &result {
            Ok(_) => {
                metrics::record_enqueue(metrics::STATUS_SUCCESS);
                span.set_status(Status::Ok);
            }
            Err(e) => {
                metrics::record_enqueue(metrics::STATUS_ERROR);
                span.record_error(e);
                span.set_status(Status::error(e.public_message()));
            }
        }
        span.end();

        result
    }

    async fn publish(
        &self,
        parent: &Context,
        request: &EnqueueRequest,
    ) -> Result<EnqueueReceipt, EnqueueError> {
        let start = Instant::now();
        let (trace_id, span_id) = correlation_ids(parent);

        let envelope = MessageEnvelope::new(&request.message, &request.trace_id, &self.service_name);
        let payload = match envelope.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    trace_id = %trace_id,
                    span_id = %span_id,
                    correlation_id = %request.trace_id,
                    error = %e,
                    "Failed to encode message"
                );
                metrics::record_publish_duration(&self.topic, metrics::STATUS_ERROR, start);
                return Err(e.into());
            }
        };
        let payload_size = payload.len();

        let tracer = self.provider.tracer(TRACER_NAME);
        let span = tracer
            .span_builder("producer.publish")
            .with_kind(SpanKind::Producer)
            .with_attributes([
                KeyValue::new("messaging.system", self.publisher.system()),
                KeyValue::new("messaging.destination", self.topic.clone()),
                KeyValue::new("messaging.operation", "publish"),
            ])
            .start_with_context(&tracer, parent);
        let publish_cx = parent.with_span(span);

        let mut headers = HeaderBag::new();
        headers.set(SOURCE_HEADER, self.service_name.as_bytes());
        self.propagation.inject(&publish_cx, &mut headers);

        let message = OutboundMessage {
            topic: self.topic.clone(),
            key: request.trace_id.as_bytes().to_vec(),
            value: payload,
            headers,
        };

        let (_, publish_span_id) = correlation_ids(&publish_cx);
        tracing::info!(
            trace_id = %trace_id,
            span_id = %publish_span_id,
            correlation_id = %request.trace_id,
            topic = %self.topic,
            "Publishing message"
        );

        let outcome = self.publisher.publish(message).await;

        let span = publish_cx.span();
        let result = match outcome {
            Ok(delivery) => {
                span.set_attributes([
                    KeyValue::new("messaging.success", true),
                    KeyValue::new("messaging.message_size", payload_size as i64),
                    KeyValue::new("messaging.partition", delivery.partition as i64),
                    KeyValue::new("messaging.offset", delivery.offset),
                ]);
                span.set_status(Status::Ok);
                metrics::record_publish_duration(&self.topic, metrics::STATUS_SUCCESS, start);

                tracing::info!(
                    trace_id = %trace_id,
                    span_id = %publish_span_id,
                    correlation_id = %request.trace_id,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Message published"
                );

                Ok(EnqueueReceipt {
                    trace_id: request.trace_id.clone(),
                    delivery,
                    payload_size,
                })
            }
            Err(e) => {
                span.record_error(&e);
                span.set_attribute(KeyValue::new("messaging.success", false));
                span.set_status(Status::error("Failed to publish message"));
                metrics::record_publish_duration(&self.topic, metrics::STATUS_ERROR, start);

                tracing::error!(
                    trace_id = %trace_id,
                    span_id = %publish_span_id,
                    correlation_id = %request.trace_id,
                    error = %e,
                    "Failed to publish message"
                );

                Err(e.into())
            }
        };
        span.end();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_message() {
        let request = EnqueueRequest {
            message: String::new(),
            trace_id: "x".into(),
        };
        assert_eq!(request.validate(), Err(RequestError::EmptyMessage));
    }

    #[test]
    fn test_trace_id_is_optional() {
        let request: EnqueueRequest = serde_json::from_str(r#"{"message":"hello"}"#).unwrap();
        assert_eq!(request.trace_id, "");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_message_is_required() {
        assert!(serde_json::from_str::<EnqueueRequest>(r#"{"trace_id":"abc"}"#).is_err());
    }
}
