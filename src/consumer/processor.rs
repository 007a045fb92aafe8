//! The consumer processing loop.
//!
//! Each iteration runs `fetch → extract context → consumer.process span →
//! decode → pipeline → metrics → commit`. The loop only exits when its
//! cancellation token fires, and that is only observed while waiting for a
//! fetch (or a fetch backoff), never mid-pipeline.

use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer, TracerProvider};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::ConsumerConfig;
use crate::consumer::pipeline;
use crate::consumer::stats::ProcessingStats;
use crate::observability::correlation_ids;
use crate::observability::metrics;
use crate::propagation::Propagation;
use crate::queue::{MessageEnvelope, MessageSource, QueueMessage};

const TRACER_NAME: &str = "tracebridge.consumer";

/// Sequential fetch/process/commit loop over one subscription.
pub struct ConsumerLoop {
    source: Arc<dyn MessageSource>,
    stats: Arc<ProcessingStats>,
    provider: SdkTracerProvider,
    propagation: Propagation,
    topic: String,
    service_name: String,
    fetch_backoff: Duration,
    work_base_ms: u64,
    work_window_ms: u64,
}

impl ConsumerLoop {
    pub fn new(
        source: Arc<dyn MessageSource>,
        stats: Arc<ProcessingStats>,
        provider: SdkTracerProvider,
        topic: impl Into<String>,
        config: &ConsumerConfig,
    ) -> Self {
        Self {
            source,
            stats,
            provider,
            propagation: Propagation::new(),
            topic: topic.into(),
            service_name: config.service_name.clone(),
            fetch_backoff: Duration::from_millis(config.fetch_backoff_ms),
            work_base_ms: config.simulated_work_base_ms,
            work_window_ms: config.simulated_work_window_ms,
        }
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            service = %self.service_name,
            topic = %self.topic,
            system = self.source.system(),
            "Consumer loop started"
        );

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                fetched = self.source.fetch() => fetched,
            };

            let message = match fetched {
                Ok(message) => message,
                Err(e) => {
                    metrics::record_fetch_error();
                    tracing::error!(
                        error = %e,
                        backoff_ms = self.fetch_backoff.as_millis() as u64,
                        "Failed to fetch message"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.fetch_backoff) => continue,
                    }
                }
            };

            self.process(&message).await;
            self.commit(&message).await;
        }

        tracing::info!(service = %self.service_name, "Consumer loop cancelled");
    }

    async fn process(&self, message: &QueueMessage) {
        let start = Instant::now();

        let extracted = self.propagation.extract(&message.headers);
        let has_parent = extracted.is_some();
        let parent = extracted.unwrap_or_default();

        let tracer = self.provider.tracer(TRACER_NAME);
        let span = tracer
            .span_builder("consumer.process")
            .with_kind(SpanKind::Consumer)
            .with_attributes([
                KeyValue::new("messaging.system", self.source.system()),
                KeyValue::new("messaging.destination", self.topic.clone()),
                KeyValue::new("messaging.offset", message.offset),
                KeyValue::new("messaging.partition", message.partition as i64),
            ])
            .start_with_context(&tracer, &parent);
        let cx = parent.with_span(span);

        self.stats.record_received();

        let (trace_id, span_id) = correlation_ids(&cx);
        tracing::info!(
            trace_id = %trace_id,
            span_id = %span_id,
            offset = message.offset,
            partition = message.partition,
            propagated = has_parent,
            "Received message"
        );

        let envelope = match MessageEnvelope::from_bytes(&message.value) {
            Ok(envelope) => envelope,
            Err(e) => {
                metrics::record_decode_error();
                tracing::error!(
                    trace_id = %trace_id,
                    span_id = %span_id,
                    offset = message.offset,
                    error = %e,
                    "Failed to decode message, dropping"
                );
                let span = cx.span();
                span.record_error(&e);
                span.set_status(Status::error("Failed to decode message"));
                span.end();
                return;
            }
        };

        cx.span().set_attributes([
            KeyValue::new("message.trace_id", envelope.trace_id.clone()),
            KeyValue::new("message.source", envelope.source.clone()),
            KeyValue::new("message.timestamp", envelope.timestamp),
        ]);

        if let Some(delay) = self.simulated_work(message.offset) {
            tokio::time::sleep(delay).await;
        }

        self.run_pipeline(&cx, &envelope);

        metrics::record_processed(&envelope.source);
        metrics::record_processing_duration(start);
        self.stats.record_processed();

        tracing::info!(
            trace_id = %trace_id,
            span_id = %span_id,
            correlation_id = %envelope.trace_id,
            source = %envelope.source,
            duration_ms = start.elapsed().as_millis() as u64,
            "Message processed"
        );

        let span = cx.span();
        span.set_status(Status::Ok);
        span.end();
    }

    fn run_pipeline(&self, parent: &Context, envelope: &MessageEnvelope) {
        let tracer = self.provider.tracer(TRACER_NAME);

        let span = tracer.start_with_context("consumer.transform", parent);
        let transform_cx = parent.with_span(span);
        let record = pipeline::transform(envelope, &self.service_name);
        let (trace_id, span_id) = correlation_ids(&transform_cx);
        tracing::debug!(
            trace_id = %trace_id,
            span_id = %span_id,
            correlation_id = %record.trace_id,
            processed_at = record.processed_at,
            "Message transformed"
        );
        transform_cx.span().end();

        let span = tracer.start_with_context("consumer.validate", parent);
        let validate_cx = parent.with_span(span);
        let passed = pipeline::validate(envelope);
        let span = validate_cx.span();
        span.set_attribute(KeyValue::new("validation.passed", passed));
        if !passed {
            let (trace_id, span_id) = correlation_ids(&validate_cx);
            tracing::warn!(
                trace_id = %trace_id,
                span_id = %span_id,
                correlation_id = %envelope.trace_id,
                "Message failed validation"
            );
        }
        span.end();
    }

    async fn commit(&self, message: &QueueMessage) {
        if let Err(e) = self.source.commit(message).await {
            metrics::record_commit_error();
            tracing::error!(
                offset = message.offset,
                partition = message.partition,
                error = %e,
                "Failed to commit offset"
            );
        }
    }

    fn simulated_work(&self, offset: i64) -> Option<Duration> {
        let variable = if self.work_window_ms == 0 {
            0
        } else {
            offset.rem_euclid(self.work_window_ms as i64) as u64
        };
        let total = self.work_base_ms + variable;
        (total > 0).then(|| Duration::from_millis(total))
    }
}
