//! Producer and consumer services wired over one in-memory broker.

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracebridge::consumer::{ConsumerLoop, ProcessingStats};
use tracebridge::lifecycle::ConsumerHandle;
use tracebridge::queue::{HeaderBag, MemoryBroker, OutboundMessage, StartOffset};
use tracebridge::Shutdown;

mod common;
use common::{GROUP, TOPIC};

struct Lab {
    broker: MemoryBroker,
    stats: Arc<ProcessingStats>,
    producer: SocketAddr,
    consumer: SocketAddr,
    shutdown: Shutdown,
    handle: ConsumerHandle,
    recorder: common::SpanRecorder,
}

impl Lab {
    async fn start() -> Self {
        let recorder = common::SpanRecorder::new();
        let provider = recorder.provider();
        let broker = MemoryBroker::new();
        let shutdown = Shutdown::new();
        let stats = Arc::new(ProcessingStats::new());

        let source = broker.subscribe(TOPIC, GROUP, StartOffset::Latest);
        let consumer_loop = ConsumerLoop::new(
            Arc::new(source),
            stats.clone(),
            provider.clone(),
            TOPIC,
            &common::fast_consumer_config(),
        );
        let handle = ConsumerHandle::spawn(consumer_loop.run(shutdown.token()), shutdown.clone());

        let producer =
            common::spawn_producer(Arc::new(broker.publisher()), provider, shutdown.clone()).await;
        let consumer = common::spawn_consumer_http(stats.clone(), shutdown.clone()).await;

        Self {
            broker,
            stats,
            producer,
            consumer,
            shutdown,
            handle,
            recorder,
        }
    }

    async fn stats(&self) -> Value {
        reqwest::get(format!("http://{}/stats", self.consumer))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Stop the consumer and hand back the recorded spans.
    async fn stop(self) -> common::SpanRecorder {
        // The loop only ends on shutdown.
        assert!(!self.handle.is_finished());

        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), self.handle.join())
            .await
            .expect("consumer should stop after shutdown")
            .unwrap();
        self.recorder
    }
}

#[tokio::test]
async fn test_enqueue_reaches_consumer() {
    let lab = Lab::start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/enqueue", lab.producer))
        .json(&json!({ "message": "hello", "trace_id": "abc123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["trace_id"], "abc123");

    let stats = lab.stats.clone();
    assert!(common::wait_until(Duration::from_secs(2), || stats.snapshot().messages_processed >= 1).await);

    let body = lab.stats().await;
    let received = body["messages_received"].as_u64().unwrap();
    let processed = body["messages_processed"].as_u64().unwrap();
    assert!(received >= processed && processed >= 1);
    assert_eq!(body["consumer_group"], GROUP);
    assert_eq!(body["topic"], TOPIC);

    lab.stop().await;
}

#[tokio::test]
async fn test_empty_message_never_reaches_queue() {
    let lab = Lab::start().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/enqueue", lab.producer))
        .json(&json!({ "message": "", "trace_id": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    assert_eq!(lab.broker.topic_len(TOPIC), 0);
    assert!(lab.recorder.spans().is_empty());

    lab.stop().await;
}

#[tokio::test]
async fn test_injected_garbage_is_dropped() {
    let lab = Lab::start().await;

    lab.broker.append(OutboundMessage {
        topic: TOPIC.to_string(),
        key: Vec::new(),
        value: b"\x00\x01 not an envelope".to_vec(),
        headers: HeaderBag::new(),
    });

    let broker = lab.broker.clone();
    assert!(common::wait_until(Duration::from_secs(2), || broker.committed_offset(TOPIC, GROUP) == Some(1)).await);

    let body = lab.stats().await;
    assert_eq!(body["messages_received"], 1);
    assert_eq!(body["messages_processed"], 0);

    lab.stop().await;
}

#[tokio::test]
async fn test_inbound_traceparent_is_continued() {
    let lab = Lab::start().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/enqueue", lab.producer))
        .header(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )
        .json(&json!({ "message": "hello", "trace_id": "upstream" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let stats = lab.stats.clone();
    assert!(common::wait_until(Duration::from_secs(2), || stats.snapshot().messages_processed == 1).await);
    let spans = lab.stop().await.spans();
    let enqueue = common::finished_span(&spans, "producer.enqueue");
    let process = common::finished_span(&spans, "consumer.process");

    assert_eq!(
        enqueue.span_context.trace_id().to_string(),
        "4bf92f3577b34da6a3ce929d0e0e4736"
    );
    assert_eq!(enqueue.parent_span_id.to_string(), "00f067aa0ba902b7");
    assert_eq!(process.span_context.trace_id(), enqueue.span_context.trace_id());
}
