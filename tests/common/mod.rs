//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use tracebridge::config::ConsumerConfig;
use tracebridge::consumer::{self, ConsumerState, ProcessingStats};
use tracebridge::producer::{self, Enqueuer, ProducerState};
use tracebridge::queue::{
    HeaderBag, MessageEnvelope, MessagePublisher, MessageSource, QueueMessage, TransportError,
};
use tracebridge::{HttpServer, Shutdown};

pub const TOPIC: &str = "trace-events";
pub const GROUP: &str = "event-consumer-group";

/// In-memory span sink for one test.
///
/// Holds its own provider clone: the last clone to drop shuts the provider
/// down, which clears the exporter.
pub struct SpanRecorder {
    provider: SdkTracerProvider,
    exporter: InMemorySpanExporter,
}

impl SpanRecorder {
    pub fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        Self { provider, exporter }
    }

    pub fn provider(&self) -> SdkTracerProvider {
        self.provider.clone()
    }

    pub fn spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }
}

pub fn finished_span<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    spans
        .iter()
        .find(|span| span.name == name)
        .unwrap_or_else(|| panic!("no finished span named {name}"))
}

/// Consumer settings with no simulated work and a short fetch backoff.
pub fn fast_consumer_config() -> ConsumerConfig {
    ConsumerConfig {
        fetch_backoff_ms: 10,
        simulated_work_base_ms: 0,
        simulated_work_window_ms: 0,
        ..ConsumerConfig::default()
    }
}

pub fn queue_message(offset: i64, value: Vec<u8>) -> QueueMessage {
    QueueMessage {
        topic: TOPIC.to_string(),
        key: Vec::new(),
        value,
        headers: HeaderBag::new(),
        offset,
        partition: 0,
    }
}

pub fn envelope_bytes(message: &str, trace_id: &str) -> Vec<u8> {
    MessageEnvelope::new(message, trace_id, "event-producer")
        .to_bytes()
        .unwrap()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub enum Step {
    Deliver(QueueMessage),
    Fail,
}

/// Source that replays a fixed script, then blocks forever.
#[derive(Default)]
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    commits: Mutex<Vec<i64>>,
    fail_commits: bool,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Self::default()
        }
    }

    pub fn failing_commits(steps: Vec<Step>) -> Self {
        Self {
            fail_commits: true,
            ..Self::new(steps)
        }
    }

    pub fn commits(&self) -> Vec<i64> {
        self.commits.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn fetch(&self) -> Result<QueueMessage, TransportError> {
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Deliver(message)) => Ok(message),
            Some(Step::Fail) => Err(TransportError::Fetch("broker unavailable".into())),
            None => std::future::pending().await,
        }
    }

    async fn commit(&self, message: &QueueMessage) -> Result<(), TransportError> {
        self.commits.lock().push(message.offset);
        if self.fail_commits {
            return Err(TransportError::Commit("coordinator not available".into()));
        }
        Ok(())
    }

    fn system(&self) -> &'static str {
        "scripted"
    }
}

/// Serve the producer router on an ephemeral port.
pub async fn spawn_producer(
    publisher: Arc<dyn MessagePublisher>,
    provider: SdkTracerProvider,
    shutdown: Shutdown,
) -> SocketAddr {
    let messaging_system = publisher.system();
    let enqueuer = Enqueuer::new(publisher, provider, TOPIC, "event-producer");
    let router = producer::build_router(ProducerState {
        enqueuer: Arc::new(enqueuer),
        messaging_system,
    });
    spawn_server("producer", router, shutdown).await
}

/// Serve the consumer stats router on an ephemeral port.
pub async fn spawn_consumer_http(stats: Arc<ProcessingStats>, shutdown: Shutdown) -> SocketAddr {
    let router = consumer::build_router(ConsumerState {
        stats,
        service_name: "event-consumer".into(),
        consumer_group: GROUP.into(),
        topic: TOPIC.into(),
        messaging_system: "memory",
    });
    spawn_server("consumer", router, shutdown).await
}

async fn spawn_server(name: &'static str, router: axum::Router, shutdown: Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(name, router, Duration::from_secs(5));
    tokio::spawn(async move {
        server.run(listener, shutdown).await.unwrap();
    });
    addr
}
