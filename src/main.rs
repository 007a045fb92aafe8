//! tracebridge service binary.
//!
//! ```text
//!  POST /enqueue            message bus                 GET /stats
//!       │                                                    ▲
//!       ▼                                                    │
//!  ┌──────────┐  traceparent  ┌────────────┐  fetch   ┌──────────────┐
//!  │ producer │──────────────▶│   topic    │─────────▶│   consumer   │
//!  │ enqueuer │   + source    │ (kafka or  │  commit  │     loop     │
//!  └──────────┘               │  memory)   │◀─────────└──────────────┘
//!                             └────────────┘
//! ```
//!
//! `producer` and `consumer` run one service each against Kafka;
//! `standalone` runs both in one process over an in-memory broker.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use opentelemetry_sdk::trace::SdkTracerProvider;
use tracebridge::config::{load_config, AppConfig, BrokerKind};
use tracebridge::consumer::{self, ConsumerLoop, ConsumerState, ProcessingStats};
use tracebridge::lifecycle::{signals, ConsumerHandle};
use tracebridge::observability::{init_tracer_provider, logging, metrics};
use tracebridge::producer::{self, Enqueuer, ProducerState};
use tracebridge::queue::{MemoryBroker, MessagePublisher, MessageSource};
use tracebridge::{HttpServer, Shutdown};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "tracebridge", version)]
#[command(about = "Trace-propagating queue producer and consumer", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults are used otherwise).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Mode {
    /// Run the HTTP producer service
    Producer,
    /// Run the consumer loop and its stats endpoint
    Consumer,
    /// Run both services over an in-memory broker
    Standalone,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = ?cli.mode,
        topic = %config.broker.topic,
        "tracebridge starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr).map_err(|e| format!("metrics exporter: {e}"))?;
    }

    let shutdown = Shutdown::new();
    signals::spawn_listener(shutdown.clone());

    match cli.mode {
        Mode::Producer => {
            let publisher = connect_publisher(&config)?;
            serve_producer(&config, publisher, shutdown).await?;
        }
        Mode::Consumer => {
            let source = connect_source(&config)?;
            serve_consumer(&config, source, shutdown).await?;
        }
        Mode::Standalone => run_standalone(&config, shutdown).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_standalone(config: &AppConfig, shutdown: Shutdown) -> Result<(), BoxError> {
    if config.broker.kind != BrokerKind::Memory {
        tracing::info!("Standalone mode uses the in-memory broker");
    }

    let broker = MemoryBroker::new();
    let source = broker.subscribe(
        &config.broker.topic,
        &config.consumer.group_id,
        config.consumer.start_offset,
    );

    let (produced, consumed) = tokio::join!(
        stop_on_error(
            serve_producer(config, Arc::new(broker.publisher()), shutdown.clone()),
            &shutdown
        ),
        stop_on_error(
            serve_consumer(config, Arc::new(source), shutdown.clone()),
            &shutdown
        ),
    );
    broker.close();

    produced?;
    consumed
}

/// Take the whole process down when one half of it fails.
async fn stop_on_error<F>(service: F, shutdown: &Shutdown) -> Result<(), BoxError>
where
    F: std::future::Future<Output = Result<(), BoxError>>,
{
    let result = service.await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Service failed");
        shutdown.trigger();
    }
    result
}

async fn serve_producer(
    config: &AppConfig,
    publisher: Arc<dyn MessagePublisher>,
    shutdown: Shutdown,
) -> Result<(), BoxError> {
    let listener = TcpListener::bind(&config.producer.bind_address).await?;
    let provider = init_tracer_provider(&config.producer.service_name, &config.observability)?;

    let messaging_system = publisher.system();
    let enqueuer = Enqueuer::new(
        publisher,
        provider.clone(),
        &config.broker.topic,
        &config.producer.service_name,
    );
    let router = producer::build_router(ProducerState {
        enqueuer: Arc::new(enqueuer),
        messaging_system,
    });

    let timeout = Duration::from_secs(config.producer.request_timeout_secs);
    let served = HttpServer::new("producer", router, timeout)
        .run(listener, shutdown)
        .await;

    shutdown_provider(&provider);
    Ok(served?)
}

async fn serve_consumer(
    config: &AppConfig,
    source: Arc<dyn MessageSource>,
    shutdown: Shutdown,
) -> Result<(), BoxError> {
    let listener = TcpListener::bind(&config.consumer.bind_address).await?;
    let provider = init_tracer_provider(&config.consumer.service_name, &config.observability)?;

    let stats = Arc::new(ProcessingStats::new());
    let state = ConsumerState {
        stats: stats.clone(),
        service_name: config.consumer.service_name.clone(),
        consumer_group: config.consumer.group_id.clone(),
        topic: config.broker.topic.clone(),
        messaging_system: source.system(),
    };

    let consumer_loop = ConsumerLoop::new(
        source,
        stats,
        provider.clone(),
        &config.broker.topic,
        &config.consumer,
    );
    let handle = ConsumerHandle::spawn(consumer_loop.run(shutdown.token()), shutdown.clone());

    let timeout = Duration::from_secs(config.consumer.request_timeout_secs);
    let served = HttpServer::new("consumer", consumer::build_router(state), timeout)
        .run(listener, shutdown)
        .await;

    // The loop finishes its in-flight commit before this returns.
    handle.stop().await?;
    shutdown_provider(&provider);
    Ok(served?)
}

fn shutdown_provider(provider: &SdkTracerProvider) {
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "Failed to flush spans on shutdown");
    }
}

#[cfg(feature = "kafka")]
fn connect_publisher(config: &AppConfig) -> Result<Arc<dyn MessagePublisher>, BoxError> {
    use tracebridge::queue::kafka::KafkaPublisher;

    require_kafka(config)?;
    Ok(Arc::new(KafkaPublisher::connect(&config.broker)?))
}

#[cfg(feature = "kafka")]
fn connect_source(config: &AppConfig) -> Result<Arc<dyn MessageSource>, BoxError> {
    use tracebridge::queue::kafka::KafkaSource;

    require_kafka(config)?;
    Ok(Arc::new(KafkaSource::connect(
        &config.broker,
        &config.broker.topic,
        &config.consumer.group_id,
    )?))
}

#[cfg(feature = "kafka")]
fn require_kafka(config: &AppConfig) -> Result<(), BoxError> {
    if config.broker.kind == BrokerKind::Memory {
        return Err("the memory broker is only available in standalone mode".into());
    }
    Ok(())
}

#[cfg(not(feature = "kafka"))]
fn connect_publisher(_config: &AppConfig) -> Result<Arc<dyn MessagePublisher>, BoxError> {
    Err("built without the `kafka` feature; use `standalone` or rebuild with --features kafka".into())
}

#[cfg(not(feature = "kafka"))]
fn connect_source(_config: &AppConfig) -> Result<Arc<dyn MessageSource>, BoxError> {
    Err("built without the `kafka` feature; use `standalone` or rebuild with --features kafka".into())
}
