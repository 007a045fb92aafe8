//! HTTP surface of the consumer service.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::consumer::stats::ProcessingStats;
use crate::http::{HealthBody, InfoBody};

const CAPABILITIES: &[&str] = &[
    "message consumption",
    "trace context extraction",
    "structured logging",
];

#[derive(Clone)]
pub struct ConsumerState {
    pub stats: Arc<ProcessingStats>,
    pub service_name: String,
    pub consumer_group: String,
    pub topic: String,
    pub messaging_system: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub service: String,
    pub messages_received: u64,
    pub messages_processed: u64,
    pub consumer_group: String,
    pub topic: String,
}

pub fn build_router(state: ConsumerState) -> Router {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .with_state(state)
}

pub async fn stats_handler(State(state): State<ConsumerState>) -> Json<StatsResponse> {
    let snapshot = state.stats.snapshot();
    tracing::debug!(
        received = snapshot.messages_received,
        processed = snapshot.messages_processed,
        "Stats requested"
    );

    Json(StatsResponse {
        service: state.service_name,
        messages_received: snapshot.messages_received,
        messages_processed: snapshot.messages_processed,
        consumer_group: state.consumer_group,
        topic: state.topic,
    })
}

pub async fn health_handler(State(state): State<ConsumerState>) -> Json<HealthBody> {
    Json(HealthBody::healthy(&state.service_name))
}

pub async fn info_handler(State(state): State<ConsumerState>) -> Json<InfoBody> {
    Json(InfoBody {
        service: state.service_name,
        version: env!("CARGO_PKG_VERSION"),
        role: "consumer",
        topic: state.topic,
        messaging_system: state.messaging_system,
        capabilities: CAPABILITIES,
    })
}
