//! HTTP surface of the producer service.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::RequestError;
use crate::http::{json_error, HealthBody, InfoBody};
use crate::producer::enqueue::{EnqueueRequest, Enqueuer};

const CAPABILITIES: &[&str] = &[
    "message queuing",
    "trace context injection",
    "structured logging",
];

#[derive(Clone)]
pub struct ProducerState {
    pub enqueuer: Arc<Enqueuer>,
    pub messaging_system: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub status: &'static str,
    pub service: String,
    pub message: &'static str,
    pub trace_id: String,
}

pub fn build_router(state: ProducerState) -> Router {
    Router::new()
        .route("/enqueue", post(enqueue_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .with_state(state)
}

pub async fn enqueue_handler(
    State(state): State<ProducerState>,
    headers: HeaderMap,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> Response {
    let request = match parse_request(body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected enqueue request");
            return json_error(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let enqueuer = &state.enqueuer;
    let parent = enqueuer.propagation().extract_http(&headers);

    match enqueuer.enqueue(&parent, &request).await {
        Ok(receipt) => Json(EnqueueResponse {
            status: "success",
            service: enqueuer.service_name().to_string(),
            message: "Message enqueued",
            trace_id: receipt.trace_id,
        })
        .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, e.public_message()),
    }
}

fn parse_request(
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> Result<EnqueueRequest, RequestError> {
    let Json(request) = body.map_err(|e| RequestError::Malformed(e.body_text()))?;
    request.validate()?;
    Ok(request)
}

pub async fn health_handler(State(state): State<ProducerState>) -> Json<HealthBody> {
    Json(HealthBody::healthy(state.enqueuer.service_name()))
}

pub async fn info_handler(State(state): State<ProducerState>) -> Json<InfoBody> {
    Json(InfoBody {
        service: state.enqueuer.service_name().to_string(),
        version: env!("CARGO_PKG_VERSION"),
        role: "producer",
        topic: state.enqueuer.topic().to_string(),
        messaging_system: state.messaging_system,
        capabilities: CAPABILITIES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use tower::ServiceExt;

    use crate::queue::{MemoryBroker, MessagePublisher, StartOffset};

    fn router(broker: &MemoryBroker) -> Router {
        let publisher: Arc<dyn MessagePublisher> = Arc::new(broker.publisher());
        let enqueuer = Enqueuer::new(
            publisher,
            SdkTracerProvider::builder().build(),
            "trace-events",
            "event-producer",
        );
        build_router(ProducerState {
            enqueuer: Arc::new(enqueuer),
            messaging_system: "memory",
        })
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/enqueue")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_enqueue_success() {
        let broker = MemoryBroker::new();
        let _source = broker.subscribe("trace-events", "g", StartOffset::Earliest);

        let response = router(&broker)
            .oneshot(post_json(r#"{"message":"hello","trace_id":"abc123"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["service"], "event-producer");
        assert_eq!(body["trace_id"], "abc123");
        assert_eq!(broker.topic_len("trace-events"), 1);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let broker = MemoryBroker::new();
        let response = router(&broker)
            .oneshot(post_json(r#"{"message":"","trace_id":"x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        assert_eq!(broker.topic_len("trace-events"), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let broker = MemoryBroker::new();
        let response = router(&broker)
            .oneshot(post_json("{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(broker.topic_len("trace-events"), 0);
    }

    #[tokio::test]
    async fn test_closed_broker_returns_500() {
        let broker = MemoryBroker::new();
        broker.close();
        let response = router(&broker)
            .oneshot(post_json(r#"{"message":"hello","trace_id":"abc"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Failed to enqueue message");
    }

    #[tokio::test]
    async fn test_health() {
        let broker = MemoryBroker::new();
        let response = router(&broker)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "event-producer");
    }
}
