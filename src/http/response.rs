//! JSON response bodies shared by both services.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// `{"error": "..."}` with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub service: String,
}

impl HealthBody {
    pub fn healthy(service: &str) -> Self {
        Self {
            status: "healthy",
            service: service.to_string(),
        }
    }
}

/// Service metadata for `GET /info`.
#[derive(Debug, Serialize)]
pub struct InfoBody {
    pub service: String,
    pub version: &'static str,
    pub role: &'static str,
    pub topic: String,
    pub messaging_system: &'static str,
    pub capabilities: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_error_body() {
        let response = json_error(StatusCode::BAD_REQUEST, "Message cannot be empty");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Message cannot be empty");
    }
}
