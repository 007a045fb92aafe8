//! HTTP server setup.
//!
//! # Responsibilities
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind the service router to a listener
//! - Drain in-flight requests on shutdown

use axum::http::HeaderName;
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::lifecycle::Shutdown;

pub const X_REQUEST_ID: &str = "x-request-id";

/// HTTP server for one service router.
pub struct HttpServer {
    name: &'static str,
    router: Router,
}

impl HttpServer {
    pub fn new(name: &'static str, router: Router, request_timeout: Duration) -> Self {
        Self {
            name,
            router: Self::with_layers(router, request_timeout),
        }
    }

    #[allow(deprecated)]
    fn with_layers(router: Router, request_timeout: Duration) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TimeoutLayer::new(request_timeout)),
        )
    }

    /// Serve until `shutdown` is triggered, then drain.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(service = self.name, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!(service = self.name, "HTTP server stopped");
        Ok(())
    }
}
