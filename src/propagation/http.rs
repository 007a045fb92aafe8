//! Inbound HTTP header extraction.

use axum::http::HeaderMap;
use opentelemetry::propagation::Extractor;
use opentelemetry::Context;

use crate::propagation::carrier::Propagation;

/// Reads propagation fields from HTTP request headers.
pub struct HttpHeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HttpHeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

impl Propagation {
    /// Context of the caller, or an empty root context if the request carried none.
    pub fn extract_http(&self, headers: &HeaderMap) -> Context {
        self.extract_with(&HttpHeaderExtractor(headers))
    }
}
