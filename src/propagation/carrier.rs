//! Header bag carrier for the W3C propagators.

use opentelemetry::baggage::BaggageExt;
use opentelemetry::propagation::{Extractor, Injector, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

use crate::queue::HeaderBag;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const BAGGAGE_HEADER: &str = "baggage";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Writes propagation fields into a [`HeaderBag`], overwriting earlier values.
///
/// An empty value (e.g. `tracestate` with no vendor entries) removes the key
/// instead of writing a blank header.
pub struct HeaderInjector<'a>(pub &'a mut HeaderBag);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if value.is_empty() {
            self.0.remove(key);
        } else {
            self.0.set(key, value.into_bytes());
        }
    }
}

/// Reads propagation fields from a [`HeaderBag`]. First match wins.
pub struct HeaderExtractor<'a>(pub &'a HeaderBag);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get_str(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys()
    }
}

/// Composite W3C trace-context + baggage propagator.
pub struct Propagation {
    propagator: TextMapCompositePropagator,
}

impl Propagation {
    pub fn new() -> Self {
        let propagator = TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]);
        Self { propagator }
    }

    /// Serialize the span and baggage of `cx` into `headers`.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderBag) {
        self.propagator.inject_context(cx, &mut HeaderInjector(headers));
    }

    /// Rebuild the remote context carried in `headers`.
    ///
    /// Returns `None` when the bag holds neither a valid span context nor
    /// baggage. Malformed values are treated as missing.
    pub fn extract(&self, headers: &HeaderBag) -> Option<Context> {
        let cx = self.extract_with(&HeaderExtractor(headers));
        let has_span = cx.span().span_context().is_valid();
        let has_baggage = cx.baggage().len() > 0;
        (has_span || has_baggage).then_some(cx)
    }

    /// Like [`Propagation::extract`] but falls back to an empty root context.
    pub fn extract_or_root(&self, headers: &HeaderBag) -> Context {
        self.extract(headers).unwrap_or_default()
    }

    pub(crate) fn extract_with(&self, extractor: &dyn Extractor) -> Context {
        self.propagator.extract_with_context(&Context::new(), extractor)
    }
}

impl Default for Propagation {
    fn default() -> Self {
        Self::new()
    }
}
