//! Trace context propagation across transport boundaries.
//!
//! # Data Flow
//! ```text
//! Producer:
//!     inbound HTTP headers → http.rs extract → enqueue/publish spans
//!     → carrier.rs inject(publish context) → HeaderBag on the queue message
//!
//! Consumer:
//!     HeaderBag → carrier.rs extract → Option<Context>
//!     → None degrades to a root context, never an error
//! ```
//!
//! # Design Decisions
//! - W3C `traceparent`/`tracestate` plus W3C `baggage`, readable by any
//!   standards-based tracing backend
//! - Contexts are explicit values; extraction starts from an empty `Context`
//!   rather than whatever is current on the thread
//! - Reserved keys are singletons in the bag; other headers are untouched

pub mod carrier;
pub mod http;

pub use carrier::{
    HeaderExtractor, HeaderInjector, Propagation, BAGGAGE_HEADER, TRACEPARENT_HEADER, TRACESTATE_HEADER,
};
