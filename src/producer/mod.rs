//! Producer service.
//!
//! # Data Flow
//! ```text
//! POST /enqueue
//!     → handlers.rs (parse + validate, 400 on failure, no telemetry)
//!     → extract caller context from HTTP headers
//!     → enqueue.rs: enqueue span → envelope → JSON → publish span
//!     → inject publish span context into message headers
//!     → MessagePublisher::publish (single attempt)
//!     → 200 / 500
//! ```
//!
//! # Design Decisions
//! - The consumer resumes from the publish span, not the enqueue span
//! - Message key is the caller's correlation id
//! - Timestamps are stamped server-side
//! - Duration and count metrics are recorded on every outcome

pub mod enqueue;
pub mod handlers;

pub use enqueue::{EnqueueReceipt, EnqueueRequest, Enqueuer, SOURCE_HEADER};
pub use handlers::{build_router, ProducerState};
