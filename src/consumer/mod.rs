//! Consumer service subsystem.
//!
//! # Data Flow
//! ```text
//! MessageSource::fetch (or cancellation, first ready wins)
//!     → processor.rs (extract context, consumer.process span, decode)
//!     → pipeline.rs (transform, validate under child spans)
//!     → stats.rs (received / processed counters)
//!     → MessageSource::commit (always, once fetched)
//!
//! GET /stats → handlers.rs → ProcessingStats::snapshot
//! ```
//!
//! # Design Decisions
//! - One sequential loop per process; cancellation only checked at fetch
//! - Poison messages are committed and dropped
//! - Stats are owned by the caller and shared explicitly with the handlers

pub mod handlers;
pub mod pipeline;
pub mod processor;
pub mod stats;

pub use handlers::{build_router, ConsumerState};
pub use pipeline::TransformedRecord;
pub use processor::ConsumerLoop;
pub use stats::{ProcessingStats, StatsSnapshot};
