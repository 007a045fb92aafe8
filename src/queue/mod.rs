//! Message bus subsystem.
//!
//! # Data Flow
//! ```text
//! Producer:
//!     MessageEnvelope → JSON bytes → OutboundMessage (key, value, headers)
//!     → MessagePublisher::publish → broker assigns (partition, offset)
//!
//! Consumer:
//!     MessageSource::fetch → QueueMessage (read-only offset/partition)
//!     → processing → MessageSource::commit(offset)
//! ```
//!
//! # Design Decisions
//! - Transports sit behind two narrow traits so the processing loop never
//!   depends on a concrete broker client
//! - `memory.rs` is a single-partition in-process broker (standalone mode, tests)
//! - `kafka.rs` is compiled only with the `kafka` feature (needs librdkafka)
//! - Offsets are owned by the broker; the application only acknowledges them

pub mod memory;
pub mod message;
pub mod transport;

#[cfg(feature = "kafka")]
pub mod kafka;

pub use memory::{MemoryBroker, MemoryPublisher, MemorySource, StartOffset};
pub use message::{Delivery, HeaderBag, MessageEnvelope, OutboundMessage, QueueMessage};
pub use transport::{MessagePublisher, MessageSource, TransportError};
