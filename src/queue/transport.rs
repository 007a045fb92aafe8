//! Transport traits implemented by each broker client.

use async_trait::async_trait;
use thiserror::Error;

use crate::queue::message::{Delivery, OutboundMessage, QueueMessage};

/// Errors raised by a broker client.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("publish failed: {0}")]
    Publish(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("commit failed: {0}")]
    Commit(String),

    /// The broker connection is gone for good.
    #[error("transport closed")]
    Closed,
}

/// Write side of the bus. Single attempt per call, no internal retry.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: OutboundMessage) -> Result<Delivery, TransportError>;

    /// Name reported as `messaging.system` on spans.
    fn system(&self) -> &'static str;
}

/// Read side of the bus, bound to one topic and consumer group.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Block until the next message is available.
    async fn fetch(&self) -> Result<QueueMessage, TransportError>;

    /// Acknowledge `message` so the group does not see it again.
    async fn commit(&self, message: &QueueMessage) -> Result<(), TransportError>;

    fn system(&self) -> &'static str;
}
