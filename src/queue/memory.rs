//! In-process broker.
//!
//! # Responsibilities
//! - Append-only topic logs with broker-assigned offsets (single partition)
//! - Per consumer-group committed offsets
//! - Wake blocked fetches when new messages arrive
//!
//! # Design Decisions
//! - Fetch position is per subscription and advances on fetch, independent of
//!   commit (a message is never handed out twice to the same subscriber)
//! - A new subscription resumes from the group's committed offset, otherwise
//!   from the configured start position

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::queue::message::{Delivery, HeaderBag, OutboundMessage, QueueMessage};
use crate::queue::transport::{MessagePublisher, MessageSource, TransportError};

const PARTITION: i32 = 0;

/// Where a group with no committed offset starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StartOffset {
    /// Only messages published after the subscription.
    #[default]
    Latest,
    /// Everything still in the log.
    Earliest,
}

struct StoredMessage {
    key: Vec<u8>,
    value: Vec<u8>,
    headers: HeaderBag,
}

#[derive(Default)]
struct TopicLog {
    messages: Vec<StoredMessage>,
    /// group id -> next offset to read.
    committed: HashMap<String, i64>,
}

#[derive(Default)]
struct BrokerInner {
    topics: Mutex<HashMap<String, TopicLog>>,
    closed: Mutex<bool>,
    notify: Notify,
}

/// Shared handle to an in-process broker.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publisher(&self) -> MemoryPublisher {
        MemoryPublisher {
            broker: self.clone(),
        }
    }

    /// Join `group` on `topic`.
    pub fn subscribe(&self, topic: &str, group: &str, start: StartOffset) -> MemorySource {
        let position = {
            let mut topics = self.inner.topics.lock();
            let log = topics.entry(topic.to_string()).or_default();
            match log.committed.get(group) {
                Some(offset) => *offset,
                None => match start {
                    StartOffset::Latest => log.messages.len() as i64,
                    StartOffset::Earliest => 0,
                },
            }
        };

        tracing::debug!(topic = %topic, group = %group, position, "Memory subscription created");

        MemorySource {
            broker: self.clone(),
            topic: topic.to_string(),
            group: group.to_string(),
            position: Mutex::new(position),
        }
    }

    /// Append a message directly, bypassing any producer logic.
    pub fn append(&self, message: OutboundMessage) -> Delivery {
        let offset = {
            let mut topics = self.inner.topics.lock();
            let log = topics.entry(message.topic).or_default();
            log.messages.push(StoredMessage {
                key: message.key,
                value: message.value,
                headers: message.headers,
            });
            log.messages.len() as i64 - 1
        };
        self.inner.notify.notify_waiters();

        Delivery {
            partition: PARTITION,
            offset,
        }
    }

    /// Next offset `group` will resume from, if it ever committed.
    pub fn committed_offset(&self, topic: &str, group: &str) -> Option<i64> {
        self.inner
            .topics
            .lock()
            .get(topic)
            .and_then(|log| log.committed.get(group).copied())
    }

    /// Number of messages ever published to `topic`.
    pub fn topic_len(&self, topic: &str) -> usize {
        self.inner
            .topics
            .lock()
            .get(topic)
            .map(|log| log.messages.len())
            .unwrap_or(0)
    }

    /// Fail every pending and future fetch.
    pub fn close(&self) {
        *self.inner.closed.lock() = true;
        self.inner.notify.notify_waiters();
    }

    fn is_closed(&self) -> bool {
        *self.inner.closed.lock()
    }
}

/// Publisher half of a [`MemoryBroker`].
#[derive(Clone)]
pub struct MemoryPublisher {
    broker: MemoryBroker,
}

#[async_trait]
impl MessagePublisher for MemoryPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<Delivery, TransportError> {
        if self.broker.is_closed() {
            return Err(TransportError::Closed);
        }
        Ok(self.broker.append(message))
    }

    fn system(&self) -> &'static str {
        "memory"
    }
}

/// A group subscription on one topic of a [`MemoryBroker`].
pub struct MemorySource {
    broker: MemoryBroker,
    topic: String,
    group: String,
    position: Mutex<i64>,
}

impl MemorySource {
    fn try_next(&self) -> Option<QueueMessage> {
        let topics = self.broker.inner.topics.lock();
        let log = topics.get(&self.topic)?;
        let mut position = self.position.lock();
        let stored = log.messages.get(*position as usize)?;

        let message = QueueMessage {
            topic: self.topic.clone(),
            key: stored.key.clone(),
            value: stored.value.clone(),
            headers: stored.headers.clone(),
            offset: *position,
            partition: PARTITION,
        };
        *position += 1;
        Some(message)
    }

    /// Offset the next fetch will return.
    pub fn position(&self) -> i64 {
        *self.position.lock()
    }
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn fetch(&self) -> Result<QueueMessage, TransportError> {
        loop {
            // Registered before the check so a publish in between is not missed.
            let notified = self.broker.inner.notify.notified();

            if let Some(message) = self.try_next() {
                return Ok(message);
            }
            if self.broker.is_closed() {
                return Err(TransportError::Closed);
            }

            notified.await;
        }
    }

    async fn commit(&self, message: &QueueMessage) -> Result<(), TransportError> {
        if self.broker.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut topics = self.broker.inner.topics.lock();
        let log = topics
            .get_mut(&message.topic)
            .ok_or_else(|| TransportError::Commit(format!("unknown topic {}", message.topic)))?;

        let next = message.offset + 1;
        let entry = log.committed.entry(self.group.clone()).or_insert(next);
        // Commits never move a group backwards.
        if *entry < next {
            *entry = next;
        }
        Ok(())
    }

    fn system(&self) -> &'static str {
        "memory"
    }
}
