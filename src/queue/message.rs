//! Queue message types shared by producer and consumer.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Ordered key/value metadata attached to a queue message.
///
/// Keys are not unique in general; lookups scan linearly and the first match
/// wins. `set` treats a key as a singleton and is what propagation uses for
/// its reserved keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBag {
    entries: Vec<(String, Vec<u8>)>,
}

impl HeaderBag {
    /// Create an empty header bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// First value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// First value under `key` decoded as UTF-8. Invalid UTF-8 reads as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Replace every entry under `key` with a single new entry at the end.
    pub fn set(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.remove(key);
        self.entries.push((key.to_string(), value.into()));
    }

    /// Drop every entry under `key`.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// Append an entry without touching existing ones.
    pub fn append(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.entries.push((key.to_string(), value.into()));
    }

    /// All keys in insertion order, duplicates included.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<u8>)> for HeaderBag {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A message as fetched from the broker.
///
/// `offset` and `partition` are assigned by the broker and are the unit of
/// acknowledgment.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub topic: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub headers: HeaderBag,
    pub offset: i64,
    pub partition: i32,
}

/// A message about to be published.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub topic: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub headers: HeaderBag,
}

/// Broker acknowledgment of a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// Business payload carried in the message body.
///
/// `trace_id` is the caller's correlation id. It usually equals the trace id
/// in the propagation headers but is kept separately for log correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageEnvelope {
    pub message: String,
    pub trace_id: String,
    /// Unix seconds, stamped by the producer.
    pub timestamp: i64,
    pub source: String,
}

impl MessageEnvelope {
    /// Build an envelope stamped with the current server time.
    pub fn new(message: impl Into<String>, trace_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace_id: trace_id.into(),
            timestamp: unix_now(),
            source: source.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Current time in whole unix seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
