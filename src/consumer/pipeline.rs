//! Business stages run for every decoded message.

use serde::Serialize;

use crate::queue::message::{unix_now, MessageEnvelope};

/// Output of the transform stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformedRecord {
    pub original_message: String,
    pub processed_at: i64,
    pub processor: String,
    pub trace_id: String,
}

/// Derive the processed record. `processor` is the consumer service name.
pub fn transform(envelope: &MessageEnvelope, processor: &str) -> TransformedRecord {
    TransformedRecord {
        original_message: envelope.message.clone(),
        processed_at: unix_now(),
        processor: processor.to_string(),
        trace_id: envelope.trace_id.clone(),
    }
}

/// A message passes validation when its body is non-empty.
pub fn validate(envelope: &MessageEnvelope) -> bool {
    !envelope.message.is_empty()
}
