//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{AppConfig, BrokerKind};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "producer.bind_address", &config.producer.bind_address);
    check_address(&mut errors, "consumer.bind_address", &config.consumer.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.broker.topic.trim().is_empty() {
        errors.push(ValidationError::Empty("broker.topic"));
    }
    if config.broker.kind == BrokerKind::Kafka && config.broker.brokers.trim().is_empty() {
        errors.push(ValidationError::Empty("broker.brokers"));
    }
    if config.consumer.group_id.trim().is_empty() {
        errors.push(ValidationError::Empty("consumer.group_id"));
    }
    if config.producer.service_name.trim().is_empty() {
        errors.push(ValidationError::Empty("producer.service_name"));
    }
    if config.consumer.service_name.trim().is_empty() {
        errors.push(ValidationError::Empty("consumer.service_name"));
    }

    if config.consumer.fetch_backoff_ms == 0 {
        errors.push(ValidationError::Zero("consumer.fetch_backoff_ms"));
    }
    if config.producer.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("producer.request_timeout_secs"));
    }
    if config.consumer.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("consumer.request_timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
