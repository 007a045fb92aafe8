//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values.
pub const ENV_KAFKA_BROKER: &str = "KAFKA_BROKER";
pub const ENV_OTEL_COLLECTOR_ENDPOINT: &str = "OTEL_COLLECTOR_ENDPOINT";
pub const ENV_PRODUCER_BIND_ADDRESS: &str = "PRODUCER_BIND_ADDRESS";
pub const ENV_CONSUMER_BIND_ADDRESS: &str = "CONSUMER_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate.
///
/// With no path the built-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(brokers) = lookup(ENV_KAFKA_BROKER) {
        config.broker.brokers = brokers;
    }
    if let Some(endpoint) = lookup(ENV_OTEL_COLLECTOR_ENDPOINT) {
        config.observability.otlp_endpoint = Some(endpoint);
    }
    if let Some(addr) = lookup(ENV_PRODUCER_BIND_ADDRESS) {
        config.producer.bind_address = addr;
    }
    if let Some(addr) = lookup(ENV_CONSUMER_BIND_ADDRESS) {
        config.consumer.bind_address = addr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_KAFKA_BROKER, "broker-1:9092,broker-2:9092"),
            (ENV_OTEL_COLLECTOR_ENDPOINT, "http://collector:4317"),
            (ENV_CONSUMER_BIND_ADDRESS, ""),
        ]);

        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.broker.brokers, "broker-1:9092,broker-2:9092");
        assert_eq!(config.observability.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        // Blank values are ignored.
        assert_eq!(config.consumer.bind_address, "0.0.0.0:8003");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("tracebridge_loader_test.toml");
        fs::write(&path, "[broker]\nkind = \"memory\"\ntopic = \"lab-events\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.broker.topic, "lab-events");

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_invalid_file_reports_validation() {
        let path = std::env::temp_dir().join("tracebridge_loader_invalid.toml");
        fs::write(&path, "[consumer]\nfetch_backoff_ms = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("consumer.fetch_backoff_ms"));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
