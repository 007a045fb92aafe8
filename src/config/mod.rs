//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → cloned into each service at startup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so the services start with no file at all
//! - Broker and collector addresses may come from the environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::BrokerConfig;
pub use schema::BrokerKind;
pub use schema::ConsumerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ProducerConfig;
