//! HTTP plumbing shared by the producer and consumer services.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace, timeout layers)
//!     → service router (producer or consumer handlers)
//!     → response.rs (JSON bodies)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use response::{json_error, HealthBody, InfoBody};
pub use server::HttpServer;
