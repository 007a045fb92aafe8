//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger (once)
//!
//! Shutdown (shutdown.rs):
//!     trigger → HTTP servers stop accepting and drain
//!             → consumer loop observes cancellation at its next FETCH
//!
//! Supervisor (supervisor.rs):
//!     ConsumerHandle::join → wait for the in-flight cycle to commit → exit
//! ```
//!
//! # Design Decisions
//! - Cancellation is leveled: a task that starts waiting after the trigger
//!   still sees it
//! - No forced interruption of an in-flight pipeline
//! - The process exits only after the consumer task has been joined

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use supervisor::ConsumerHandle;
