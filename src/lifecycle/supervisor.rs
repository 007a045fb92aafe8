//! Supervised consumer task.

use std::future::Future;
use tokio::task::{JoinError, JoinHandle};

use crate::lifecycle::shutdown::Shutdown;

/// Handle to the background consumer loop.
///
/// The loop only exits on cancellation, so `join` after `Shutdown::trigger`
/// waits for the current fetch/process/commit cycle to finish.
pub struct ConsumerHandle {
    task: JoinHandle<()>,
    shutdown: Shutdown,
}

impl ConsumerHandle {
    /// Spawn `consumer` on the runtime, supervised by `shutdown`.
    pub fn spawn<F>(consumer: F, shutdown: Shutdown) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(consumer),
            shutdown,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit on its own.
    pub async fn join(self) -> Result<(), JoinError> {
        let result = self.task.await;
        match &result {
            Ok(()) => tracing::info!("Consumer loop stopped"),
            Err(e) => tracing::error!(error = %e, "Consumer task failed"),
        }
        result
    }

    /// Trigger shutdown and wait for the loop to exit.
    pub async fn stop(self) -> Result<(), JoinError> {
        self.shutdown.trigger();
        self.join().await
    }
}
