//! Processing counters shared between the consumer loop and `/stats`.

use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Default)]
struct Counters {
    received: u64,
    processed: u64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub messages_received: u64,
    pub messages_processed: u64,
}

/// Received/processed counters behind a single lock.
///
/// A message is counted received before its pipeline starts and processed
/// only after it completes, so `processed <= received` in every snapshot.
#[derive(Debug, Default)]
pub struct ProcessingStats {
    counters: RwLock<Counters>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.counters.write().received += 1;
    }

    pub fn record_processed(&self) {
        self.counters.write().processed += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.counters.read();
        StatsSnapshot {
            messages_received: counters.received,
            messages_processed: counters.processed,
        }
    }
}
