//! Operational log channel.
//!
//! Remote API errors and rotator events are forwarded here, separately
//! from the user-facing reply.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

/// Sink for operational messages.
#[async_trait]
pub trait OperationalLog: Send + Sync {
    /// Records a single operational entry.
    async fn log(&self, entry: &str);
}

/// Writes operational entries through `tracing` under the `ops` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

#[async_trait]
impl OperationalLog for TracingLog {
    async fn log(&self, entry: &str) {
        info!(target: "ops", "{}", entry);
    }
}

/// Keeps operational entries in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded entry.
    pub async fn entries(&self) -> Vec<String> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl OperationalLog for MemoryLog {
    async fn log(&self, entry: &str) {
        self.entries.lock().await.push(entry.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_log_keeps_order() {
        let log = MemoryLog::new();
        log.log("first").await;
        log.log("second").await;
        assert_eq!(log.entries().await, vec!["first", "second"]);
    }
}
