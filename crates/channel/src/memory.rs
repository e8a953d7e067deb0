//! In-Memory Channel

use crate::{AlertChannel, ChannelError, ReplayedMessage};
use alert_model::Alert;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// In-process channel keeping every published message in a vector.
///
/// Used by importer tests and the daemon's dry-run mode; nothing leaves the
/// process.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    messages: Mutex<Vec<ReplayedMessage>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far, oldest first.
    pub fn published(&self) -> Vec<ReplayedMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Number of messages published so far.
    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertChannel for MemoryChannel {
    async fn publish(&self, ts: DateTime<Utc>, alert: &Alert) -> Result<(), ChannelError> {
        let payload =
            serde_json::to_value(alert).map_err(|e| ChannelError::Serialization(e.to_string()))?;
        let mut messages = self
            .messages
            .lock()
            .map_err(|e| ChannelError::Publish(format!("lock error: {e}")))?;
        messages.push((ts, payload));
        Ok(())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ReplayedMessage>, ChannelError> {
        let messages = self
            .messages
            .lock()
            .map_err(|e| ChannelError::Journal(format!("lock error: {e}")))?;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages[skip..].to_vec())
    }
}
