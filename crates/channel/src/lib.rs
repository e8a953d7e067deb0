//! Alert Publish Channel
//!
//! Append-only channel the importer publishes change events to, plus the
//! replay interface used once at bootstrap to reconstruct known-alert state.
//! Ships an MQTT-backed implementation with a local journal and an in-memory
//! implementation for tests and dry runs.

mod error;
mod memory;
mod mqtt;

pub use error::ChannelError;
pub use memory::MemoryChannel;
pub use mqtt::{MqttChannel, MqttConfig};

use alert_model::Alert;
use chrono::{DateTime, Utc};

/// A message as returned by the replay interface: publish instant plus the
/// serialized alert payload.
pub type ReplayedMessage = (DateTime<Utc>, serde_json::Value);

/// External publishing channel consumed by the importer.
///
/// `publish` is append-only, one call per detected new/changed/prematurely
/// ended alert. `recent_messages` returns up to `limit` previously published
/// messages, oldest first, and is used only at bootstrap.
#[allow(async_fn_in_trait)]
pub trait AlertChannel {
    async fn publish(&self, ts: DateTime<Utc>, alert: &Alert) -> Result<(), ChannelError>;

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ReplayedMessage>, ChannelError>;
}
