//! MQTT Channel Implementation
//!
//! Publishes serialized alerts to a broker topic and keeps a local JSON-lines
//! journal of everything published. The journal backs the replay interface at
//! bootstrap; the importer core itself stays stateless across restarts.

use crate::{AlertChannel, ChannelError, ReplayedMessage};
use alert_model::Alert;
use chrono::{DateTime, Utc};
use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// MQTT channel configuration
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// MQTT broker URL
    pub broker_url: String,
    /// MQTT port
    pub broker_port: u16,
    /// Topic alert events are published to
    pub topic: String,
    /// Client identifier
    pub client_id: String,
    /// Path of the local publish journal
    pub journal_path: PathBuf,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: "localhost".to_string(),
            broker_port: 1883,
            topic: "weather/alerts".to_string(),
            client_id: format!("alert-import-{}", Uuid::new_v4()),
            journal_path: PathBuf::from("alert-journal.jsonl"),
        }
    }
}

/// One line of the publish journal.
#[derive(Debug, Serialize, Deserialize)]
struct JournalLine {
    ts: DateTime<Utc>,
    alert: serde_json::Value,
}

/// MQTT-backed alert channel with journal replay
pub struct MqttChannel {
    config: MqttConfig,
    client: AsyncClient,
    journal: Mutex<std::fs::File>,
}

impl MqttChannel {
    /// Connect to the broker and open the journal for appending.
    pub async fn connect(config: MqttConfig) -> Result<Self, ChannelError> {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_url, config.broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        // Drive the connection in the background; publish calls only enqueue.
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    _ => {}
                }
            }
        });

        let journal = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.journal_path)
            .map_err(|e| ChannelError::Journal(e.to_string()))?;

        info!("Connected to MQTT broker: {}", config.broker_url);
        Ok(Self {
            config,
            client,
            journal: Mutex::new(journal),
        })
    }
}

impl AlertChannel for MqttChannel {
    async fn publish(&self, ts: DateTime<Utc>, alert: &Alert) -> Result<(), ChannelError> {
        let line = JournalLine {
            ts,
            alert: serde_json::to_value(alert)
                .map_err(|e| ChannelError::Serialization(e.to_string()))?,
        };
        let payload = serde_json::to_vec(&line.alert)
            .map_err(|e| ChannelError::Serialization(e.to_string()))?;

        self.client
            .publish(&self.config.topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| ChannelError::Publish(e.to_string()))?;

        let serialized = serde_json::to_string(&line)
            .map_err(|e| ChannelError::Serialization(e.to_string()))?;
        let mut journal = self
            .journal
            .lock()
            .map_err(|e| ChannelError::Journal(format!("lock error: {e}")))?;
        writeln!(journal, "{serialized}").map_err(|e| ChannelError::Journal(e.to_string()))?;
        Ok(())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ReplayedMessage>, ChannelError> {
        let contents = match std::fs::read_to_string(&self.config.journal_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ChannelError::Journal(e.to_string())),
        };
        Ok(parse_journal(&contents, limit))
    }
}

/// Parse journal contents into replayable messages, keeping the last `limit`
/// lines in file (oldest-first) order. Unparseable lines are logged and
/// skipped so one corrupt line cannot block startup.
fn parse_journal(contents: &str, limit: usize) -> Vec<ReplayedMessage> {
    let mut messages: Vec<ReplayedMessage> = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalLine>(line) {
            Ok(parsed) => messages.push((parsed.ts, parsed.alert)),
            Err(e) => warn!("Skipping unreadable journal line: {}", e),
        }
    }
    let skip = messages.len().saturating_sub(limit);
    messages.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn journal_parsing_keeps_order_and_limit() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 10, 0).unwrap();
        let contents = [
            serde_json::to_string(&JournalLine {
                ts: t0,
                alert: serde_json::json!({"warnCellId": "1"}),
            })
            .unwrap(),
            serde_json::to_string(&JournalLine {
                ts: t1,
                alert: serde_json::json!({"warnCellId": "2"}),
            })
            .unwrap(),
            serde_json::to_string(&JournalLine {
                ts: t1,
                alert: serde_json::json!({"warnCellId": "3"}),
            })
            .unwrap(),
        ]
        .join("\n");

        let all = parse_journal(&contents, 10);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].0, t0);
        assert_eq!(all[2].1["warnCellId"], "3");

        let capped = parse_journal(&contents, 2);
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].1["warnCellId"], "2");
    }

    #[test]
    fn corrupt_journal_lines_are_skipped() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let good = serde_json::to_string(&JournalLine {
            ts: t0,
            alert: serde_json::json!({"warnCellId": "1"}),
        })
        .unwrap();
        let contents = format!("not json\n{good}\n");

        let messages = parse_journal(&contents, 10);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, t0);
    }
}
