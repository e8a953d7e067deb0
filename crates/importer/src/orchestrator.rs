//! Import Orchestrator

use crate::{AlertFilter, ImportError, KnownAlerts};
use alert_model::Alert;
use channel::{AlertChannel, ChannelError};
use chrono::{DateTime, Utc};
use feed_client::{FeedClient, FeedError};
use tracing::{debug, error, info, warn};

/// Maximum number of previously published messages requested at bootstrap.
/// Generous on purpose; replay runs once per process start.
pub const REPLAY_LIMIT: usize = 10_000;

/// Source of feed snapshots, implemented by [`FeedClient`] and by test stubs.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch_current(&self) -> Result<(DateTime<Utc>, Vec<Alert>), FeedError>;
}

impl FeedSource for FeedClient {
    async fn fetch_current(&self) -> Result<(DateTime<Utc>, Vec<Alert>), FeedError> {
        FeedClient::fetch_current(self).await
    }
}

/// Outcome of one import cycle, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records considered after filtering.
    pub total: usize,
    /// New or changed alerts published.
    pub published: usize,
    /// Alerts that disappeared before their declared end and were republished
    /// with a synthetic end timestamp.
    pub premature: usize,
    /// The cycle was skipped because the feed timestamp was not newer than
    /// the last import.
    pub skipped_stale: bool,
}

/// Holds the last processed feed timestamp and the known-alert store, and
/// runs the fetch → filter → diff → publish cycle.
///
/// Constructed once at process start via [`AlertImporter::bootstrap`]; state
/// mutates only inside a cycle. The external scheduler must serialize cycle
/// invocations.
pub struct AlertImporter<C> {
    channel: C,
    filter: AlertFilter,
    known: KnownAlerts,
    last_import: DateTime<Utc>,
}

impl<C: AlertChannel> AlertImporter<C> {
    /// Reconstruct known-alert state by replaying previously published
    /// messages.
    ///
    /// The newest message's timestamp becomes the last-import watermark, and
    /// replay stops at the first message strictly older than it. All messages
    /// of one publish batch share the batch's feed timestamp, so this replays
    /// exactly the most recent batch.
    pub async fn bootstrap(channel: C, filter: AlertFilter) -> Result<Self, ChannelError> {
        let mut importer = Self {
            channel,
            filter,
            known: KnownAlerts::new(),
            last_import: DateTime::<Utc>::UNIX_EPOCH,
        };

        let mut previous = importer.channel.recent_messages(REPLAY_LIMIT).await?;
        // Oldest-first from the channel; walk newest-first.
        previous.reverse();
        if let Some((newest, _)) = previous.first() {
            importer.last_import = *newest;
        }

        let mut replayed = 0usize;
        for (ts, payload) in previous {
            if ts < importer.last_import {
                // All remaining messages belong to older batches.
                break;
            }
            let alert: Alert = match serde_json::from_value(payload) {
                Ok(alert) => alert,
                Err(e) => {
                    error!("Replayed message could not be decoded, skipping: {}", e);
                    continue;
                }
            };
            if !importer.known.insert_if_changed(alert) {
                error!("Import previously published alert failed: Already exists (double import)!");
            }
            replayed += 1;
        }

        debug!("Init completed, {} messages replayed", replayed);
        Ok(importer)
    }

    /// Number of currently known alerts.
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    /// Timestamp of the last processed feed snapshot.
    pub fn last_import(&self) -> DateTime<Utc> {
        self.last_import
    }

    /// Run one import cycle.
    ///
    /// Only new or changed alerts are published. An alert that disappears
    /// from the feed before its declared end is republished with its end set
    /// to the feed timestamp.
    pub async fn import_most_recent<S: FeedSource>(
        &mut self,
        source: &S,
    ) -> Result<CycleReport, ImportError> {
        let (feed_ts, alerts) = source.fetch_current().await?;

        if feed_ts <= self.last_import {
            warn!("Already imported these alerts. Scheduled too often? Ignore at startup");
            return Ok(CycleReport {
                skipped_stale: true,
                ..CycleReport::default()
            });
        }
        self.last_import = feed_ts;
        info!("Got {} alerts", alerts.len());

        let alerts = self.filter.apply(alerts);

        let missing = self.known.remove_missing(&alerts);
        let mut premature = 0usize;
        for alert in missing {
            // Declared end already reached: expired on schedule, no event.
            if alert.end.is_some_and(|end| end <= feed_ts) {
                continue;
            }
            let alert = alert.with_end(feed_ts);
            self.channel.publish(feed_ts, &alert).await?;
            premature += 1;
        }
        info!("{} alerts ended prematurely (message sent)", premature);

        let mut published = 0usize;
        let mut total = 0usize;
        for alert in alerts {
            total += 1;
            if self.known.insert_if_changed(alert.clone()) {
                self.channel.publish(feed_ts, &alert).await?;
                published += 1;
            }
        }
        info!("{} new alerts imported (of {} after filtering)", published, total);

        Ok(CycleReport {
            total,
            published,
            premature,
            skipped_stale: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_model::Urgency;
    use channel::MemoryChannel;
    use chrono::TimeZone;

    struct StubFeed {
        ts: DateTime<Utc>,
        alerts: Vec<Alert>,
    }

    impl FeedSource for StubFeed {
        async fn fetch_current(&self) -> Result<(DateTime<Utc>, Vec<Alert>), FeedError> {
            Ok((self.ts, self.alerts.clone()))
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn alert(cell: &str, event: &str, end: Option<DateTime<Utc>>) -> Alert {
        Alert {
            warn_cell_id: cell.to_string(),
            region_name: "Region".to_string(),
            start: t0(),
            end,
            type_code: 1,
            state: "State".to_string(),
            state_short: "ST".to_string(),
            level: 2,
            description: String::new(),
            event: event.to_string(),
            headline: String::new(),
            instruction: String::new(),
            altitude_start: None,
            altitude_end: None,
            urgency: Urgency::Active,
        }
    }

    async fn fresh_importer(filter: AlertFilter) -> AlertImporter<MemoryChannel> {
        AlertImporter::bootstrap(MemoryChannel::new(), filter)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stale_feed_timestamp_skips_the_cycle() {
        let mut importer = fresh_importer(AlertFilter::default()).await;
        let feed = StubFeed {
            ts: t0(),
            alerts: vec![alert("1", "Sturm", None)],
        };

        let first = importer.import_most_recent(&feed).await.unwrap();
        assert_eq!(first.published, 1);
        assert!(!first.skipped_stale);

        // Same feed timestamp again: no mutation, no publishes.
        let second = importer.import_most_recent(&feed).await.unwrap();
        assert!(second.skipped_stale);
        assert_eq!(second.published, 0);
        assert_eq!(importer.channel.len(), 1);
        assert_eq!(importer.known_count(), 1);
    }

    #[tokio::test]
    async fn new_changed_and_prematurely_ended_alerts_are_published() {
        let mut importer = fresh_importer(AlertFilter::default()).await;
        let a = alert("1", "Sturm", None);
        let b = alert("2", "Regen", Some(t0() + chrono::Duration::hours(3)));

        // Cycle 1: both alerts are new.
        let feed = StubFeed {
            ts: t0() + chrono::Duration::minutes(1),
            alerts: vec![a.clone(), b.clone()],
        };
        let report = importer.import_most_recent(&feed).await.unwrap();
        assert_eq!(report, CycleReport { total: 2, published: 2, premature: 0, skipped_stale: false });
        assert_eq!(importer.known_count(), 2);

        // Cycle 2: A vanished while open-ended, B is unchanged.
        let t1 = t0() + chrono::Duration::minutes(11);
        let feed = StubFeed {
            ts: t1,
            alerts: vec![b.clone()],
        };
        let report = importer.import_most_recent(&feed).await.unwrap();
        assert_eq!(report, CycleReport { total: 1, published: 0, premature: 1, skipped_stale: false });

        let messages = importer.channel.published();
        assert_eq!(messages.len(), 3);
        let (ts, payload) = &messages[2];
        assert_eq!(*ts, t1);
        assert_eq!(payload["warnCellId"], "1");
        assert_eq!(payload["end"], t1.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    }

    #[tokio::test]
    async fn alerts_expired_on_schedule_are_not_republished() {
        let mut importer = fresh_importer(AlertFilter::default()).await;
        let ending = alert("1", "Regen", Some(t0() + chrono::Duration::hours(1)));

        let feed = StubFeed {
            ts: t0() + chrono::Duration::minutes(1),
            alerts: vec![ending.clone()],
        };
        importer.import_most_recent(&feed).await.unwrap();

        // Next cycle runs after the declared end; the alert is gone from the
        // feed but ended on schedule.
        let feed = StubFeed {
            ts: t0() + chrono::Duration::hours(2),
            alerts: vec![],
        };
        let report = importer.import_most_recent(&feed).await.unwrap();
        assert_eq!(report.premature, 0);
        assert_eq!(importer.channel.len(), 1);
        assert_eq!(importer.known_count(), 0);
    }

    #[tokio::test]
    async fn changed_alert_under_same_identity_is_republished() {
        let mut importer = fresh_importer(AlertFilter::default()).await;
        let original = alert("1", "Sturm", None);

        let feed = StubFeed {
            ts: t0() + chrono::Duration::minutes(1),
            alerts: vec![original.clone()],
        };
        importer.import_most_recent(&feed).await.unwrap();

        let mut updated = original;
        updated.description = "stronger gusts expected".to_string();
        let feed = StubFeed {
            ts: t0() + chrono::Duration::minutes(11),
            alerts: vec![updated],
        };
        let report = importer.import_most_recent(&feed).await.unwrap();
        assert_eq!(report.published, 1);
        assert_eq!(report.premature, 0);
        assert_eq!(importer.known_count(), 1);
    }

    #[tokio::test]
    async fn filter_applies_before_diffing() {
        let filter = AlertFilter::new(vec!["Region".to_string()], vec![], vec![]);
        let mut importer = fresh_importer(filter).await;

        let mut foreign = alert("9", "Sturm", None);
        foreign.region_name = "Elsewhere".to_string();
        let feed = StubFeed {
            ts: t0() + chrono::Duration::minutes(1),
            alerts: vec![alert("1", "Sturm", None), foreign],
        };
        let report = importer.import_most_recent(&feed).await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.published, 1);
        assert_eq!(importer.known_count(), 1);
    }

    #[tokio::test]
    async fn bootstrap_replays_only_the_most_recent_batch() {
        let channel = MemoryChannel::new();
        let old_ts = t0();
        let new_ts = t0() + chrono::Duration::minutes(10);

        channel.publish(old_ts, &alert("0", "Glätte", None)).await.unwrap();
        channel.publish(new_ts, &alert("1", "Sturm", None)).await.unwrap();
        channel.publish(new_ts, &alert("2", "Regen", None)).await.unwrap();

        let importer = AlertImporter::bootstrap(channel, AlertFilter::default())
            .await
            .unwrap();
        assert_eq!(importer.last_import(), new_ts);
        assert_eq!(importer.known_count(), 2);
    }

    #[tokio::test]
    async fn duplicate_replayed_message_is_absorbed_during_bootstrap() {
        let channel = MemoryChannel::new();
        let batch_ts = t0() + chrono::Duration::minutes(10);
        let repeated = alert("1", "Sturm", None);

        // The same alert published twice within one batch signals a
        // double-import upstream; replay logs it and carries on.
        channel.publish(batch_ts, &repeated).await.unwrap();
        channel.publish(batch_ts, &repeated).await.unwrap();

        let importer = AlertImporter::bootstrap(channel, AlertFilter::default())
            .await
            .unwrap();
        assert_eq!(importer.last_import(), batch_ts);
        assert_eq!(importer.known_count(), 1);
    }

    #[tokio::test]
    async fn bootstrap_on_empty_channel_starts_at_epoch() {
        let importer = fresh_importer(AlertFilter::default()).await;
        assert_eq!(importer.last_import(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(importer.known_count(), 0);
    }

    #[tokio::test]
    async fn replayed_state_suppresses_republish_of_known_alerts() {
        let channel = MemoryChannel::new();
        let batch_ts = t0() + chrono::Duration::minutes(10);
        let known = alert("1", "Sturm", None);
        channel.publish(batch_ts, &known).await.unwrap();

        let mut importer = AlertImporter::bootstrap(channel, AlertFilter::default())
            .await
            .unwrap();

        // The next fetch carries the same alert unchanged plus one new one.
        let feed = StubFeed {
            ts: batch_ts + chrono::Duration::minutes(10),
            alerts: vec![known, alert("2", "Regen", None)],
        };
        let report = importer.import_most_recent(&feed).await.unwrap();
        assert_eq!(report.published, 1);
        assert_eq!(importer.channel.len(), 2);
    }
}
