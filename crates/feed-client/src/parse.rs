//! Raw Feed Parsing and Entry Transformation

use crate::FeedError;
use alert_model::{Alert, Urgency};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// The feed wraps its JSON payload in a function-call expression.
const PAYLOAD_PREFIX: &str = "warnWetter.loadWarnings(";
const PAYLOAD_SUFFIX: &str = ");";

/// Raw entry as it appears inside the feed's per-cell lists.
///
/// `start` and `end` must be present as keys; `end` may hold null. Text
/// fields are nullable in the feed and degrade to empty strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    start: i64,
    #[serde(deserialize_with = "nullable_millis")]
    end: Option<i64>,
    #[serde(rename = "type")]
    type_code: i32,
    region_name: String,
    state: String,
    state_short: String,
    level: i32,
    description: Option<String>,
    event: String,
    headline: Option<String>,
    instruction: Option<String>,
    altitude_start: Option<i64>,
    altitude_end: Option<i64>,
}

/// Requires the key to be present while still accepting a null value.
/// A plain `Option` field would silently default a missing key to `None`.
fn nullable_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::deserialize(deserializer)
}

/// Unwrap the JSONP envelope and transform the document into alert records.
///
/// Returns the feed's reported timestamp and all entries from both the
/// active-warnings and the advance-notice sections. A missing top-level key
/// is [`FeedError::MalformedReply`]; a broken individual entry is
/// [`FeedError::MalformedEntry`] and fails the whole call.
pub fn parse_feed(body: &str) -> Result<(DateTime<Utc>, Vec<Alert>), FeedError> {
    let trimmed = body.trim();
    let inner = trimmed.strip_prefix(PAYLOAD_PREFIX).unwrap_or(trimmed);
    let inner = inner.strip_suffix(PAYLOAD_SUFFIX).unwrap_or(inner);

    let root: Value =
        serde_json::from_str(inner).map_err(|e| FeedError::MalformedReply(e.to_string()))?;

    let warnings = section(&root, "warnings")?;
    let advance = section(&root, "vorabInformation")?;
    let time_ms = root
        .get("time")
        .and_then(Value::as_i64)
        .ok_or_else(|| FeedError::MalformedReply("missing key: time".to_string()))?;
    let feed_ts = millis_to_utc(time_ms)
        .ok_or_else(|| FeedError::MalformedReply(format!("time out of range: {time_ms}")))?;

    let mut alerts = Vec::new();
    collect_section(warnings, Urgency::Active, &mut alerts)?;
    collect_section(advance, Urgency::AdvanceNotice, &mut alerts)?;

    Ok((feed_ts, alerts))
}

fn section<'a>(
    root: &'a Value,
    key: &str,
) -> Result<&'a serde_json::Map<String, Value>, FeedError> {
    root.get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| FeedError::MalformedReply(format!("missing key: {key}")))
}

fn collect_section(
    cells: &serde_json::Map<String, Value>,
    urgency: Urgency,
    out: &mut Vec<Alert>,
) -> Result<(), FeedError> {
    for (cell_id, entries) in cells {
        let entries = entries.as_array().ok_or_else(|| FeedError::MalformedEntry {
            cell_id: cell_id.clone(),
            reason: "cell value is not a list".to_string(),
        })?;
        for raw in entries {
            out.push(transform_entry(cell_id, urgency, raw)?);
        }
    }
    Ok(())
}

fn transform_entry(cell_id: &str, urgency: Urgency, raw: &Value) -> Result<Alert, FeedError> {
    let malformed = |reason: String| FeedError::MalformedEntry {
        cell_id: cell_id.to_string(),
        reason,
    };

    let object = raw
        .as_object()
        .ok_or_else(|| malformed("entry is not an object".to_string()))?;
    if !object.contains_key("start") || !object.contains_key("end") {
        return Err(malformed("missing start or end key".to_string()));
    }

    let entry: RawEntry =
        serde_json::from_value(raw.clone()).map_err(|e| malformed(e.to_string()))?;

    let start = millis_to_utc(entry.start)
        .ok_or_else(|| malformed(format!("start out of range: {}", entry.start)))?;
    let end = match entry.end {
        Some(ms) => {
            Some(millis_to_utc(ms).ok_or_else(|| malformed(format!("end out of range: {ms}")))?)
        }
        None => None,
    };

    Ok(Alert {
        warn_cell_id: cell_id.to_string(),
        region_name: entry.region_name,
        start,
        end,
        type_code: entry.type_code,
        state: entry.state,
        state_short: entry.state_short,
        level: entry.level,
        description: entry.description.unwrap_or_default(),
        event: entry.event,
        headline: entry.headline.unwrap_or_default(),
        instruction: entry.instruction.unwrap_or_default(),
        altitude_start: entry.altitude_start,
        altitude_end: entry.altitude_end,
        urgency,
    }
    .normalized())
}

fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
