//! Alert Record Implementation

use crate::AlertKey;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Which feed section an alert originated from.
///
/// The feed provides no other signal distinguishing a live warning from an
/// advance notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// Entry came from the active warnings section.
    Active,
    /// Entry came from the advance-notice section.
    AdvanceNotice,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Active => write!(f, "active"),
            Urgency::AdvanceNotice => write!(f, "advance-notice"),
        }
    }
}

/// A single weather warning, normalized from the raw feed.
///
/// Equality is full structural value equality. `start` and `end` are held in
/// canonical UTC truncated to whole seconds; every construction path goes
/// through [`Alert::normalized`] (or the wire format, which is second
/// precision by definition), and [`Alert::with_end`] preserves the guarantee
/// on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Geographic warning-cell identifier.
    pub warn_cell_id: String,
    /// Human-readable region name.
    pub region_name: String,
    /// Warning start (UTC, second precision).
    #[serde(with = "wire")]
    pub start: DateTime<Utc>,
    /// Warning end; `None` means "until further notice".
    #[serde(with = "wire::optional")]
    pub end: Option<DateTime<Utc>>,
    /// Numeric warning type as assigned by the warning authority.
    #[serde(rename = "type")]
    pub type_code: i32,
    /// Full jurisdiction name.
    pub state: String,
    /// Jurisdiction abbreviation.
    pub state_short: String,
    /// Severity level.
    pub level: i32,
    pub description: String,
    /// Warning category, e.g. "Sturm".
    pub event: String,
    pub headline: String,
    pub instruction: String,
    /// Lower altitude bound in meters, if the warning is altitude-scoped.
    pub altitude_start: Option<i64>,
    /// Upper altitude bound in meters.
    pub altitude_end: Option<i64>,
    pub urgency: Urgency,
}

impl Alert {
    /// Derive the composite identity key for this alert.
    ///
    /// The feed carries no canonical identifier; cell id, event, start time
    /// and altitude bounds identify a warning.
    pub fn key(&self) -> AlertKey {
        AlertKey::new(
            &self.warn_cell_id,
            &self.event,
            self.start,
            self.altitude_start,
            self.altitude_end,
        )
    }

    /// Truncate `start` and `end` to canonical UTC second precision.
    ///
    /// Construction sites that build an `Alert` from arbitrary instants must
    /// pass through here so that equality and the wire format agree.
    pub fn normalized(mut self) -> Self {
        self.start = truncate_to_second(self.start);
        self.end = self.end.map(truncate_to_second);
        self
    }

    /// Replace `end`, keeping the canonical-UTC normalization guarantee.
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(truncate_to_second(end));
        self
    }
}

fn truncate_to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Wire format for timestamps: RFC 3339 UTC at second precision,
/// e.g. `2024-03-01T12:00:00Z`.
mod wire {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }

    pub mod optional {
        use super::FORMAT;
        use chrono::{DateTime, NaiveDateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match ts {
                Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => NaiveDateTime::parse_from_str(&raw, FORMAT)
                    .map(|naive| Some(naive.and_utc()))
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
