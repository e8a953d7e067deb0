//! Alert Identity Key

use chrono::{DateTime, Utc};

/// Composite identity of a warning.
///
/// A constructed value rather than a concatenated string, so field values
/// containing a delimiter cannot collide. Two alerts may share a key while
/// differing in other fields; that is an update to the same warning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    warn_cell_id: String,
    event: String,
    start: DateTime<Utc>,
    altitude_start: Option<i64>,
    altitude_end: Option<i64>,
}

impl AlertKey {
    pub fn new(
        warn_cell_id: &str,
        event: &str,
        start: DateTime<Utc>,
        altitude_start: Option<i64>,
        altitude_end: Option<i64>,
    ) -> Self {
        Self {
            warn_cell_id: warn_cell_id.to_string(),
            event: event.to_string(),
            start,
            altitude_start,
            altitude_end,
        }
    }
}
