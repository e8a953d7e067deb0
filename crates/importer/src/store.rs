//! Known-Alert Store

use alert_model::{Alert, AlertKey};
use std::collections::{HashMap, HashSet};

/// In-memory map from alert identity to the most recently seen record.
///
/// Represents "currently active, as far as we know". Mutated only inside a
/// cycle; cycles are strictly serialized by the caller, so no locking.
#[derive(Debug, Default)]
pub struct KnownAlerts {
    known: HashMap<AlertKey, Alert>,
}

impl KnownAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an alert unless it is already known with an identical value.
    ///
    /// Returns true for a brand-new alert or a changed one (same identity,
    /// different fields) — both must be published. Returns false for an
    /// exact repeat.
    pub fn insert_if_changed(&mut self, alert: Alert) -> bool {
        let key = alert.key();
        if self.known.get(&key) == Some(&alert) {
            return false;
        }
        self.known.insert(key, alert);
        true
    }

    /// Remove every stored alert whose identity is absent from `current`,
    /// returning the removed records.
    pub fn remove_missing(&mut self, current: &[Alert]) -> Vec<Alert> {
        if self.known.is_empty() {
            return Vec::new();
        }
        let keep: HashSet<AlertKey> = current.iter().map(Alert::key).collect();
        let stale: Vec<AlertKey> = self
            .known
            .keys()
            .filter(|key| !keep.contains(key))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter_map(|key| self.known.remove(&key))
            .collect()
    }

    /// Number of currently known alerts.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
