//! Alert Inclusion Filter

use alert_model::Alert;
use std::collections::HashSet;
use tracing::error;

/// Optional inclusion filter over region name, warn-cell id, and state
/// abbreviation.
///
/// All three sets empty means no filtering. Otherwise a record is kept if it
/// matches ANY set (union of positive conditions).
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    region_names: HashSet<String>,
    warn_cell_ids: HashSet<String>,
    state_shorts: HashSet<String>,
}

impl AlertFilter {
    pub fn new(
        region_names: Vec<String>,
        warn_cell_ids: Vec<String>,
        state_shorts: Vec<String>,
    ) -> Self {
        Self {
            region_names: region_names.into_iter().collect(),
            warn_cell_ids: warn_cell_ids.into_iter().collect(),
            state_shorts: state_shorts.into_iter().collect(),
        }
    }

    /// Load the three filter lists from the settings source.
    ///
    /// A present-but-wrong-typed list is logged as an error and degrades to
    /// empty; startup never fails on bad filter configuration.
    pub fn from_settings(settings: &config::Config) -> Self {
        Self::new(
            list_setting(settings, "filter.region_names"),
            list_setting(settings, "filter.warn_cell_ids"),
            list_setting(settings, "filter.state_shorts"),
        )
    }

    /// True if no list is configured and filtering is a pass-through.
    pub fn is_empty(&self) -> bool {
        self.region_names.is_empty()
            && self.warn_cell_ids.is_empty()
            && self.state_shorts.is_empty()
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.warn_cell_ids.contains(&alert.warn_cell_id)
            || self.region_names.contains(&alert.region_name)
            || self.state_shorts.contains(&alert.state_short)
    }

    /// Apply the filter, passing everything through when unconfigured.
    pub fn apply(&self, alerts: Vec<Alert>) -> Vec<Alert> {
        if self.is_empty() {
            return alerts;
        }
        alerts
            .into_iter()
            .filter(|alert| self.matches(alert))
            .collect()
    }
}

fn list_setting(settings: &config::Config, key: &str) -> Vec<String> {
    match settings.get::<Vec<String>>(key) {
        Ok(values) => values,
        Err(config::ConfigError::NotFound(_)) => Vec::new(),
        Err(e) => {
            error!("Invalid config for {} will not be used: {}", key, e);
            Vec::new()
        }
    }
}
