//! Daemon settings
//!
//! Layered from an optional `config/import` file and `IMPORT_`-prefixed
//! environment variables. The filter lists are read separately through
//! [`importer::AlertFilter::from_settings`] because they tolerate wrong
//! types; everything here must deserialize cleanly or startup aborts.

use channel::MqttConfig;
use config::{Config, ConfigError, Environment, File};
use feed_client::FeedConfig;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub feed: FeedSection,
    pub mqtt: MqttSection,
    pub schedule: ScheduleSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        let defaults = FeedConfig::default();
        Self {
            url: defaults.url,
            user_agent: defaults.user_agent,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

impl From<&FeedSection> for FeedConfig {
    fn from(section: &FeedSection) -> Self {
        Self {
            url: section.url.clone(),
            user_agent: section.user_agent.clone(),
            timeout: Duration::from_secs(section.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttSection {
    pub broker_url: String,
    pub broker_port: u16,
    pub topic: String,
    pub journal_path: String,
}

impl Default for MqttSection {
    fn default() -> Self {
        let defaults = MqttConfig::default();
        Self {
            broker_url: defaults.broker_url,
            broker_port: defaults.broker_port,
            topic: defaults.topic,
            journal_path: defaults.journal_path.display().to_string(),
        }
    }
}

impl From<&MqttSection> for MqttConfig {
    fn from(section: &MqttSection) -> Self {
        Self {
            broker_url: section.broker_url.clone(),
            broker_port: section.broker_port,
            topic: section.topic.clone(),
            journal_path: section.journal_path.clone().into(),
            ..MqttConfig::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub interval_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

impl Settings {
    /// Load settings, returning both the typed view and the raw source the
    /// filter lists are read from.
    pub fn load() -> Result<(Self, Config), ConfigError> {
        let raw = Config::builder()
            .add_source(File::with_name("config/import").required(false))
            .add_source(Environment::with_prefix("IMPORT").separator("__"))
            .build()?;
        let settings = raw.clone().try_deserialize()?;
        Ok((settings, raw))
    }
}
