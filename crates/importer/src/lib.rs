//! Import Engine
//!
//! Ties fetch, filter, diff, and publish together: the [`KnownAlerts`] diff
//! store, the startup-configured [`AlertFilter`], and the [`AlertImporter`]
//! orchestrator with its bootstrap replay and per-cycle import.

mod error;
mod filter;
mod orchestrator;
mod store;

pub use error::ImportError;
pub use filter::AlertFilter;
pub use orchestrator::{AlertImporter, CycleReport, FeedSource, REPLAY_LIMIT};
pub use store::KnownAlerts;
