//! Alert Data Model
//!
//! Provides the normalized [`Alert`] record, its [`AlertKey`] identity, and
//! the JSON wire format shared by the feed importer and the publish channel.

mod alert;
mod key;

pub use alert::{Alert, Urgency};
pub use key::AlertKey;
