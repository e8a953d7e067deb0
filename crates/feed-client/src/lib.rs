//! Feed Fetch and Transform
//!
//! Retrieves the public warning feed, unwraps its JSONP envelope, validates
//! the top-level structure, and produces normalized [`alert_model::Alert`]
//! records plus the feed's reported timestamp.

mod client;
mod error;
mod parse;

pub use client::{FeedClient, FeedConfig};
pub use error::FeedError;
pub use parse::parse_feed;
