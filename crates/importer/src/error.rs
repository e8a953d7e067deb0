//! Import Error Types

use thiserror::Error;

/// Errors escaping an import cycle or bootstrap
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Feed error: {0}")]
    Feed(#[from] feed_client::FeedError),

    #[error("Channel error: {0}")]
    Channel(#[from] channel::ChannelError),
}
