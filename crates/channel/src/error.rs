//! Channel Error Types

use thiserror::Error;

/// Publish/replay channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Journal error: {0}")]
    Journal(String),
}
