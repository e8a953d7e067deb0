//! Feed Error Types

use thiserror::Error;

/// Errors from feed retrieval and transformation.
///
/// Transport failures and a malformed top level are recovered inside
/// [`crate::FeedClient::fetch_current`] (logged, empty result); only entry
/// malformation and client setup escape to the caller.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// The reply is not the expected wrapped JSON document.
    #[error("Malformed feed reply: {0}")]
    MalformedReply(String),

    /// A raw entry is missing required keys or has unusable values.
    /// Aborts the whole transform for this cycle.
    #[error("Malformed alert entry in cell {cell_id}: {reason}")]
    MalformedEntry { cell_id: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("Feed client setup failed: {0}")]
    ClientSetup(String),
}
