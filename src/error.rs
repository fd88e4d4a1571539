//! Error types for the drawer core.
//!
//! Decode failures never show up here: they are absorbed by
//! [`imagedrawer_metadata::extract`]. What remains are network failures,
//! which the caller surfaces per item, and misuse of the item lifecycle.

use crate::context::ItemId;
use crate::gate::LoadPhase;

/// Result type for drawer operations.
pub type Result<T> = std::result::Result<T, DrawerError>;

/// Error type for drawer operations.
#[derive(Debug, thiserror::Error)]
pub enum DrawerError {
    /// The request could not be sent or its body could not be read.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status} for {path}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request path (without host).
        path: String,
    },

    /// An event arrived in a lifecycle phase that cannot accept it.
    #[error("Cannot {event} while {from}")]
    InvalidTransition {
        /// Phase the item was in.
        from: LoadPhase,
        /// Event that was rejected.
        event: &'static str,
    },

    /// The task fetching media for an item ended without a result.
    #[error("Fetch for drawer item {0} did not complete")]
    FetchAborted(ItemId),

    /// The item id is not (or no longer) part of the drawer.
    #[error("Unknown drawer item {0}")]
    UnknownItem(ItemId),
}

impl DrawerError {
    /// Whether this error came from talking to the backend.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { .. })
    }
}
