//! # Client Error Types
//!
//! Errors raised while talking to the Emporium API.
//!
//! ## Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Transport / HTTP status          ClientError         ListingError      │
//! │  ─────────────────────────        ───────────         ────────────      │
//! │  connect/timeout/body error  ──►  Network         ──► StoreUnavailable  │
//! │  5xx                         ──►  Server          ──► StoreUnavailable  │
//! │  400                         ──►  InvalidRequest  ──► InvalidRequest    │
//! │  401 / 403                   ──►  Unauthorized    ──► (not a listing    │
//! │                                                        error; surfaced) │
//! │  unexpected body             ──►  Decode          ──► StoreUnavailable  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use emporium_core::ListingError;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL or endpoint path could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request never got a response (refused, timed out, body cut off).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered 400.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered 401 or 403.
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The server answered 5xx.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status.
    #[error("Unexpected status {status}: {message}")]
    Unexpected { status: u16, message: String },

    /// The body was not a listing in any known shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request was rejected before leaving the client.
    #[error(transparent)]
    Listing(#[from] ListingError),
}

impl ClientError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => ClientError::InvalidRequest(message),
            401 | 403 => ClientError::Unauthorized { status, message },
            500..=599 => ClientError::Server { status, message },
            _ => ClientError::Unexpected { status, message },
        }
    }

    /// True for failures the listing contract calls `StoreUnavailable`.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Server { .. } | ClientError::Decode(_)
        ) || matches!(self, ClientError::Listing(ListingError::StoreUnavailable(_)))
    }
}

/// Collapses a client failure onto the listing taxonomy.
///
/// `Unauthorized` and other unexpected statuses have no listing
/// counterpart and are reported as an unavailable store.
impl From<ClientError> for ListingError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Listing(inner) => inner,
            ClientError::InvalidRequest(message) => ListingError::InvalidRequest(message),
            ClientError::InvalidUrl(message) => ListingError::InvalidRequest(message),
            other => ListingError::StoreUnavailable(other.to_string()),
        }
    }
}

/// `{"error": "..."}` body the API sends with every failure.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Best-effort message from an error response body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().chars().take(200).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
