//! Domain error types.
//!
//! ```text
//! ValidationError ──► ListingError::InvalidRequest ──► 400
//!                     ListingError::StoreUnavailable ─► 503
//! CartError       ──► returned to the caller, cart unchanged
//! StorageError    ──► logged by the cart, memory state kept
//! ```
//!
//! Store-specific failures (`DbError`, `ClientError`) live in their own
//! crates and convert into [`ListingError`] at the listing seam.

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// A field failed a rule. The message is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Malformed email, unparseable amount.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields that must agree don't (password confirmation).
    #[error("{field} does not match")]
    Mismatch { field: String },
}

// =============================================================================
// Listing Error
// =============================================================================

/// Failures of the paginated listing contract.
///
/// ## Propagation
/// ```text
/// InvalidRequest   ──► HTTP 400, client keeps its previous page
/// StoreUnavailable ──► HTTP 503, client keeps its previous page
/// ```
/// Neither is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    /// Page, page size or search term is out of bounds.
    #[error("Invalid listing request: {0}")]
    InvalidRequest(String),

    /// The backing store (database or remote endpoint) could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<ValidationError> for ListingError {
    fn from(err: ValidationError) -> Self {
        ListingError::InvalidRequest(err.to_string())
    }
}

// =============================================================================
// Cart Error
// =============================================================================

/// Rejected cart mutations.
///
/// Everything else the cart does on a missing line is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantity below 1 (or beyond what a line can hold).
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: i64 },
}

// =============================================================================
// Storage Error
// =============================================================================

/// A cart storage slot could not be written.
///
/// The cart logs these and keeps its in-memory state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Failed to write '{key}': {reason}")]
    Write { key: String, reason: String },
}
