//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
///
/// Only contractually invalid input and storage failures surface here.
/// Format checks, validity checks and payload decoding fail soft and
/// report through their return values instead.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Product IDs start at 1.
    #[error("invalid product id: {0}")]
    InvalidProductId(u32),

    /// User ID is empty or has no usable characters.
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),

    /// Activation limit value outside the accepted range.
    #[error("invalid activation limit: {0}")]
    InvalidActivationLimit(i64),

    /// Installation ID file could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
