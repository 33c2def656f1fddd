//! Error type for `pupil-ops` operations.

use thiserror::Error;

/// Result alias using [`OpsError`].
pub type OpsResult<T> = std::result::Result<T, OpsError>;

/// Errors raised by the per-pixel and per-frame operations in this crate.
#[derive(Debug, Error)]
pub enum OpsError {
    /// A plane or kernel had invalid dimensions (zero, even where odd is
    /// required, or mismatched against its backing data).
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A parameter fell outside the range an operation requires.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
