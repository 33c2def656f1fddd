//! Error type for geometry operations.

use thiserror::Error;

/// Result alias using [`GeomError`].
pub type GeomResult<T> = std::result::Result<T, GeomError>;

/// Failure modes of the conic fit. These correspond to the pipeline's
/// `NumericFailure` category: they are never propagated as a hard error by
/// the caller, just treated as "this subset did not produce a usable
/// ellipse" (see `pupil-pipeline::fit_select`).
#[derive(Debug, Error)]
pub enum GeomError {
    /// Fewer than six points were supplied; the 6x6 scatter matrix would be
    /// rank-deficient.
    #[error("at least 6 points are required to fit a conic, got {0}")]
    TooFewPoints(usize),

    /// The scatter matrix `DesignMatrix^T * DesignMatrix` is singular.
    #[error("scatter matrix is singular")]
    SingularScatter,

    /// No eigenvalue of `Scatter^-1 * Constraint` was both real and
    /// strictly positive (within the `1e-11` tolerance the original
    /// eye-tracking implementation this was grounded on uses).
    #[error("no positive real eigenvalue found")]
    NoPositiveEigenvalue,

    /// The fitted conic coefficients produced a non-finite geometric
    /// quantity (semi-axis, centre, or angle).
    #[error("ellipse geometry is not finite")]
    NonFiniteGeometry,
}
