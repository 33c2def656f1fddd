//! Error types for the pupil detection pipeline.
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used by
//!
//! - `pupil-ops` - converts `OpsError` into [`Error`] at its public boundary
//! - `pupil-geom` - converts `GeomError` into [`Error`] at its public boundary
//! - `pupil-pipeline` - the top-level `detect` entry point

use thiserror::Error as ThisError;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Input errors that `detect` can encounter before any detection work
/// begins. These correspond to the `InputError` family described for the
/// pipeline: malformed regions or degenerate frames, never failures of the
/// detection algorithm itself.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The requested region of interest does not overlap the frame, or
    /// clips to zero width or height.
    #[error("region of interest ({width}x{height}) is empty after clipping to the frame")]
    InvalidRoi {
        /// Clipped region width
        width: i32,
        /// Clipped region height
        height: i32,
    },

    /// The Haar search box collapsed to an empty rectangle, typically
    /// because the prior search radius and the frame bounds do not
    /// overlap at all.
    #[error("Haar search box is empty")]
    EmptyHaarBox,

    /// A frame or region was given non-positive dimensions.
    #[error("non-positive dimensions: {width}x{height}")]
    NonPositiveDimensions {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },
}

impl Error {
    /// Creates an [`Error::InvalidRoi`] error.
    #[inline]
    pub fn invalid_roi(width: i32, height: i32) -> Self {
        Self::InvalidRoi { width, height }
    }

    /// Creates an [`Error::NonPositiveDimensions`] error.
    #[inline]
    pub fn non_positive_dimensions(width: i32, height: i32) -> Self {
        Self::NonPositiveDimensions { width, height }
    }

    /// Returns `true` if this is a region/bounds related error.
    #[inline]
    pub fn is_region_error(&self) -> bool {
        matches!(self, Self::InvalidRoi { .. } | Self::EmptyHaarBox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_roi_message_contains_dimensions() {
        let err = Error::invalid_roi(0, 12);
        assert!(err.to_string().contains('0'));
        assert!(err.is_region_error());
    }

    #[test]
    fn empty_haar_box_is_region_error() {
        assert!(Error::EmptyHaarBox.is_region_error());
    }

    #[test]
    fn non_positive_dimensions_is_not_region_error() {
        let err = Error::non_positive_dimensions(-1, 4);
        assert!(!err.is_region_error());
    }
}
