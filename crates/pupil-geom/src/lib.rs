//! # pupil-geom
//!
//! Ellipse geometry for the pupil detection pipeline: the constrained
//! direct conic fit used by the ellipse-fitting stage, and the curvature
//! band that the edge-segmentation stage splits arcs against.
//!
//! # Modules
//!
//! - [`ellipse`] - Fitzgibbon direct least-squares ellipse fit and the
//!   rotation transform that derives size/shape/position from conic
//!   coefficients.
//! - [`curvature`] - the two empirically-fit degree-5 curvature-band
//!   polynomials, stored as coefficient tables rather than inline code.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod curvature;
mod error;
pub mod ellipse;

pub use error::{GeomError, GeomResult};
pub use ellipse::{Ellipse, RotatedEllipseParams};
