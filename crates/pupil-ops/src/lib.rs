//! # pupil-ops
//!
//! Per-pixel and per-frame operations for pupil detection.
//!
//! This crate provides the individual image-processing stages the
//! detection pipeline sequences frame by frame: glint and approximate
//! pupil location, edge extraction, morphological sharpening, edge
//! segmentation into arcs, and arc scoring.
//!
//! # Modules
//!
//! - [`integral`] - Summed-area table construction and rectangle queries
//! - [`glint`] - Specular glint locator
//! - [`haar`] - Haar-like approximate pupil locator
//! - [`blur`] - Gaussian blur kernels
//! - [`canny`] - Without-prior Sobel/Canny edge extraction
//! - [`radial`] - With-prior radial-gradient edge extraction
//! - [`hysteresis`] - Shared hysteresis edge tracking
//! - [`sharpen`] - Morphological edge sharpening
//! - [`segment`] - Edge segmentation into ordered arcs
//! - [`score`] - Arc scoring and top-N retention
//!
//! # Dependencies
//!
//! - [`tracing`] - stage-boundary spans and per-stage result logging
//!   (`extract_edges`, `detect_glint`, `detect_pupil_haar`, `segment_edges`,
//!   `score_arcs`), so a caller's subscriber can trace one frame's pipeline
//!   without instrumenting `pupil-pipeline` a second time.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod integral;
pub mod glint;
pub mod haar;
pub mod blur;
pub mod canny;
pub mod radial;
pub mod hysteresis;
pub mod sharpen;
pub mod segment;
pub mod score;

pub use error::{OpsError, OpsResult};
