//! # pupil-pipeline
//!
//! Per-frame orchestration for the pupil detection pipeline.
//!
//! This crate owns the pieces that span more than one image operation: the
//! search-region planner, the combinatorial ellipse subset
//! enumeration/selection, the temporal state updater, and the `detect` entry
//! point that sequences all of it. The individual image operations
//! themselves live in `pupil-ops` and `pupil-geom`.
//!
//! # Modules
//!
//! - [`roi`] - search-region planner (§4.1)
//! - [`fit_select`] - combinatorial ellipse fitting and selection (§4.8)
//! - [`temporal`] - temporal state update (§4.9)
//! - [`flash`] - mean-intensity helper for caller-driven exposure guards
//! - [`pipeline`] - the `detect` entry point
//!
//! # Example
//!
//! ```rust,ignore
//! use pupil_core::{DetectionConfig, TrackerState};
//! use pupil_pipeline::detect;
//!
//! let config = DetectionConfig::default();
//! let prior = TrackerState::initial(&config);
//! let next = detect(&frame, &config, &prior, None);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod fit_select;
pub mod flash;
mod pipeline;
pub mod roi;
pub mod temporal;

#[cfg(test)]
mod test_support;

pub use pipeline::detect;
