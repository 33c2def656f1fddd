//! # pupil-core
//!
//! Shared types for the pupil detection pipeline.
//!
//! This crate has no pipeline logic of its own: it defines the image buffer,
//! rectangle/region-of-interest geometry, the per-session configuration
//! (`DetectionConfig`), the running tracker state (`TrackerState`), and the
//! error type that every other crate in this workspace converts into at its
//! public boundary.
//!
//! # Modules
//!
//! - [`error`] - Unified error type
//! - [`rect`] - Axis-aligned rectangles and region-of-interest clipping
//! - [`image`] - Owned grayscale and BGR pixel buffers
//! - [`config`] - `DetectionConfig`, the immutable per-session tuning surface
//! - [`state`] - `TrackerState`, the value carried frame to frame

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
mod error;
pub mod image;
pub mod rect;
pub mod state;

pub use config::DetectionConfig;
pub use error::{Error, Result};
pub use image::{BgrImage, GrayImage};
pub use rect::Rect;
pub use state::{DrawOverlay, OtherPriorState, TrackerState};
