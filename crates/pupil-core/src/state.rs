//! Running tracker state, carried by the caller from frame to frame.
//!
//! Unlike [`crate::config::DetectionConfig`], every field here changes on
//! each call to `detect`: predictions, running averages, momenta, the most
//! recent exact measurement, and the adaptive thresholds that contract on a
//! detection and relax on a miss.
//!
//! # Dependencies
//!
//! - [`serde`] - (de)serialization, for callers that checkpoint state
//!   between sessions.

use serde::{Deserialize, Serialize};

/// The tracker's running state, `V` in the pipeline's data model.
///
/// `detect` consumes one `TrackerState` by reference (the prior) and
/// produces a new one (`V'`); it never mutates the prior in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    // --- predictions ---
    /// Predicted pupil centre X, in image coordinates.
    pub x_pos_predicted: f64,
    /// Predicted pupil centre Y, in image coordinates.
    pub y_pos_predicted: f64,
    /// Predicted ellipse bounding width.
    pub width_prediction: f64,
    /// Predicted ellipse bounding height.
    pub height_prediction: f64,
    /// Predicted ellipse circumference.
    pub circumference_prediction: f64,
    /// Predicted ellipse aspect ratio.
    pub aspect_ratio_prediction: f64,
    /// Predicted search radius driver: half the predicted circumference.
    pub radius_prediction: f64,
    /// Predicted mean arc intensity.
    pub edge_intensity_prediction: f64,
    /// Predicted signed arc curvature, used by the with-prior scorer.
    pub edge_curvature_prediction: f64,

    // --- running averages, mirroring the predictions ---
    /// Running average of `x_pos_predicted`.
    pub x_pos_average: f64,
    /// Running average of `y_pos_predicted`.
    pub y_pos_average: f64,
    /// Running average of `width_prediction`.
    pub width_average: f64,
    /// Running average of `height_prediction`.
    pub height_average: f64,
    /// Running average of `circumference_prediction`.
    pub circumference_average: f64,
    /// Running average of `aspect_ratio_prediction`.
    pub aspect_ratio_average: f64,
    /// Running average of `radius_prediction`.
    pub radius_average: f64,
    /// Running average of `edge_intensity_prediction`.
    pub edge_intensity_average: f64,

    // --- momenta ---
    /// X velocity momentum.
    pub x_velocity: f64,
    /// Y velocity momentum.
    pub y_velocity: f64,
    /// Width momentum.
    pub width_momentum: f64,
    /// Height momentum.
    pub height_momentum: f64,
    /// Circumference momentum.
    pub circumference_momentum: f64,
    /// Aspect-ratio momentum.
    pub aspect_ratio_momentum: f64,
    /// Radius momentum.
    pub radius_momentum: f64,

    // --- last exact measurement ---
    /// Last fitted ellipse centre X, or carried prior on a miss.
    pub x_pos_exact: f64,
    /// Last fitted ellipse centre Y, or carried prior on a miss.
    pub y_pos_exact: f64,
    /// Last fitted ellipse aspect ratio, or carried prior on a miss.
    pub aspect_ratio_exact: f64,
    /// Last fitted ellipse circumference, or carried prior on a miss.
    pub circumference_exact: f64,

    // --- adaptive thresholds ---
    /// Search radius used by the ROI planner; grows on a miss, contracts on
    /// a detection.
    pub search_radius: f64,
    /// Half-width of the curvature band (degrees); relaxes on a miss.
    pub curvature_offset: f64,
    /// Selection-scoring scale for circumference deviation; relaxes on a
    /// miss.
    pub threshold_circumference_change: f64,
    /// Selection-scoring scale for aspect-ratio deviation; relaxes on a
    /// miss.
    pub threshold_aspect_ratio_change: f64,

    /// Tracking confidence in `[certainty_lower_limit, certainty_upper_limit]`.
    pub prior_certainty: f64,

    /// `true` if this state resulted from an accepted ellipse fit.
    pub pupil_detected: bool,
    /// `true` if `detect` could not even run the pipeline (degenerate ROI).
    pub error_detected: bool,

    /// Debug/visualization data produced alongside `V'`; never consumed by
    /// `detect` itself on a later call.
    pub overlay: DrawOverlay,
}

impl TrackerState {
    /// A state with position at the origin, shape seeded to a
    /// `circumference_min`-sized circle, zero momentum, and certainty at its
    /// lower limit — a reasonable value to seed a session that has not yet
    /// observed a frame.
    pub fn initial(config: &crate::config::DetectionConfig) -> Self {
        Self {
            x_pos_predicted: 0.0,
            y_pos_predicted: 0.0,
            width_prediction: config.circumference_min / std::f64::consts::PI,
            height_prediction: config.circumference_min / std::f64::consts::PI,
            circumference_prediction: config.circumference_min,
            aspect_ratio_prediction: 1.0,
            radius_prediction: config.circumference_min / (2.0 * std::f64::consts::PI),
            edge_intensity_prediction: 0.0,
            edge_curvature_prediction: 0.0,

            x_pos_average: 0.0,
            y_pos_average: 0.0,
            width_average: config.circumference_min / std::f64::consts::PI,
            height_average: config.circumference_min / std::f64::consts::PI,
            circumference_average: config.circumference_min,
            aspect_ratio_average: 1.0,
            radius_average: config.circumference_min / (2.0 * std::f64::consts::PI),
            edge_intensity_average: 0.0,

            x_velocity: 0.0,
            y_velocity: 0.0,
            width_momentum: 0.0,
            height_momentum: 0.0,
            circumference_momentum: 0.0,
            aspect_ratio_momentum: 0.0,
            radius_momentum: 0.0,

            x_pos_exact: 0.0,
            y_pos_exact: 0.0,
            aspect_ratio_exact: 1.0,
            circumference_exact: config.circumference_min,

            search_radius: config.circumference_min,
            curvature_offset: config.curvature_offset_min,
            threshold_circumference_change: config.circumference_change_threshold,
            threshold_aspect_ratio_change: config.aspect_ratio_change_threshold,

            prior_certainty: config.certainty_lower_limit,

            pupil_detected: false,
            error_detected: false,

            overlay: DrawOverlay::default(),
        }
    }
}

/// A reduced prior for a second, simultaneously tracked feature.
///
/// Carries only what the search-region planner needs to exclude the other
/// feature's search disc (§4.1); it is not a full [`TrackerState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OtherPriorState {
    /// Other feature's predicted centre X.
    pub x_pos_predicted: f64,
    /// Other feature's predicted centre Y.
    pub y_pos_predicted: f64,
    /// Other feature's search radius.
    pub search_radius: f64,
    /// Whether the exclusion should be applied at all.
    pub detection_on: bool,
}

/// Visualization/debug data produced by one call to `detect`.
///
/// None of these fields are read back by a later call; they exist purely so
/// a caller building an overlay (explicitly out of scope for this crate)
/// has somewhere to source the data from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawOverlay {
    /// Haar search box, in frame-absolute coordinates, as `(x, y, w, h)`.
    pub haar_box: Option<(i32, i32, i32, i32)>,
    /// Glint box, in frame-absolute coordinates, as `(x, y, w, h)`.
    pub glint_box: Option<(i32, i32, i32, i32)>,
    /// Accepted edge-map pixel indices, in crop-local coordinates.
    pub edge_indices: Vec<(i32, i32)>,
    /// Conic coefficients `[A, B, C, D, E, F]` of the selected ellipse fit.
    pub ellipse_coefficients: Option<[f64; 6]>,
}
