//! Temporal state update (§4.9): blends a selected ellipse fit into the
//! running predictions, averages, and momenta, or decays them toward the
//! prior on a miss.

use pupil_core::{DetectionConfig, TrackerState};

/// One exponentially-blended quantity: a running average, a prediction, and
/// the momentum that carries one-step prediction deltas forward.
struct Tracked {
    average: f64,
    prediction: f64,
    momentum: f64,
}

fn update_on_detection(t: &Tracked, measurement: f64, beta_a: f64, beta_p: f64, beta_m: f64) -> Tracked {
    let average = t.average + beta_a * (t.prediction - t.average);
    let prediction = t.prediction + beta_p * (measurement - t.prediction) + t.momentum;
    let momentum = t.momentum + beta_m * (prediction - t.prediction);
    Tracked { average, prediction, momentum }
}

fn update_without_momentum(average: f64, prediction: f64, measurement: f64, beta_a: f64, beta_p: f64) -> (f64, f64) {
    let new_average = average + beta_a * (prediction - average);
    let new_prediction = prediction + beta_p * (measurement - prediction);
    (new_average, new_prediction)
}

/// Blends an accepted fit's measurements into `prior`, producing the
/// successor state's geometric and adaptive fields.
///
/// `measurement` is `(aspect_ratio, circumference, width, height, radius,
/// x_pos, y_pos, edge_intensity, edge_curvature)`, the exact values read
/// off the winning ellipse and its constituent arcs; `haar_side` is the
/// Haar box side used this frame, needed for the search-radius clamp.
#[allow(clippy::too_many_arguments)]
pub fn on_detection(
    prior: &TrackerState,
    config: &DetectionConfig,
    measurement: (f64, f64, f64, f64, f64, f64, f64, f64, f64),
    haar_side: f64,
    image_width: i32,
    image_height: i32,
) -> TrackerState {
    let (aspect_ratio, circumference, width, height, radius, x_pos, y_pos, edge_intensity, edge_curvature) =
        measurement;
    let beta_a = config.alpha_average;
    let beta_p = config.alpha_prediction;
    let beta_m = config.alpha_momentum;
    let beta_x = config.alpha_miscellaneous;

    let mut next = *prior;

    let aspect = update_on_detection(
        &Tracked { average: prior.aspect_ratio_average, prediction: prior.aspect_ratio_prediction, momentum: prior.aspect_ratio_momentum },
        aspect_ratio,
        beta_a,
        beta_p,
        beta_m,
    );
    next.aspect_ratio_average = aspect.average;
    next.aspect_ratio_prediction = aspect.prediction;
    next.aspect_ratio_momentum = aspect.momentum;

    let circ = update_on_detection(
        &Tracked { average: prior.circumference_average, prediction: prior.circumference_prediction, momentum: prior.circumference_momentum },
        circumference,
        beta_a,
        beta_p,
        beta_m,
    );
    next.circumference_average = circ.average;
    next.circumference_prediction = circ.prediction;
    next.circumference_momentum = circ.momentum;

    let w = update_on_detection(
        &Tracked { average: prior.width_average, prediction: prior.width_prediction, momentum: prior.width_momentum },
        width,
        beta_a,
        beta_p,
        beta_m,
    );
    next.width_average = w.average;
    next.width_prediction = w.prediction;
    next.width_momentum = w.momentum;

    let h = update_on_detection(
        &Tracked { average: prior.height_average, prediction: prior.height_prediction, momentum: prior.height_momentum },
        height,
        beta_a,
        beta_p,
        beta_m,
    );
    next.height_average = h.average;
    next.height_prediction = h.prediction;
    next.height_momentum = h.momentum;

    let r = update_on_detection(
        &Tracked { average: prior.radius_average, prediction: prior.radius_prediction, momentum: prior.radius_momentum },
        radius,
        beta_a,
        beta_p,
        beta_m,
    );
    next.radius_average = r.average;
    next.radius_prediction = r.prediction;
    next.radius_momentum = r.momentum;

    let x = update_on_detection(
        &Tracked { average: prior.x_pos_average, prediction: prior.x_pos_predicted, momentum: prior.x_velocity },
        x_pos,
        beta_a,
        beta_p,
        beta_m,
    );
    next.x_pos_average = x.average;
    next.x_pos_predicted = x.prediction;
    next.x_velocity = x.momentum;

    let y = update_on_detection(
        &Tracked { average: prior.y_pos_average, prediction: prior.y_pos_predicted, momentum: prior.y_velocity },
        y_pos,
        beta_a,
        beta_p,
        beta_m,
    );
    next.y_pos_average = y.average;
    next.y_pos_predicted = y.prediction;
    next.y_velocity = y.momentum;

    let (edge_avg, edge_pred) = update_without_momentum(
        prior.edge_intensity_average,
        prior.edge_intensity_prediction,
        edge_intensity,
        beta_a,
        beta_p,
    );
    next.edge_intensity_average = edge_avg;
    next.edge_intensity_prediction = edge_pred;

    if edge_curvature < 180.0 {
        next.edge_curvature_prediction = next.edge_curvature_prediction + beta_p * (edge_curvature - next.edge_curvature_prediction);
    }

    next.x_pos_exact = x_pos;
    next.y_pos_exact = y_pos;
    next.aspect_ratio_exact = aspect_ratio;
    next.circumference_exact = circumference;

    next.curvature_offset = prior.curvature_offset * beta_x;
    next.search_radius = prior.search_radius * beta_x;
    next.threshold_circumference_change = prior.threshold_circumference_change * beta_x;
    next.threshold_aspect_ratio_change = prior.threshold_aspect_ratio_change * beta_x;
    next.prior_certainty = prior.prior_certainty / beta_x;

    next.pupil_detected = true;
    next.error_detected = false;

    clamp(&mut next, config, haar_side, image_width, image_height);
    next
}

/// Drifts `(average, prediction, momentum)` on a miss: the average still
/// drifts toward the held prediction, momentum decays by `beta_m`, and the
/// prediction drifts toward the freshly-updated average by `beta_p` (not
/// toward the decayed momentum).
fn drift_with_momentum_miss(average: f64, prediction: f64, momentum: f64, beta_a: f64, beta_p: f64, beta_m: f64) -> (f64, f64, f64) {
    let new_average = average + beta_a * (prediction - average);
    let new_momentum = momentum * beta_m;
    let new_prediction = prediction + beta_p * (new_average - prediction);
    (new_average, new_prediction, new_momentum)
}

/// As [`drift_with_momentum_miss`], for a quantity with no momentum term.
/// The prediction drifts toward the *old* average, not the one just
/// computed on this same call.
fn drift_without_momentum_miss(average: f64, prediction: f64, beta_a: f64, beta_p: f64) -> (f64, f64) {
    let new_average = average + beta_a * (prediction - average);
    let new_prediction = prediction + beta_p * (average - prediction);
    (new_average, new_prediction)
}

/// Decays `prior` toward itself on a miss (§4.9's no-detection branch):
/// aspect ratio, circumference, width, and height drift their averages
/// toward the held prediction and their predictions toward that new
/// average; edge intensity does the same but against its *old* average;
/// radius has no average of its own and is recomputed directly from the
/// refreshed circumference prediction; position drifts toward the centre
/// of this frame's Haar search box (`haar_centre`, or the held position
/// itself if none was planned this frame) plus carried velocity; momenta
/// decay by `beta_m`, certainty shrinks, and the relaxation thresholds
/// dilate.
pub fn on_miss(
    prior: &TrackerState,
    config: &DetectionConfig,
    haar_side: f64,
    haar_centre: Option<(f64, f64)>,
    image_width: i32,
    image_height: i32,
) -> TrackerState {
    let beta_a = config.alpha_average;
    let beta_p = config.alpha_prediction;
    let beta_m = config.alpha_momentum;
    let beta_x = config.alpha_miscellaneous;

    let mut next = *prior;

    let (a_avg, a_pred, a_mom) =
        drift_with_momentum_miss(prior.aspect_ratio_average, prior.aspect_ratio_prediction, prior.aspect_ratio_momentum, beta_a, beta_p, beta_m);
    next.aspect_ratio_average = a_avg;
    next.aspect_ratio_prediction = a_pred;
    next.aspect_ratio_momentum = a_mom;

    let (c_avg, c_pred, c_mom) =
        drift_with_momentum_miss(prior.circumference_average, prior.circumference_prediction, prior.circumference_momentum, beta_a, beta_p, beta_m);
    next.circumference_average = c_avg;
    next.circumference_prediction = c_pred;
    next.circumference_momentum = c_mom;

    let (w_avg, w_pred, w_mom) =
        drift_with_momentum_miss(prior.width_average, prior.width_prediction, prior.width_momentum, beta_a, beta_p, beta_m);
    next.width_average = w_avg;
    next.width_prediction = w_pred;
    next.width_momentum = w_mom;

    let (h_avg, h_pred, h_mom) =
        drift_with_momentum_miss(prior.height_average, prior.height_prediction, prior.height_momentum, beta_a, beta_p, beta_m);
    next.height_average = h_avg;
    next.height_prediction = h_pred;
    next.height_momentum = h_mom;

    next.radius_momentum = prior.radius_momentum * beta_m;
    next.radius_prediction = c_pred / (2.0 * std::f64::consts::PI);

    let (e_avg, e_pred) = drift_without_momentum_miss(prior.edge_intensity_average, prior.edge_intensity_prediction, beta_a, beta_p);
    next.edge_intensity_average = e_avg;
    next.edge_intensity_prediction = e_pred;

    let (target_x, target_y) = haar_centre.unwrap_or((prior.x_pos_predicted, prior.y_pos_predicted));
    next.x_pos_predicted = prior.x_pos_predicted + beta_p * (target_x - prior.x_pos_predicted) + prior.x_velocity;
    next.x_velocity = prior.x_velocity * beta_m;
    next.y_pos_predicted = prior.y_pos_predicted + beta_p * (target_y - prior.y_pos_predicted) + prior.y_velocity;
    next.y_velocity = prior.y_velocity * beta_m;

    next.curvature_offset = prior.curvature_offset / beta_x;
    next.search_radius = prior.search_radius / beta_x;
    next.threshold_circumference_change = prior.threshold_circumference_change / beta_x;
    next.threshold_aspect_ratio_change = prior.threshold_aspect_ratio_change / beta_x;
    next.prior_certainty = prior.prior_certainty * beta_x;

    next.pupil_detected = false;
    next.error_detected = false;

    clamp(&mut next, config, haar_side, image_width, image_height);
    next
}

fn clamp(state: &mut TrackerState, config: &DetectionConfig, haar_side: f64, image_width: i32, image_height: i32) {
    let min_radius = (0.5 * haar_side).ceil();
    let max_radius = image_width.min(image_height) as f64;
    state.search_radius = state.search_radius.clamp(min_radius, max_radius.max(min_radius));

    state.threshold_circumference_change =
        state.threshold_circumference_change.clamp(config.circumference_change_threshold, config.circumference_max);
    state.threshold_aspect_ratio_change = state.threshold_aspect_ratio_change.clamp(config.aspect_ratio_change_threshold, 1.0);
    state.curvature_offset = state.curvature_offset.clamp(config.curvature_offset_min, 180.0);
    state.prior_certainty = state.prior_certainty.clamp(config.certainty_lower_limit, config.certainty_upper_limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn miss_shrinks_certainty_by_beta_x() {
        let config = DetectionConfig::default();
        let mut prior = TrackerState::initial(&config);
        prior.prior_certainty = 0.5;
        let next = on_miss(&prior, &config, 20.0, None, 160, 120);
        assert_relative_eq!(next.prior_certainty, 0.5 * config.alpha_miscellaneous, epsilon = 1e-9);
        assert!(!next.pupil_detected);
    }

    #[test]
    fn repeated_misses_decay_geometrically() {
        let config = DetectionConfig::default();
        let mut state = TrackerState::initial(&config);
        state.prior_certainty = 0.8;
        let start = state.prior_certainty;
        for _ in 0..5 {
            state = on_miss(&state, &config, 20.0, None, 160, 120);
        }
        let expected = (start * config.alpha_miscellaneous.powi(5)).clamp(config.certainty_lower_limit, config.certainty_upper_limit);
        assert_relative_eq!(state.prior_certainty, expected, epsilon = 1e-6);
    }

    #[test]
    fn detection_moves_prediction_toward_measurement() {
        let config = DetectionConfig::default();
        let prior = TrackerState::initial(&config);
        let measurement = (0.9, 150.0, 100.0, 90.0, 23.87, 80.0, 60.0, 120.0, 10.0);
        let next = on_detection(&prior, &config, measurement, 20.0, 160, 120);
        assert!(next.pupil_detected);
        assert!((next.x_pos_predicted - prior.x_pos_predicted).abs() > 0.0);
    }

    #[test]
    fn clamped_fields_stay_in_bounds_after_many_detections() {
        let config = DetectionConfig::default();
        let mut state = TrackerState::initial(&config);
        let measurement = (0.9, 150.0, 100.0, 90.0, 23.87, 80.0, 60.0, 120.0, 10.0);
        for _ in 0..50 {
            state = on_detection(&state, &config, measurement, 20.0, 160, 120);
        }
        assert!(state.prior_certainty <= config.certainty_upper_limit);
        assert!(state.prior_certainty >= config.certainty_lower_limit);
        assert!(state.curvature_offset >= config.curvature_offset_min && state.curvature_offset <= 180.0);
    }

    #[test]
    fn miss_with_haar_centre_pulls_position_toward_it() {
        let config = DetectionConfig::default();
        let prior = TrackerState::initial(&config);
        let centre = (prior.x_pos_predicted + 50.0, prior.y_pos_predicted + 50.0);
        let next = on_miss(&prior, &config, 20.0, Some(centre), 300, 300);
        assert!(next.x_pos_predicted > prior.x_pos_predicted);
        assert!(next.y_pos_predicted > prior.y_pos_predicted);
    }

    #[test]
    fn miss_without_haar_centre_holds_position() {
        let config = DetectionConfig::default();
        let prior = TrackerState::initial(&config);
        let next = on_miss(&prior, &config, 20.0, None, 300, 300);
        assert_relative_eq!(next.x_pos_predicted, prior.x_pos_predicted + prior.x_velocity, epsilon = 1e-9);
    }

    #[test]
    fn miss_recomputes_radius_from_circumference() {
        let config = DetectionConfig::default();
        let prior = TrackerState::initial(&config);
        let next = on_miss(&prior, &config, 20.0, None, 300, 300);
        assert_relative_eq!(
            next.radius_prediction,
            next.circumference_prediction / (2.0 * std::f64::consts::PI),
            epsilon = 1e-9
        );
    }
}
