//! End-to-end scenarios from spec §8: each builds a synthetic frame and a
//! documented seed `TrackerState`, runs [`pupil_pipeline::detect`] over it,
//! and checks the pipeline's observable behavior against the documented
//! tolerances.

use pupil_core::{BgrImage, DetectionConfig, OtherPriorState, TrackerState};
use pupil_pipeline::detect;

const BACKGROUND: u8 = 200;
const PUPIL: u8 = 30;
const GLINT: u8 = 250;

fn ellipse_frame(width: u32, height: u32, cx: f64, cy: f64, semi_major: f64, semi_minor: f64) -> BgrImage {
    let mut data = vec![[BACKGROUND; 3]; (width as usize) * (height as usize)];
    for y in 0..height {
        for x in 0..width {
            let dx = (x as f64 + 0.5) - cx;
            let dy = (y as f64 + 0.5) - cy;
            if (dx * dx) / (semi_major * semi_major) + (dy * dy) / (semi_minor * semi_minor) <= 1.0 {
                data[(y as usize) * (width as usize) + x as usize] = [PUPIL; 3];
            }
        }
    }
    BgrImage::from_pixels(width, height, data).expect("non-empty synthetic frame")
}

fn with_glint(mut frame: BgrImage, gx: i32, gy: i32, glint_size: i32) -> BgrImage {
    let half = glint_size / 2;
    for y in (gy - half)..(gy + half) {
        for x in (gx - half)..(gx + half) {
            if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
                frame.set(x as u32, y as u32, [GLINT; 3]);
            }
        }
    }
    frame
}

fn uniform_frame(width: u32, height: u32, value: u8) -> BgrImage {
    BgrImage::from_pixels(width, height, vec![[value; 3]; (width as usize) * (height as usize)]).unwrap()
}

/// Semi-axes `(a, b)` whose Ramanujan-approximated circumference matches
/// `circumference` at `aspect_ratio`, to a handful of Newton-style
/// refinement steps.
fn semi_axes_for(circumference: f64, aspect_ratio: f64) -> (f64, f64) {
    let mut a = circumference / (std::f64::consts::PI * (1.0 + aspect_ratio));
    for _ in 0..8 {
        let b = a * aspect_ratio;
        let h = ((a - b) / (a + b)).powi(2);
        let c = std::f64::consts::PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
        a *= circumference / c;
    }
    (a, a * aspect_ratio)
}

/// A config whose `ellipse_fit_number_maximum` is 1: these scenarios' frames
/// carry exactly one true contour, and the §4.8 length gate
/// (`circumference_prediction * ellipse_fit_number_maximum`) only clears for
/// a single retained arc's worth of pixels, not several.
fn test_config() -> DetectionConfig {
    DetectionConfig { ellipse_fit_number_maximum: 1, ..DetectionConfig::default() }
}

/// A seed state whose prior is centred at `(cx, cy)` with the given shape
/// and enough certainty to take the with-prior (radial gradient) edge path.
fn seeded_prior(config: &DetectionConfig, cx: f64, cy: f64, circumference: f64, aspect_ratio: f64) -> TrackerState {
    let mut state = TrackerState::initial(config);
    state.x_pos_predicted = cx;
    state.y_pos_predicted = cy;
    state.x_pos_average = cx;
    state.y_pos_average = cy;
    state.circumference_prediction = circumference;
    state.circumference_average = circumference;
    state.aspect_ratio_prediction = aspect_ratio;
    state.aspect_ratio_average = aspect_ratio;
    state.radius_prediction = circumference / (2.0 * std::f64::consts::PI);
    state.radius_average = state.radius_prediction;
    state.search_radius = state.radius_prediction * 1.2;
    state.edge_intensity_prediction = (BACKGROUND as f64 - PUPIL as f64) / 2.0;
    state.edge_curvature_prediction = 0.0;
    state.prior_certainty = config.certainty_upper_limit;
    state
}

#[test]
fn scenario_1_converges_on_a_centred_synthetic_pupil() {
    let config = test_config();
    let (a, b) = semi_axes_for(150.0, 0.9);
    let frame = ellipse_frame(160, 120, 80.0, 60.0, a, b);
    let prior = seeded_prior(&config, 80.0, 60.0, 150.0, 0.9);

    let next = detect(&frame, &config, &prior, None);

    assert!(next.pupil_detected, "expected a detection on a clean synthetic pupil");
    assert!((next.circumference_exact - 150.0).abs() < 3.0, "circumference_exact={}", next.circumference_exact);
    assert!((next.aspect_ratio_exact - 0.9).abs() < 0.05, "aspect_ratio_exact={}", next.aspect_ratio_exact);
}

#[test]
fn scenario_2_tracks_a_translated_pupil() {
    let config = test_config();
    let (a, b) = semi_axes_for(150.0, 0.9);
    let frame = ellipse_frame(160, 120, 85.0, 57.0, a, b);
    let prior = seeded_prior(&config, 80.0, 60.0, 150.0, 0.9);

    let next = detect(&frame, &config, &prior, None);

    assert!(next.pupil_detected);
    assert!((next.x_pos_exact - 85.0).abs() < 1.0, "x_pos_exact={}", next.x_pos_exact);
    assert!((next.y_pos_exact - 57.0).abs() < 1.0, "y_pos_exact={}", next.y_pos_exact);
}

#[test]
fn scenario_3_uniform_frame_is_a_miss_that_relaxes_thresholds() {
    let config = test_config();
    let frame = uniform_frame(160, 120, 180);
    let prior = seeded_prior(&config, 80.0, 60.0, 150.0, 0.9);

    let next = detect(&frame, &config, &prior, None);

    assert!(!next.pupil_detected);
    assert!(
        next.search_radius > prior.search_radius,
        "search_radius should grow on a miss: {} -> {}",
        prior.search_radius,
        next.search_radius
    );
    assert!(
        next.prior_certainty < prior.prior_certainty,
        "prior_certainty should shrink on a miss: {} -> {}",
        prior.prior_certainty,
        next.prior_certainty
    );
}

#[test]
fn scenario_4_converges_despite_a_central_glint() {
    let config = test_config();
    let (a, b) = semi_axes_for(150.0, 0.9);
    let frame = with_glint(ellipse_frame(160, 120, 80.0, 60.0, a, b), 80, 60, config.glint_size);
    let prior = seeded_prior(&config, 80.0, 60.0, 150.0, 0.9);

    let next = detect(&frame, &config, &prior, None);

    assert!(next.pupil_detected, "glint should not prevent detection");
    assert!((next.x_pos_exact - 80.0).abs() < 1.0, "x_pos_exact={}", next.x_pos_exact);
}

#[test]
fn scenario_5_selects_the_candidate_matching_the_predicted_circumference() {
    let config = test_config();
    let (a, b) = semi_axes_for(150.0, 0.9);
    let mut frame = ellipse_frame(160, 120, 80.0, 60.0, a, b);

    // An invalid, too-small ellipse tucked in a corner far from the prior's
    // search disc: below `circumference_min`, so it can never be the
    // selected candidate even though it is a perfectly good ellipse shape.
    let (small_a, small_b) = semi_axes_for(30.0, 0.9);
    let corner = ellipse_frame(160, 120, 20.0, 20.0, small_a, small_b);
    for y in 0..20u32 {
        for x in 0..40u32 {
            if let Some(pixel) = corner.get(x, y) {
                frame.set(x, y, pixel);
            }
        }
    }

    let prior = seeded_prior(&config, 80.0, 60.0, 150.0, 0.9);
    let next = detect(&frame, &config, &prior, None);

    assert!(next.pupil_detected);
    assert!(
        (next.circumference_exact - 150.0).abs() < (next.circumference_exact - 30.0).abs(),
        "selected candidate should match the predicted circumference, not the decoy: circumference_exact={}",
        next.circumference_exact
    );
}

#[test]
fn scenario_6_second_feature_exclusion_does_not_crash_and_can_still_miss() {
    let mut config = test_config();
    config.detection_on = true;
    let (a, b) = semi_axes_for(150.0, 0.9);

    // Pupil in the right half, excluded disc covering the left half: the
    // ROI planner should not touch the pupil's half, and detection succeeds.
    let frame = ellipse_frame(160, 120, 120.0, 60.0, a, b);
    let prior = seeded_prior(&config, 120.0, 60.0, 150.0, 0.9);
    let other = OtherPriorState { x_pos_predicted: 20.0, y_pos_predicted: 60.0, search_radius: 30.0, detection_on: true };
    let next = detect(&frame, &config, &prior, Some(&other));
    assert!(next.pupil_detected);

    // Pupil under the excluded region: the planner truncates it away, and
    // the pipeline must return a miss, not panic.
    let prior_excluded = seeded_prior(&config, 20.0, 60.0, 150.0, 0.9);
    let other_excluded = OtherPriorState { x_pos_predicted: 20.0, y_pos_predicted: 60.0, search_radius: 30.0, detection_on: true };
    let next_excluded = detect(&frame, &config, &prior_excluded, Some(&other_excluded));
    assert!(!next_excluded.pupil_detected);
}
