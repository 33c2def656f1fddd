//! Per-frame orchestration: the single public `detect` entry point that
//! sequences every stage in §2 over one frame.

use crate::{fit_select, roi, temporal};
use pupil_core::{BgrImage, DetectionConfig, DrawOverlay, OtherPriorState, TrackerState};
use pupil_ops::{blur, canny, glint, haar, integral, radial, score, segment, sharpen};
use tracing::{debug, info, instrument};

/// Runs the full pupil detection pipeline for one frame.
///
/// Takes the prior's running state by reference and returns a new
/// [`TrackerState`]; the prior is never mutated. See the crate-level docs
/// for the stage sequence.
#[instrument(skip(image, config, prior, other_prior), fields(certainty = prior.prior_certainty))]
pub fn detect(
    image: &BgrImage,
    config: &DetectionConfig,
    prior: &TrackerState,
    other_prior: Option<&OtherPriorState>,
) -> TrackerState {
    let image_width = image.width() as i32;
    let image_height = image.height() as i32;

    let region = match roi::plan(image_width, image_height, prior, config, other_prior) {
        Ok(region) => region,
        Err(error) => {
            debug!(%error, "search-region planning failed");
            let diameter = (2.0 * prior.radius_prediction).max(1.0);
            let haar_side = (config.pupil_haar_reduction_factor * diameter).round().max(1.0);
            let mut next = temporal::on_miss(prior, config, haar_side, None, image_width, image_height);
            next.error_detected = true;
            return next;
        }
    };

    let gray = image.to_gray();
    let crop = gray.crop(region.roi);
    let width = crop.width() as i32;
    let height = crop.height() as i32;

    let glint_box = glint::detect_glint(&crop, config.glint_size);

    let integral = integral::IntegralImage::build(&crop);
    let haar_box = haar::detect_pupil_haar(&integral, width, height, region.haar_width, region.haar_height, glint_box);

    let blurred = blur::Kernel::from_blur_level(config.canny_blur_level)
        .map(|kernel| blur::convolve(&crop, &kernel))
        .unwrap_or(crop);

    let with_prior = prior.prior_certainty >= config.certainty_threshold;

    let centre_x = (prior.x_pos_predicted - region.roi.x as f64).clamp(0.0, (width as f64 - 1.0).max(0.0));
    let centre_y = (prior.y_pos_predicted - region.roi.y as f64).clamp(0.0, (height as f64 - 1.0).max(0.0));

    let edges = if with_prior {
        radial::extract_edges(&blurred, config.canny_kernel_size, centre_x, centre_y, config.canny_threshold_high, config.canny_threshold_low)
    } else {
        canny::extract_edges(&blurred, config.canny_threshold_low, config.canny_threshold_high)
    };

    let sharpened = sharpen::sharpen_edges(&edges, width, height);

    let (curvature_lower, curvature_upper) = pupil_geom::curvature::curvature_band(
        prior.circumference_prediction,
        prior.aspect_ratio_prediction,
        config.curvature_factor,
        prior.curvature_offset,
    );

    let predicted_centre = if with_prior { Some((centre_x, centre_y)) } else { None };

    let arcs = segment::segment_edges(
        &blurred,
        &edges,
        &sharpened,
        width,
        height,
        predicted_centre,
        config.curvature_window_length,
        curvature_upper,
        curvature_lower,
        config.edge_intensity_position_offset,
    );

    let scored = score::score_arcs(
        arcs,
        centre_x,
        centre_y,
        prior.edge_intensity_prediction,
        prior.circumference_prediction,
        with_prior,
        prior.radius_prediction,
        prior.edge_curvature_prediction,
    );
    let retained = score::retain_top(scored, config.ellipse_fit_number_maximum);

    let candidate = fit_select::select(
        &retained,
        config,
        with_prior,
        prior.circumference_prediction,
        prior.aspect_ratio_prediction,
        prior.threshold_circumference_change,
        prior.threshold_aspect_ratio_change,
    );

    let haar_side = region.haar_width.max(region.haar_height) as f64;

    let mut overlay = DrawOverlay {
        haar_box: Some((region.roi.x + haar_box.x, region.roi.y + haar_box.y, haar_box.width, haar_box.height)),
        glint_box: glint_box.map(|g| (region.roi.x + g.x, region.roi.y + g.y, g.width, g.height)),
        ..DrawOverlay::default()
    };

    match candidate {
        Some(candidate) => {
            info!(score = candidate.score, fit_error = candidate.fit_error, "ellipse accepted");

            let intensity = mean_intensity(&blurred, &candidate.edge_indices);
            let measurement = (
                candidate.ellipse.aspect_ratio,
                candidate.ellipse.circumference,
                candidate.ellipse.width,
                candidate.ellipse.height,
                candidate.ellipse.radius,
                candidate.ellipse.x + region.roi.x as f64,
                candidate.ellipse.y + region.roi.y as f64,
                intensity,
                candidate.curvature_avg,
            );

            let mut next = temporal::on_detection(prior, config, measurement, haar_side, image_width, image_height);
            overlay.edge_indices = candidate.edge_indices;
            overlay.ellipse_coefficients = Some(candidate.ellipse.coefficients);
            next.overlay = overlay;
            next
        }
        None => {
            debug!("no accepted ellipse this frame");
            let haar_centre = Some((
                region.roi.x as f64 + 0.5 * region.roi.width as f64,
                region.roi.y as f64 + 0.5 * region.roi.height as f64,
            ));
            let mut next = temporal::on_miss(prior, config, haar_side, haar_centre, image_width, image_height);
            next.overlay = overlay;
            next
        }
    }
}

fn mean_intensity(image: &pupil_core::GrayImage, points: &[(i32, i32)]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sum: f64 = points.iter().map(|&(x, y)| image.get(x, y).unwrap_or(0) as f64).sum();
    sum / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use pupil_core::DetectionConfig;

    #[test]
    fn detects_a_clean_synthetic_pupil() {
        // A clean synthetic frame has exactly one true contour, so retaining
        // it alone clears the §4.8 length gate
        // (`circumference_prediction * ellipse_fit_number_maximum`).
        let config = DetectionConfig { ellipse_fit_number_maximum: 1, ..DetectionConfig::default() };
        let (a, b) = test_support::semi_axes_for(150.0, 0.9);
        let frame = test_support::ellipse_frame(160, 120, 80.0, 60.0, a, b);

        let mut prior = TrackerState::initial(&config);
        prior.x_pos_predicted = 80.0;
        prior.y_pos_predicted = 60.0;
        prior.circumference_prediction = 150.0;
        prior.aspect_ratio_prediction = 0.9;
        prior.radius_prediction = 150.0 / (2.0 * std::f64::consts::PI);
        prior.search_radius = prior.radius_prediction * 1.2;
        prior.prior_certainty = config.certainty_upper_limit;

        let next = detect(&frame, &config, &prior, None);
        assert!(next.pupil_detected);
        assert!(!next.error_detected);
    }

    #[test]
    fn degenerate_search_region_reports_an_error_without_panicking() {
        let config = DetectionConfig::default();
        let mut prior = TrackerState::initial(&config);
        prior.x_pos_predicted = -1000.0;
        prior.y_pos_predicted = -1000.0;
        prior.search_radius = 1.0;

        let next = detect(&test_support::uniform_frame(160, 120, 180), &config, &prior, None);
        assert!(next.error_detected);
        assert!(!next.pupil_detected);
    }
}
