//! Search-region planner (§4.1): turns the prior's predicted centre and
//! search radius into a clipped region of interest and an extended Haar
//! search box, optionally excluding a second tracked feature's search disc.

use pupil_core::{DetectionConfig, Error, OtherPriorState, Rect, Result, TrackerState};

/// The planner's output: the clipped ROI to run the glint/Haar search over,
/// and the Haar box size to slide within it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRegion {
    /// Clipped region of interest, in frame-absolute coordinates.
    pub roi: Rect,
    /// Haar box side widths, derived from the predicted pupil diameter.
    pub haar_width: i32,
    /// Haar box side heights, derived from the predicted pupil diameter.
    pub haar_height: i32,
}

/// Plans the ROI and Haar box size for one frame.
///
/// Returns [`Error::InvalidRoi`] if the search disc clips to zero area
/// (including after the second-feature exclusion), and
/// [`Error::EmptyHaarBox`] if the Haar box would be larger than the clipped
/// ROI can hold in some dimension.
pub fn plan(
    image_width: i32,
    image_height: i32,
    prior: &TrackerState,
    config: &DetectionConfig,
    other_prior: Option<&OtherPriorState>,
) -> Result<SearchRegion> {
    if image_width <= 0 || image_height <= 0 {
        return Err(Error::non_positive_dimensions(image_width, image_height));
    }

    let disc_side = 2.0 * prior.search_radius;
    let mut roi = Rect::centered(prior.x_pos_predicted, prior.y_pos_predicted, disc_side);

    if let Some(other) = other_prior {
        if config.detection_on && other.detection_on {
            let half = image_width as f64 / 2.0;
            if other.x_pos_predicted <= half {
                let new_x = roi.x.max((other.x_pos_predicted + other.search_radius).round() as i32);
                roi = Rect::new(new_x, roi.y, roi.right() - new_x, roi.height);
            } else {
                let new_right = roi.right().min((other.x_pos_predicted - other.search_radius).round() as i32);
                roi = Rect::new(roi.x, roi.y, new_right - roi.x, roi.height);
            }
        }
    }

    let roi = roi.clip_to_frame(image_width, image_height);
    if roi.is_empty() {
        return Err(Error::invalid_roi(roi.width, roi.height));
    }

    let haar_width = (config.pupil_haar_reduction_factor * prior.width_prediction).round().max(1.0) as i32;
    let haar_height = (config.pupil_haar_reduction_factor * prior.height_prediction).round().max(1.0) as i32;

    let extended = Rect::new(
        (prior.x_pos_predicted - haar_width as f64 / 2.0).round() as i32,
        (prior.y_pos_predicted - haar_height as f64 / 2.0).round() as i32,
        haar_width,
        haar_height,
    )
    .intersect(&Rect::new(
        roi.x - config.pupil_offset,
        roi.y - config.pupil_offset,
        roi.width + 2 * config.pupil_offset,
        roi.height + 2 * config.pupil_offset,
    ))
    .map(|r| r.clip_to_frame(image_width, image_height));

    let extended = match extended {
        Some(r) if !r.is_empty() => r,
        _ => return Err(Error::EmptyHaarBox),
    };

    Ok(SearchRegion { roi: extended, haar_width: haar_width.min(extended.width), haar_height: haar_height.min(extended.height) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_prior(config: &DetectionConfig) -> TrackerState {
        let mut state = TrackerState::initial(config);
        state.x_pos_predicted = 80.0;
        state.y_pos_predicted = 60.0;
        state.search_radius = 40.0;
        state.radius_prediction = 20.0;
        state
    }

    #[test]
    fn plans_roi_centred_on_prediction() {
        let config = DetectionConfig::default();
        let prior = base_prior(&config);
        let region = plan(160, 120, &prior, &config, None).unwrap();
        assert!(region.roi.contains(80, 60));
    }

    #[test]
    fn excludes_other_feature_disc_on_the_left() {
        // `other` sits left of the image midline, so the cut is at its disc's
        // *right* edge (other.x + other.search_radius = 145), past the
        // midline (80) itself — not clamped to the midline.
        let mut config = DetectionConfig::default();
        config.detection_on = true;
        let mut prior = base_prior(&config);
        prior.x_pos_predicted = 120.0;
        let other = OtherPriorState { x_pos_predicted: 20.0, y_pos_predicted: 60.0, search_radius: 125.0, detection_on: true };
        let region = plan(160, 120, &prior, &config, Some(&other)).unwrap();
        // Haar box would otherwise start at 120 - haar_width/2 = 115; the
        // exclusion pushes the offset ROI's left edge to 145 - 25 = 120,
        // clipping the Haar box's left edge to 120.
        assert_eq!(region.roi.x, 120);
    }

    #[test]
    fn zero_size_image_is_an_error() {
        let config = DetectionConfig::default();
        let prior = base_prior(&config);
        assert!(plan(0, 120, &prior, &config, None).is_err());
    }
}
