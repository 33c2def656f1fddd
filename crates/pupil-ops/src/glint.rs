//! Specular glint locator (§4.2).

use pupil_core::{GrayImage, Rect};

const NEIGHBOUR_DX: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];
const NEIGHBOUR_DY: [i32; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

/// Locates the brightest small specular reflection in `roi`.
///
/// For every interior pixel (far enough from the border that both the
/// center-window and surround-window samples stay in bounds), computes the
/// ratio of its 8-neighbour center sum to the 8-neighbour surround sum at
/// radius `glint_size`; the argmax defines the glint, offset by
/// `round(0.5 * glint_size)` toward the center so the returned box is
/// centered on the bright spot rather than anchored at one corner of it.
///
/// Returns `None` if `roi` is too small to hold a window of this size.
#[tracing::instrument(skip(roi), fields(glint_size))]
pub fn detect_glint(roi: &GrayImage, glint_size: i32) -> Option<Rect> {
    let width = roi.width() as i32;
    let height = roi.height() as i32;
    if width <= 2 * glint_size || height <= 2 * glint_size {
        return None;
    }

    let glint_radius = (0.5 * glint_size as f64).round() as i32;

    let mut best_ratio = f64::MIN;
    let mut best = (glint_size, glint_size);

    for y in glint_size..(height - glint_size) {
        for x in glint_size..(width - glint_size) {
            let mut centre_sum = roi.get(x, y).unwrap_or(0) as f64;
            for m in 0..8 {
                centre_sum += roi.get(x + NEIGHBOUR_DX[m], y + NEIGHBOUR_DY[m]).unwrap_or(0) as f64;
            }

            let mut surround_sum = 0.0;
            for m in 0..8 {
                surround_sum += roi
                    .get(x + glint_size * NEIGHBOUR_DX[m], y + glint_size * NEIGHBOUR_DY[m])
                    .unwrap_or(0) as f64;
            }
            if surround_sum == 0.0 {
                continue;
            }

            let ratio = centre_sum / surround_sum;
            if ratio > best_ratio {
                best_ratio = ratio;
                best = (x, y);
            }
        }
    }

    tracing::debug!(x = best.0, y = best.1, ratio = best_ratio, "glint located");
    Some(Rect::new(
        best.0 - glint_radius,
        best.1 - glint_radius,
        glint_size,
        glint_size,
    ))
}
