//! Approximate pupil locator: a Haar-like box slid over an integral image,
//! minimizing mean intensity with any glint overlap subtracted out (§4.3).

use crate::integral::IntegralImage;
use pupil_core::Rect;

/// Slides a `(haar_w, haar_h)` box over `integral` (an `(width, height)`
/// region) and returns the top-left corner of the position with minimum
/// adjusted mean intensity.
///
/// At each position, the area and integral-image sum of any overlap with
/// `glint` are subtracted before dividing — this is the same quantity the
/// original nine-case overlap geometry (strict interior, four edge-only
/// overlaps, four corner overlaps) computes, expressed here as a single
/// rectangle-intersection clip against the Haar box, since that is exactly
/// what those nine cases enumerate by hand.
///
/// Ties (equal adjusted intensity) resolve to the first position in
/// row-major scan order, matching a strict `<` comparison against the
/// running minimum.
#[tracing::instrument(skip(integral), fields(width, height, haar_w, haar_h))]
pub fn detect_pupil_haar(
    integral: &IntegralImage,
    width: i32,
    height: i32,
    haar_w: i32,
    haar_h: i32,
    glint: Option<Rect>,
) -> Rect {
    let pupil_area = (haar_w as i64) * (haar_h as i64);
    let mut best = Rect::new(0, 0, haar_w, haar_h);
    let mut min_intensity = f64::MAX;

    for y in 0..=(height - haar_h).max(0) {
        for x in 0..=(width - haar_w).max(0) {
            let haar_rect = Rect::new(x, y, haar_w, haar_h);

            let (glint_area, glint_sum) = match glint.and_then(|g| haar_rect.intersect(&g)) {
                Some(clipped) => (
                    clipped.area(),
                    integral.sum_rect(clipped.x, clipped.y, clipped.width, clipped.height) as i64,
                ),
                None => (0, 0),
            };

            let denom = pupil_area - glint_area;
            if denom <= 0 {
                continue;
            }

            let total = integral.sum_rect(x, y, haar_w, haar_h) as i64 - glint_sum;
            let intensity = total as f64 / denom as f64;

            if intensity < min_intensity {
                min_intensity = intensity;
                best = haar_rect;
            }
        }
    }

    tracing::debug!(x = best.x, y = best.y, intensity = min_intensity, "haar search complete");
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use pupil_core::GrayImage;

    #[test]
    fn finds_dark_square_against_bright_background() {
        let mut img = GrayImage::filled(40, 40, 200);
        for y in 15..25 {
            for x in 15..25 {
                img.set(x, y, 10);
            }
        }
        let integral = IntegralImage::build(&img);
        let result = detect_pupil_haar(&integral, 40, 40, 10, 10, None);
        assert!((result.x - 15).abs() <= 2, "x = {}", result.x);
        assert!((result.y - 15).abs() <= 2, "y = {}", result.y);
    }

    #[test]
    fn glint_overlap_is_excluded_from_mean() {
        let mut img = GrayImage::filled(40, 40, 200);
        for y in 15..25 {
            for x in 15..25 {
                img.set(x, y, 10);
            }
        }
        // A bright glint sitting inside the dark square should not pull the
        // Haar search away from it once its contribution is subtracted.
        for y in 18..20 {
            for x in 18..20 {
                img.set(x, y, 255);
            }
        }
        let integral = IntegralImage::build(&img);
        let glint = Rect::new(18, 18, 2, 2);
        let result = detect_pupil_haar(&integral, 40, 40, 10, 10, Some(glint));
        assert!((result.x - 15).abs() <= 2, "x = {}", result.x);
        assert!((result.y - 15).abs() <= 2, "y = {}", result.y);
    }
}
