//! Without-prior edge extraction: a built-in Sobel-based Canny detector
//! (§4.4, without-prior branch). Used on the very first frame, or any frame
//! where the prior carries no usable prediction.

use crate::hysteresis;
use pupil_core::GrayImage;

const SOBEL_X: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
const SOBEL_Y: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

/// Gradient magnitude and direction (radians, `[0, pi)`) at every pixel of
/// `image`, computed with a 3x3 Sobel operator and border-clamped sampling.
pub fn sobel_gradient(image: &GrayImage) -> (Vec<f64>, Vec<f64>) {
    let width = image.width() as i32;
    let height = image.height() as i32;

    let mut magnitude = vec![0.0; (width as usize) * (height as usize)];
    let mut direction = vec![0.0; (width as usize) * (height as usize)];

    for y in 0..height {
        for x in 0..width {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (k, (ky, kx)) in (-1..=1).flat_map(|ky| (-1..=1).map(move |kx| (ky, kx))).enumerate() {
                let sx = (x + kx).clamp(0, width - 1);
                let sy = (y + ky).clamp(0, height - 1);
                let intensity = image.get(sx, sy).unwrap_or(0) as f64;
                gx += SOBEL_X[k] as f64 * intensity;
                gy += SOBEL_Y[k] as f64 * intensity;
            }
            let idx = (width * y + x) as usize;
            magnitude[idx] = (gx * gx + gy * gy).sqrt();
            direction[idx] = gy.atan2(gx);
        }
    }

    (magnitude, direction)
}

/// Suppresses every gradient pixel that is not a local maximum along its own
/// gradient direction, sampling the two 8-connected neighbours nearest that
/// direction.
pub fn non_maximum_suppression(magnitude: &[f64], direction: &[f64], width: i32, height: i32) -> Vec<f64> {
    const DX: [i32; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
    const DY: [i32; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

    let mut suppressed = magnitude.to_vec();

    for y in 0..height {
        for x in 0..width {
            let idx = (width * y + x) as usize;
            if magnitude[idx] == 0.0 {
                continue;
            }

            let theta = direction[idx];
            let normalized = if theta < 0.0 { theta + std::f64::consts::PI } else { theta };
            let i = ((normalized * 8.0 / std::f64::consts::PI).round() as i32).rem_euclid(8) as usize;
            let j = (i + 4) % 8;

            let forward = sample(magnitude, width, height, x + DX[i], y + DY[i]);
            let backward = sample(magnitude, width, height, x + DX[j], y + DY[j]);

            if magnitude[idx] < forward || magnitude[idx] < backward {
                suppressed[idx] = 0.0;
            }
        }
    }

    suppressed
}

fn sample(values: &[f64], width: i32, height: i32, x: i32, y: i32) -> f64 {
    if x < 0 || x >= width || y < 0 || y >= height {
        return f64::MIN;
    }
    values[(width * y + x) as usize]
}

/// Runs the full without-prior edge path: Sobel gradient, NMS, hysteresis
/// at `4 * threshold_low` / `4 * threshold_high` (the built-in Canny stage
/// works on raw Sobel magnitudes, an order of magnitude larger than the
/// radial-gradient responses the with-prior thresholds were tuned for).
/// Returns a 1/0 edge plane.
#[tracing::instrument(skip(image))]
pub fn extract_edges(image: &GrayImage, threshold_low: f64, threshold_high: f64) -> Vec<u8> {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let (magnitude, direction) = sobel_gradient(image);
    let suppressed = non_maximum_suppression(&magnitude, &direction, width, height);
    let edges = hysteresis::track(&suppressed, width, height, 4.0 * threshold_high, 4.0 * threshold_low);
    tracing::debug!(edge_count = edges.iter().filter(|&&e| e == 1).count(), "canny edge extraction complete");
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_has_zero_gradient() {
        let image = GrayImage::filled(10, 10, 128);
        let (magnitude, _) = sobel_gradient(&image);
        assert!(magnitude.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn vertical_edge_produces_horizontal_gradient() {
        let mut image = GrayImage::filled(10, 10, 0);
        for y in 0..10 {
            for x in 5..10 {
                image.set(x, y, 255);
            }
        }
        let (magnitude, _) = sobel_gradient(&image);
        let idx = (10 * 5 + 5) as usize;
        assert!(magnitude[idx] > 0.0);
    }

    #[test]
    fn extract_edges_finds_a_boundary() {
        let mut image = GrayImage::filled(20, 20, 20);
        for y in 5..15 {
            for x in 5..15 {
                image.set(x, y, 220);
            }
        }
        let edges = extract_edges(&image, 10.0, 20.0);
        assert!(edges.iter().any(|&e| e == 1));
    }
}
