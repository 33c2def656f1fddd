//! With-prior edge extraction: a radial gradient kernel biased toward the
//! predicted pupil centre, non-maximum suppression along the radial
//! direction, and hysteresis tracking (§4.4, with-prior branch).

use crate::hysteresis;
use pupil_core::GrayImage;
use std::f64::consts::PI;

const PERIMETER: usize = 8;
const DX: [i32; PERIMETER] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [i32; PERIMETER] = [0, -1, -1, -1, 0, 1, 1, 1];
const FC: f64 = 6.0;
const SD: f64 = 1.0;

/// Computes the signed radial gradient response at every interior pixel of
/// `image`, biased outward from `(centre_x, centre_y)`.
///
/// `kernel_size` sets the sampling radius: `border = (kernel_size - 1) / 2`.
/// The border band (where the kernel would sample outside the crop) is left
/// at zero.
pub fn radial_gradient(image: &GrayImage, kernel_size: i32, centre_x: f64, centre_y: f64) -> Vec<f64> {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let border = (kernel_size - 1) / 2;

    let mut gradient = vec![0.0; (width as usize) * (height as usize)];

    for y in border..(height - border).max(border) {
        for x in border..(width - border).max(border) {
            let theta = angle_to_centre(x as f64, y as f64, centre_x, centre_y);
            let alpha = theta * PERIMETER as f64 / (2.0 * PI);

            let mut val = 0.0;
            for i in 0..PERIMETER {
                let mut dpos = (i as f64 - alpha).abs();
                if dpos > (PERIMETER as f64) / 2.0 {
                    dpos = PERIMETER as f64 - dpos;
                }
                let dneg = 0.5 * PERIMETER as f64 - dpos;
                let weight = FC * ((-dpos.powi(2) / SD).exp() - (-dneg.powi(2) / SD).exp());

                let px = x + DX[i] * border;
                let py = y + DY[i] * border;
                let intensity = image.get(px, py).unwrap_or(0) as f64;
                val += intensity * weight;
            }

            if val < 0.0 {
                val = 0.0;
            }
            gradient[(width * y + x) as usize] = val;
        }
    }

    gradient
}

/// `atan2`-based angle from `(x, y)` toward `(centre_x, centre_y)`,
/// normalized to `[0, 2*pi)`, with the axis-aligned special cases the
/// general `atan2` formula can't express directly (a pixel exactly on one
/// of the centre's axes).
fn angle_to_centre(x: f64, y: f64, centre_x: f64, centre_y: f64) -> f64 {
    let dx = x - centre_x;
    let dy = centre_y - y;

    if dx != 0.0 && dy != 0.0 {
        let mut theta = dy.atan2(dx);
        if theta < 0.0 {
            theta += 2.0 * PI;
        }
        theta
    } else if dx == 0.0 && dy != 0.0 {
        if dy > 0.0 {
            0.5 * PI
        } else {
            1.5 * PI
        }
    } else if dx != 0.0 && dy == 0.0 {
        if dx > 0.0 {
            0.0
        } else {
            PI
        }
    } else {
        0.0
    }
}

/// Suppresses every non-zero gradient pixel that is not a local maximum
/// along the radial direction from `(centre_x, centre_y)`.
pub fn non_maximum_suppression(
    gradient: &[f64],
    width: i32,
    height: i32,
    centre_x: f64,
    centre_y: f64,
) -> Vec<f64> {
    let mut suppressed = gradient.to_vec();

    for y in 0..height {
        for x in 0..width {
            let idx = (width * y + x) as usize;
            if gradient[idx] == 0.0 {
                continue;
            }

            let dx = x as f64 - centre_x;
            let dy = centre_y - y as f64;
            let theta = if dx != 0.0 && dy != 0.0 {
                let mut t = dy.atan2(dx);
                if t < 0.0 {
                    t += 2.0 * PI;
                }
                t
            } else {
                0.0
            };

            let i = (theta * PERIMETER as f64 / (2.0 * PI)).round() as i32;
            let j = (PERIMETER as i32) / 2 + i;
            let i = i.rem_euclid(PERIMETER as i32) as usize;
            let j = j.rem_euclid(PERIMETER as i32) as usize;

            let ni = x + DX[i];
            let nj_x = x + DX[j];
            let ny = y + DY[i];
            let nj_y = y + DY[j];

            let neighbour_i = sample(gradient, width, height, ni, ny);
            let neighbour_j = sample(gradient, width, height, nj_x, nj_y);

            if gradient[idx] < neighbour_i || gradient[idx] < neighbour_j {
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

/// Runs the full with-prior edge path: radial gradient, NMS, hysteresis.
/// Returns a 1/0 edge plane.
#[tracing::instrument(skip(image), fields(centre_x, centre_y))]
pub fn extract_edges(
    image: &GrayImage,
    kernel_size: i32,
    centre_x: f64,
    centre_y: f64,
    threshold_high: f64,
    threshold_low: f64,
) -> Vec<u8> {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let gradient = radial_gradient(image, kernel_size, centre_x, centre_y);
    let suppressed = non_maximum_suppression(&gradient, width, height, centre_x, centre_y);
    let edges = hysteresis::track(&suppressed, width, height, threshold_high, threshold_low);
    tracing::debug!(edge_count = edges.iter().filter(|&&e| e == 1).count(), "radial edge extraction complete");
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radial_gradient_is_nonnegative() {
        let mut image = GrayImage::filled(20, 20, 50);
        for y in 8..12 {
            for x in 8..12 {
                image.set(x, y, 200);
            }
        }
        let gradient = radial_gradient(&image, 3, 10.0, 10.0);
        assert!(gradient.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn responds_to_outward_intensity_increase() {
        // Dark disc at the centre, bright ring: a dark-pupil boundary.
        let mut image = GrayImage::filled(30, 30, 200);
        for y in 10..20 {
            for x in 10..20 {
                image.set(x, y, 20);
            }
        }
        let gradient = radial_gradient(&image, 3, 15.0, 15.0);
        let boundary = gradient[(30 * 15 + 10) as usize];
        assert!(boundary > 0.0);
    }
}
