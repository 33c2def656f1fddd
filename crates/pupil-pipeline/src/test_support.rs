//! Synthetic frame builders for the end-to-end scenarios in §8.
//!
//! Every helper here draws a flat-shaded dark ellipse ("pupil") on a
//! lighter background, matching the radial gradient's dark-pupil
//! assumption (§4.4): intensity increases outward from the predicted
//! centre.

use pupil_core::BgrImage;

pub const BACKGROUND: u8 = 200;
pub const PUPIL: u8 = 30;
pub const GLINT: u8 = 250;

/// Draws `width x height` filled with [`BACKGROUND`], with a filled ellipse
/// of semi-axes `(semi_major, semi_minor)` centred at `(cx, cy)` painted
/// [`PUPIL`].
pub fn ellipse_frame(width: u32, height: u32, cx: f64, cy: f64, semi_major: f64, semi_minor: f64) -> BgrImage {
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

/// Same as [`ellipse_frame`], plus a `glint_size`-square bright patch
/// centred at `(gx, gy)` painted over the pupil.
pub fn ellipse_frame_with_glint(
    width: u32,
    height: u32,
    cx: f64,
    cy: f64,
    semi_major: f64,
    semi_minor: f64,
    gx: i32,
    gy: i32,
    glint_size: i32,
) -> BgrImage {
    let mut frame = ellipse_frame(width, height, cx, cy, semi_major, semi_minor);
    let half = glint_size / 2;
    for y in (gy - half)..(gy + half) {
        for x in (gx - half)..(gx + half) {
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                frame.set(x as u32, y as u32, [GLINT; 3]);
            }
        }
    }
    frame
}

/// A frame filled uniformly with `value`, used for the no-pupil scenario.
pub fn uniform_frame(width: u32, height: u32, value: u8) -> BgrImage {
    BgrImage::from_pixels(width, height, vec![[value; 3]; (width as usize) * (height as usize)])
        .expect("non-empty synthetic frame")
}

/// Semi-axes `(a, b)` that approximately reproduce `circumference` at
/// `aspect_ratio` via Ramanujan's second approximation, close enough for
/// the end-to-end tolerances in §8 (a handful of pixels / a few percent).
pub fn semi_axes_for(circumference: f64, aspect_ratio: f64) -> (f64, f64) {
    let mut a = circumference / (std::f64::consts::PI * (1.0 + aspect_ratio));
    for _ in 0..8 {
        let b = a * aspect_ratio;
        let h = ((a - b) / (a + b)).powi(2);
        let c = std::f64::consts::PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
        a *= circumference / c;
    }
    (a, a * aspect_ratio)
}
