//! Gaussian blur applied to the extended Haar crop before edge extraction
//! (§4.4). Grounded on this workspace's existing `Kernel`/`gaussian`
//! convolution-kernel convention.

use crate::error::{OpsError, OpsResult};
use pupil_core::GrayImage;

/// A square convolution kernel.
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Kernel weights, row-major.
    pub data: Vec<f64>,
    /// Kernel side length (always odd).
    pub size: usize,
}

impl Kernel {
    /// Builds a normalized Gaussian kernel of the given odd `size` and
    /// `sigma`. `size` is forced odd if given even.
    pub fn gaussian(size: usize, sigma: f64) -> OpsResult<Self> {
        if sigma <= 0.0 {
            return Err(OpsError::InvalidParameter(format!(
                "gaussian sigma must be positive, got {sigma}"
            )));
        }
        let size = if size % 2 == 0 { size + 1 } else { size };
        let half = (size / 2) as i32;
        let sigma2 = 2.0 * sigma * sigma;

        let mut data = Vec::with_capacity(size * size);
        let mut sum = 0.0;
        for y in -half..=half {
            for x in -half..=half {
                let d = (x * x + y * y) as f64;
                let w = (-d / sigma2).exp();
                data.push(w);
                sum += w;
            }
        }
        for w in &mut data {
            *w /= sum;
        }

        Ok(Self { data, size })
    }

    /// Builds the blur kernel `cannyBlurLevel` maps to: size
    /// `2 * canny_blur_level - 1`, sigma fixed at 1.0 (matching the
    /// original implementation's blur stage, which exposes only a size
    /// control, not a separate sigma).
    pub fn from_blur_level(canny_blur_level: i32) -> OpsResult<Self> {
        if canny_blur_level < 1 {
            return Err(OpsError::InvalidParameter(format!(
                "canny_blur_level must be >= 1, got {canny_blur_level}"
            )));
        }
        let size = (2 * canny_blur_level - 1).max(1) as usize;
        Self::gaussian(size, 1.0)
    }
}

/// Convolves `image` with `kernel`, clamping at the border by reusing the
/// edge pixel (the kernel never reaches into out-of-bounds territory).
pub fn convolve(image: &GrayImage, kernel: &Kernel) -> GrayImage {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let half = (kernel.size / 2) as i32;

    let mut out = GrayImage::filled(image.width(), image.height(), 0);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (row, ky) in (-half..=half).enumerate() {
                for (col, kx) in (-half..=half).enumerate() {
                    let sx = (x + kx).clamp(0, width - 1);
                    let sy = (y + ky).clamp(0, height - 1);
                    let weight = kernel.data[row * kernel.size + col];
                    acc += weight * image.get(sx, sy).unwrap_or(0) as f64;
                }
            }
            out.set(x, y, acc.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_kernel_sums_to_one() {
        let kernel = Kernel::gaussian(5, 1.0).unwrap();
        let sum: f64 = kernel.data.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn from_blur_level_one_is_single_pixel_kernel() {
        let kernel = Kernel::from_blur_level(1).unwrap();
        assert_eq!(kernel.size, 1);
    }

    #[test]
    fn convolve_preserves_uniform_image() {
        let image = GrayImage::filled(10, 10, 100);
        let kernel = Kernel::gaussian(3, 1.0).unwrap();
        let blurred = convolve(&image, &kernel);
        assert_eq!(blurred.get(5, 5), Some(100));
    }
}
