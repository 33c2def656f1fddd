//! Flash/uniformity guard (§4.11, added): a mean-intensity helper a caller
//! can use to skip detection on over/under-exposed frames (e.g. an IR
//! illuminator flash), grounded on the `flashDetection` helper in the
//! original implementation this pipeline was distilled from.

use pupil_core::BgrImage;

/// Mean grayscale intensity of `image`, in `[0, 255]`.
///
/// `detect` never calls this itself — per §7, the caller decides whether to
/// re-detect or skip a frame; this just gives that decision something to
/// act on.
pub fn mean_intensity(image: &BgrImage) -> f64 {
    let gray = image.to_gray();
    let data = gray.data();
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64
}
