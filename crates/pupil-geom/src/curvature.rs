//! The curvature band: two empirically-fit degree-5 bivariate polynomials
//! in `(circumferencePrediction, aspectRatioPrediction)` that bound how
//! sharply an edge arc's curvature may vary before the segmenter treats the
//! bend as a breakpoint (§4.6, §4.10).
//!
//! The polynomials are modeled as data — a coefficient table plus one
//! evaluator — rather than as separate inline expressions, so a future
//! re-fit of the eye-shape prior only touches the table.

/// Coefficients of a degree-5 bivariate polynomial in `(x, y)`, ordered by
/// total degree: `p00, p10, p01, p20, p11, p02, p30, p21, p12, p03, p40,
/// p31, p22, p13, p04, p50, p41, p32, p23, p14, p05`.
pub type PolyCoeffs = [f64; 21];

/// Coefficients for the upper curvature-band limit, as a function of
/// `(circumferencePrediction, aspectRatioPrediction)`.
pub const CURVATURE_UPPER_LIMIT_COEFFS: PolyCoeffs = [
    223.4, 0.8889, 93.66, 0.0014, -12.66, -129.8, -5.23e-05, 0.05832, 11.94, 107.3, 1.981e-07,
    -0.0001222, -0.0296, -5.114, -134.4, -2.322e-10, 1.042e-07, 2.461e-05, 0.005287, 0.8476, 70.94,
];

/// Coefficients for the lower curvature-band limit, as a function of
/// `(circumferencePrediction, aspectRatioPrediction)`.
pub const CURVATURE_LOWER_LIMIT_COEFFS: PolyCoeffs = [
    35.26, -1.282, 89.44, 0.01675, -3.123, 373.6, -0.0001031, 0.02731, -1.822, -537.1, 2.98e-07,
    -0.0001016, 0.01206, -1.537, 706.4, -3.192e-10, 1.13e-07, 7.157e-07, -0.007374, 2.088, -394.1,
];

/// Evaluates a degree-5 bivariate polynomial given by `coeffs` at `(x, y)`.
pub fn evaluate(coeffs: &PolyCoeffs, x: f64, y: f64) -> f64 {
    let [p00, p10, p01, p20, p11, p02, p30, p21, p12, p03, p40, p31, p22, p13, p04, p50, p41, p32, p23, p14, p05] =
        *coeffs;
    let (x2, x3, x4, x5) = (x * x, x * x * x, x * x * x * x, x * x * x * x * x);
    let (y2, y3, y4, y5) = (y * y, y * y * y, y * y * y * y, y * y * y * y * y);

    p00 + p10 * x
        + p01 * y
        + p20 * x2
        + p11 * x * y
        + p02 * y2
        + p30 * x3
        + p21 * x2 * y
        + p12 * x * y2
        + p03 * y3
        + p40 * x4
        + p31 * x3 * y
        + p22 * x2 * y2
        + p13 * x * y3
        + p04 * y4
        + p50 * x5
        + p41 * x4 * y
        + p32 * x3 * y2
        + p23 * x2 * y3
        + p14 * x * y4
        + p05 * y5
}

/// The curvature band `(lower, upper)` for a prior described by
/// `circumference_prediction` and `aspect_ratio_prediction`, shaped by
/// `curvature_factor` and the adaptive `curvature_offset` (§4.10).
///
/// `upper = curvature_factor * poly_upper(x, y) + curvature_offset`
/// `lower = (2 - curvature_factor) * poly_lower(x, y) - curvature_offset`
pub fn curvature_band(
    circumference_prediction: f64,
    aspect_ratio_prediction: f64,
    curvature_factor: f64,
    curvature_offset: f64,
) -> (f64, f64) {
    let upper_raw = evaluate(
        &CURVATURE_UPPER_LIMIT_COEFFS,
        circumference_prediction,
        aspect_ratio_prediction,
    );
    let lower_raw = evaluate(
        &CURVATURE_LOWER_LIMIT_COEFFS,
        circumference_prediction,
        aspect_ratio_prediction,
    );
    let upper = curvature_factor * upper_raw + curvature_offset;
    let lower = (2.0 - curvature_factor) * lower_raw - curvature_offset;
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn evaluate_at_origin_is_constant_term() {
        assert_relative_eq!(evaluate(&CURVATURE_UPPER_LIMIT_COEFFS, 0.0, 0.0), 223.4);
        assert_relative_eq!(evaluate(&CURVATURE_LOWER_LIMIT_COEFFS, 0.0, 0.0), 35.26);
    }

    #[test]
    fn curvature_band_applies_factor_and_offset() {
        let (lower, upper) = curvature_band(150.0, 0.9, 1.0, 80.0);
        let upper_raw = evaluate(&CURVATURE_UPPER_LIMIT_COEFFS, 150.0, 0.9);
        let lower_raw = evaluate(&CURVATURE_LOWER_LIMIT_COEFFS, 150.0, 0.9);
        assert_relative_eq!(upper, upper_raw + 80.0);
        assert_relative_eq!(lower, lower_raw - 80.0);
    }

    #[test]
    fn curvature_factor_of_two_zeroes_upper_prior_weight() {
        // curvature_factor = 2 leaves (2 - factor) = 0 for the lower limit,
        // so only the offset term remains.
        let (lower, _upper) = curvature_band(150.0, 0.9, 2.0, 80.0);
        assert_relative_eq!(lower, -80.0);
    }
}
