//! Constrained direct conic (ellipse) fit and the rotation transform that
//! turns its coefficients into size/shape/position.
//!
//! # Dependencies
//!
//! - [`nalgebra`] - the scatter-matrix inversion, the `Scatter^-1 *
//!   Constraint` eigendecomposition, and the null-space solve used to
//!   recover the chosen eigenvector. `nalgebra` is not part of the
//!   dependency stack this crate's layout was otherwise grounded on; it is
//!   pulled in specifically for this general eigenproblem, which the
//!   fixed-size 3x3/4x4 math used elsewhere in this codebase's lineage
//!   doesn't cover (see `DESIGN.md`).

use crate::error::{GeomError, GeomResult};
use nalgebra::{Complex, DMatrix};

/// A fitted ellipse: its conic coefficients plus the geometry derived from
/// them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    /// Conic coefficients `[A, B, C, D, E, F]` satisfying
    /// `A x^2 + B xy + C y^2 + D x + E y + F = 0`.
    pub coefficients: [f64; 6],
    /// Centre X, in the same coordinate frame as the fitted points.
    pub x: f64,
    /// Centre Y, in the same coordinate frame as the fitted points.
    pub y: f64,
    /// Semi-major axis length.
    pub semi_major: f64,
    /// Semi-minor axis length.
    pub semi_minor: f64,
    /// Axis-aligned bounding width.
    pub width: f64,
    /// Axis-aligned bounding height.
    pub height: f64,
    /// Rotation angle, radians, of the major axis from the X axis.
    pub alpha: f64,
    /// Circumference via Ramanujan's second approximation.
    pub circumference: f64,
    /// `semi_minor / semi_major`, in `(0, 1]`.
    pub aspect_ratio: f64,
    /// `circumference / (2 * pi)`.
    pub radius: f64,
}

/// The seven quantities the rotation transform derives from a conic's
/// coefficients. Kept as a fully-named struct, not a 6-element array, so
/// `alpha` is never dropped the way it is in a six-slot container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedEllipseParams {
    /// Semi-major axis length.
    pub semi_major: f64,
    /// Semi-minor axis length.
    pub semi_minor: f64,
    /// Centre X.
    pub x: f64,
    /// Centre Y.
    pub y: f64,
    /// Axis-aligned bounding width.
    pub width: f64,
    /// Axis-aligned bounding height.
    pub height: f64,
    /// Rotation angle, radians.
    pub alpha: f64,
}

/// Fixed constraint matrix encoding `4AC - B^2 = 1`: a 2 at `(0,2)` and
/// `(2,0)`, a -1 at `(1,1)`, zero elsewhere.
fn constraint_matrix() -> DMatrix<f64> {
    let mut c = DMatrix::<f64>::zeros(6, 6);
    c[(0, 2)] = 2.0;
    c[(2, 0)] = 2.0;
    c[(1, 1)] = -1.0;
    c
}

/// Fits a conic to `points` using the Fitzgibbon direct least-squares
/// method, constrained to always return an ellipse (`4AC - B^2 = 1`).
///
/// `points` must have at least 6 entries; fewer leaves the 6x6 scatter
/// matrix rank-deficient.
pub fn fit(points: &[(f64, f64)]) -> GeomResult<Ellipse> {
    if points.len() < 6 {
        return Err(GeomError::TooFewPoints(points.len()));
    }

    let design = DMatrix::<f64>::from_fn(points.len(), 6, |row, col| {
        let (x, y) = points[row];
        match col {
            0 => x * x,
            1 => x * y,
            2 => y * y,
            3 => x,
            4 => y,
            _ => 1.0,
        }
    });

    let constraint = constraint_matrix();
    let scatter = design.transpose() * &design;
    let scatter_inv = scatter.try_inverse().ok_or(GeomError::SingularScatter)?;
    let system = scatter_inv * &constraint;

    let eigenvalue = smallest_positive_real_eigenvalue(&system)?;
    let eigenvector = null_space_vector(&system, eigenvalue);

    let normalization = (eigenvector.transpose() * &constraint * &eigenvector)[(0, 0)];
    if !normalization.is_finite() || normalization <= 0.0 {
        return Err(GeomError::NonFiniteGeometry);
    }
    let scale = 1.0 / normalization.sqrt();

    let coefficients = [
        scale * eigenvector[0],
        scale * eigenvector[1],
        scale * eigenvector[2],
        scale * eigenvector[3],
        scale * eigenvector[4],
        scale * eigenvector[5],
    ];

    let rotated = rotation_transform(&coefficients)?;

    let h = ((rotated.semi_major - rotated.semi_minor) / (rotated.semi_major + rotated.semi_minor))
        .powi(2);
    let circumference =
        std::f64::consts::PI * (rotated.semi_major + rotated.semi_minor) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
    let aspect_ratio = rotated.semi_minor / rotated.semi_major;
    let radius = 0.5 * (rotated.semi_major + rotated.semi_minor);

    if !circumference.is_finite() || !aspect_ratio.is_finite() {
        return Err(GeomError::NonFiniteGeometry);
    }

    Ok(Ellipse {
        coefficients,
        x: rotated.x,
        y: rotated.y,
        semi_major: rotated.semi_major,
        semi_minor: rotated.semi_minor,
        width: rotated.width,
        height: rotated.height,
        alpha: rotated.alpha,
        circumference,
        aspect_ratio,
        radius,
    })
}

/// Finds the eigenvalue of `system` (a 6x6 real matrix) with the smallest
/// magnitude among those that are real and strictly greater than `1e-11`.
///
/// `nalgebra` has no general non-symmetric eigenvector routine, but its
/// `Schur` decomposition does expose the eigenvalues of an arbitrary real
/// square matrix (as complex numbers, since a real matrix can have complex
/// conjugate pairs); the eigenvector itself is recovered separately via
/// [`null_space_vector`].
fn smallest_positive_real_eigenvalue(system: &DMatrix<f64>) -> GeomResult<f64> {
    const REAL_TOLERANCE: f64 = 1e-9;
    const POSITIVE_TOLERANCE: f64 = 1e-11;

    let schur = nalgebra::linalg::Schur::new(system.clone());
    let eigenvalues: nalgebra::DVector<Complex<f64>> = schur.complex_eigenvalues();

    let mut best: Option<f64> = None;
    for lambda in eigenvalues.iter() {
        if lambda.im.abs() > REAL_TOLERANCE {
            continue;
        }
        let re = lambda.re;
        if re <= POSITIVE_TOLERANCE {
            continue;
        }
        if best.is_none_or(|b| re < b) {
            best = Some(re);
        }
    }

    best.ok_or(GeomError::NoPositiveEigenvalue)
}

/// Recovers the eigenvector of `system` for eigenvalue `lambda` as the
/// right singular vector of `system - lambda * I` with the smallest
/// singular value (its null space, since `lambda` is an exact eigenvalue).
fn null_space_vector(system: &DMatrix<f64>, lambda: f64) -> nalgebra::DVector<f64> {
    let n = system.nrows();
    let shifted = system - DMatrix::<f64>::identity(n, n) * lambda;
    let svd = nalgebra::linalg::SVD::new(shifted, true, true);
    let v_t = svd.v_t.expect("SVD was computed with compute_v = true");

    let mut min_index = 0;
    let mut min_value = f64::INFINITY;
    for (i, &s) in svd.singular_values.iter().enumerate() {
        if s < min_value {
            min_value = s;
            min_index = i;
        }
    }
    v_t.row(min_index).transpose()
}

/// Derives semi-axes, centre, bounding size, and rotation angle from conic
/// coefficients `[A, B, C, D, E, F]`.
pub fn rotation_transform(c: &[f64; 6]) -> GeomResult<RotatedEllipseParams> {
    let (a, b, cc, d, e, f) = (c[0], c[1], c[2], c[3], c[4], c[5]);
    let alpha = 0.5 * b.atan2(a - cc);

    let (cos_a, sin_a) = (alpha.cos(), alpha.sin());
    let aa = a * cos_a * cos_a + b * cos_a * sin_a + cc * sin_a * sin_a;
    let cc2 = a * sin_a * sin_a - b * cos_a * sin_a + cc * cos_a * cos_a;
    let dd = d * cos_a + e * sin_a;
    let ee = -d * sin_a + e * cos_a;
    let ff = f;

    let a_axis = ((-4.0 * ff * aa * cc2 + cc2 * dd * dd + aa * ee * ee) / (4.0 * aa * cc2 * cc2)).sqrt();
    let b_axis = ((-4.0 * ff * aa * cc2 + cc2 * dd * dd + aa * ee * ee) / (4.0 * aa * aa * cc2)).sqrt();

    let (semi_major, semi_minor) = if a_axis >= b_axis {
        (a_axis, b_axis)
    } else {
        (b_axis, a_axis)
    };

    let x = -(dd / (2.0 * aa)) * cos_a + (ee / (2.0 * cc2)) * sin_a;
    let y = -(dd / (2.0 * aa)) * sin_a - (ee / (2.0 * cc2)) * cos_a;

    let width = 2.0 * ((semi_major * cos_a).powi(2) + (semi_minor * sin_a).powi(2)).sqrt();
    let height = 2.0 * ((semi_major * sin_a).powi(2) + (semi_minor * cos_a).powi(2)).sqrt();

    let params = RotatedEllipseParams {
        semi_major,
        semi_minor,
        x,
        y,
        width,
        height,
        alpha,
    };

    let all_finite = [
        params.semi_major,
        params.semi_minor,
        params.x,
        params.y,
        params.width,
        params.height,
        params.alpha,
    ]
    .iter()
    .all(|v| v.is_finite());

    if !all_finite {
        return Err(GeomError::NonFiniteGeometry);
    }

    Ok(params)
}
