//! Combinatorial ellipse fitting and selection (§4.8): every non-empty
//! subset of the retained arcs is fit independently in parallel, filtered
//! by shape/stability gates, and the best-scoring accepted candidate wins.

use pupil_core::DetectionConfig;
use pupil_geom::Ellipse;
use pupil_ops::score::ScoredArc;
use rayon::prelude::*;

/// An accepted ellipse fit, with the residual and edge-set bookkeeping the
/// selection score and the temporal updater both need.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The fitted ellipse geometry.
    pub ellipse: Ellipse,
    /// Mean of the worst `fit_edge_fraction` fraction of conic residuals.
    pub fit_error: f64,
    /// Number of pixels across every arc in the winning subset.
    pub edge_length: usize,
    /// Pixels across every arc in the winning subset, in crop-local
    /// coordinates.
    pub edge_indices: Vec<(i32, i32)>,
    /// Sum of the selection-score components.
    pub score: f64,
    /// Length-weighted mean of the constituent arcs' `curvature_avg`,
    /// excluding sentinel (360) values; `360.0` if none are finite.
    pub curvature_avg: f64,
}

/// Enumerates every non-empty subset of `arcs` (at most `ellipse_fit_number_
/// maximum` of them), fits each with [`pupil_geom::ellipse::fit`], filters
/// by §4.8's acceptance gates, and returns the highest-scoring accepted
/// candidate, or `None` if nothing passed.
#[allow(clippy::too_many_arguments)]
pub fn select(
    arcs: &[ScoredArc],
    config: &DetectionConfig,
    with_prior: bool,
    circumference_prediction: f64,
    aspect_ratio_prediction: f64,
    threshold_circumference_change: f64,
    threshold_aspect_ratio_change: f64,
) -> Option<Candidate> {
    let n = arcs.len().min(config.ellipse_fit_number_maximum);
    if n == 0 {
        return None;
    }

    let length_gate = if with_prior { circumference_prediction } else { config.circumference_min }
        * config.ellipse_fit_number_maximum as f64;

    let mut subsets: Vec<u32> = (1u32..(1u32 << n)).collect();
    subsets.sort_by_key(|s| std::cmp::Reverse(s.count_ones()));

    subsets
        .into_par_iter()
        .filter_map(|mask| {
            let members: Vec<&ScoredArc> = (0..n).filter(|i| mask & (1 << i) != 0).map(|i| &arcs[i]).collect();
            let edge_set_length: usize = members.iter().map(|a| a.arc.pixels.len()).sum();
            let fails_gate = if with_prior {
                (edge_set_length as f64) < length_gate
            } else {
                (edge_set_length as f64) <= length_gate
            };
            if fails_gate {
                return None;
            }

            let points: Vec<(f64, f64)> =
                members.iter().flat_map(|a| a.arc.pixels.iter().map(|&(x, y)| (x as f64, y as f64))).collect();

            let ellipse = pupil_geom::ellipse::fit(&points).ok()?;

            if ellipse.circumference < config.circumference_min || ellipse.circumference > config.circumference_max {
                return None;
            }
            if ellipse.aspect_ratio < config.aspect_ratio_min {
                return None;
            }
            if with_prior {
                if (ellipse.circumference - circumference_prediction).abs() > threshold_circumference_change {
                    return None;
                }
                if (ellipse.aspect_ratio - aspect_ratio_prediction).abs() > threshold_aspect_ratio_change {
                    return None;
                }
            }

            let [a, b, c, d, e, f] = ellipse.coefficients;
            let mut residuals: Vec<f64> =
                points.iter().map(|&(x, y)| (a * x * x + b * x * y + c * y * y + d * x + e * y + f).abs()).collect();
            residuals.sort_by(|x, y| y.partial_cmp(x).unwrap_or(std::cmp::Ordering::Equal));
            let worst_count = ((config.fit_edge_fraction * edge_set_length as f64).ceil() as usize).max(1);
            let worst_count = worst_count.min(residuals.len());
            let fit_error = residuals[..worst_count].iter().sum::<f64>() / worst_count as f64;
            if fit_error > config.ellipse_fit_error_maximum {
                return None;
            }

            let score_circumference = if with_prior {
                (20.0 - 20.0 * (ellipse.circumference - circumference_prediction).abs()
                    / config.circumference_change_threshold)
                    .max(0.0)
            } else {
                0.0
            };
            let score_aspect_ratio = if with_prior {
                (20.0 - 20.0 * (ellipse.aspect_ratio - aspect_ratio_prediction).abs()
                    / config.aspect_ratio_change_threshold)
                    .max(0.0)
            } else {
                0.0
            };
            let score_fit_error = (20.0 - 20.0 * fit_error / config.ellipse_fit_error_maximum).max(0.0);
            let score_length = (20.0
                - 40.0 * (edge_set_length as f64 - circumference_prediction).abs() / circumference_prediction)
                .max(0.0);

            let score = score_circumference + score_aspect_ratio + score_fit_error + score_length;

            let edge_indices: Vec<(i32, i32)> =
                members.iter().flat_map(|a| a.arc.pixels.iter().copied()).collect();

            let mut curvature_weight = 0.0;
            let mut curvature_sum = 0.0;
            for member in &members {
                if member.arc.curvature_avg < 180.0 {
                    let weight = member.arc.pixels.len() as f64;
                    curvature_weight += weight;
                    curvature_sum += weight * member.arc.curvature_avg;
                }
            }
            let curvature_avg = if curvature_weight > 0.0 { curvature_sum / curvature_weight } else { 360.0 };

            Some(Candidate { ellipse, fit_error, edge_length: edge_set_length, edge_indices, score, curvature_avg })
        })
        .reduce(
            || None,
            |a, b| match (a, b) {
                (Some(a), Some(b)) => Some(if b.score > a.score { b } else { a }),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            },
        )
}
