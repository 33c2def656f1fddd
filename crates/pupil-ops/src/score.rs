//! Arc scoring (§4.7): ranks candidate arcs by how well their intensity,
//! length, position, and curvature match the prior's predictions.

use crate::segment::Arc;

/// A scored arc, ready for the top-`N` retention pass.
#[derive(Debug, Clone)]
pub struct ScoredArc {
    /// The underlying arc.
    pub arc: Arc,
    /// Mean image intensity sampled along the arc.
    pub intensity: f64,
    /// Mean signed distance from the predicted centre, in ROI-absolute
    /// coordinates.
    pub distance: f64,
    /// Sum of the component scores below.
    pub score: f64,
}

fn clip0(v: f64) -> f64 {
    v.max(0.0)
}

/// Scores every arc against the supplied predictions.
///
/// `with_prior` gates the position and curvature components, which are
/// zero without a usable prior.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip(arcs), fields(arc_count = arcs.len(), with_prior))]
pub fn score_arcs(
    arcs: Vec<Arc>,
    centre_x: f64,
    centre_y: f64,
    edge_intensity_prediction: f64,
    circumference_prediction: f64,
    with_prior: bool,
    radius_prediction: f64,
    edge_curvature_prediction: f64,
) -> Vec<ScoredArc> {
    let scored: Vec<ScoredArc> = arcs
        .into_iter()
        .map(|arc| {
            let length = arc.pixels.len() as f64;

            let mut distance_sum = 0.0;
            for &(x, y) in &arc.pixels {
                let dx = x as f64 - centre_x;
                let dy = y as f64 - centre_y;
                distance_sum += (dx * dx + dy * dy).sqrt();
            }
            let intensity = arc.intensity;
            let distance = distance_sum / length;

            let intensity_score =
                clip0(20.0 / (1.0 + 0.01 * 0.9_f64.powf(edge_intensity_prediction - intensity)));

            let length_score = if length <= circumference_prediction {
                clip0(12.0 * (1.0 - (-0.0002 * circumference_prediction * length).exp()))
            } else {
                clip0(12.0 / (1.0 + 0.01 * 0.85_f64.powf(circumference_prediction - length)))
            };

            let (position_score, curvature_score) = if with_prior {
                let position = clip0(15.0 - 15.0 * (distance - radius_prediction).abs() / radius_prediction);
                let curvature = clip0(
                    7.0 - 7.0 * (arc.curvature_avg - edge_curvature_prediction).abs() / edge_curvature_prediction,
                );
                (position, curvature)
            } else {
                (0.0, 0.0)
            };

            let score = intensity_score + length_score + position_score + curvature_score;

            ScoredArc { arc, intensity, distance, score }
        })
        .collect();

    tracing::debug!(scored_count = scored.len(), "arc scoring complete");
    scored
}

/// Retains the top `max_count` arcs by score, stable on ties (first
/// occurrence wins).
pub fn retain_top(scored: Vec<ScoredArc>, max_count: usize) -> Vec<ScoredArc> {
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&a, &b| {
        scored[b].score.partial_cmp(&scored[a].score).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });
    order.truncate(max_count);
    order.sort_unstable();

    let mut scored: Vec<Option<ScoredArc>> = scored.into_iter().map(Some).collect();
    order.into_iter().map(|i| scored[i].take().expect("index appears once")).collect()
}
