//! Edge segmentation (§4.6): turns a 1/0 edge plane into an ordered list of
//! single-pixel-wide arcs, split at high-curvature breakpoints.

use pupil_core::GrayImage;

/// Per-pixel segmentation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTag {
    /// Thinned away by morphological sharpening (§4.5).
    Removed,
    /// No edge here.
    Empty,
    /// Unconsumed edge pixel, available as a seed.
    Edge,
    /// Reached during region growth, not yet linearized.
    Visited,
    /// Currently on the branch being walked.
    OnBranch,
    /// Finalized into an output arc.
    Accepted,
}

impl EdgeTag {
    fn from_plane(edges: &[u8], sharpened: &[u8]) -> Vec<EdgeTag> {
        edges
            .iter()
            .zip(sharpened.iter())
            .map(|(&e, &s)| {
                if e == 1 && s == 0 {
                    EdgeTag::Removed
                } else if s == 1 {
                    EdgeTag::Edge
                } else {
                    EdgeTag::Empty
                }
            })
            .collect()
    }
}

const DX: [i32; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [i32; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

/// A single pixel position in the frame.
pub type Point = (i32, i32);

/// A contiguous, single-pixel-wide run of edge pixels with derived curvature
/// statistics, ready for scoring and fitting.
#[derive(Debug, Clone)]
pub struct Arc {
    /// Ordered chain of pixel positions.
    pub pixels: Vec<Point>,
    /// Mean image intensity sampled at each original (pre-reinflation) arc
    /// pixel, offset outward along its normal by `edge_intensity_position_
    /// offset`; falls back to the pixel itself when the offset leaves the
    /// crop.
    pub intensity: f64,
    /// Mean curvature over non-sentinel pixels, or `360.0` if none.
    pub curvature_avg: f64,
    /// Minimum curvature over non-sentinel pixels, or `360.0` if none.
    pub curvature_min: f64,
    /// Maximum curvature over non-sentinel pixels, or `360.0` if none.
    pub curvature_max: f64,
}

/// Segments the (sharpened) edge plane into arcs.
///
/// `predicted_centre`, when `Some`, drives starburst seeding from the
/// prior's predicted pupil centre; when `None`, seeding raster-scans the
/// frame for the next unconsumed edge pixel.
#[tracing::instrument(skip(image, edges, sharpened), fields(width, height))]
pub fn segment_edges(
    image: &GrayImage,
    edges: &[u8],
    sharpened: &[u8],
    width: i32,
    height: i32,
    predicted_centre: Option<(f64, f64)>,
    curvature_window_length: usize,
    curvature_upper_limit: f64,
    curvature_lower_limit: f64,
    edge_intensity_position_offset: i32,
) -> Vec<Arc> {
    let mut tags = EdgeTag::from_plane(edges, sharpened);
    let mut arcs = Vec::new();
    let mut raster_cursor = 0usize;

    loop {
        let seed = match predicted_centre {
            Some((cx, cy)) => starburst_seed(&tags, width, height, cx, cy),
            None => raster_seed(&tags, width, &mut raster_cursor),
        };

        let Some(seed) = seed else { break };
        let idx = index_of(seed, width);
        tags[idx] = EdgeTag::Visited;

        let region = grow_region(&mut tags, seed, width, height);
        if region.is_empty() {
            continue;
        }

        let chain = linearize(&mut tags, &region, width, height);
        for &p in &chain {
            tags[index_of(p, width)] = EdgeTag::Accepted;
        }
        for &p in &region {
            let i = index_of(p, width);
            if matches!(tags[i], EdgeTag::Visited | EdgeTag::OnBranch) {
                tags[i] = EdgeTag::Edge;
            }
        }

        if chain.len() < 2 {
            continue;
        }

        let (tangents, curvatures) = compute_curvatures(&chain, curvature_window_length);
        let sign = majority_sign(&curvatures);
        let breakpoints = find_breakpoints(&curvatures, sign, curvature_upper_limit, curvature_lower_limit);

        for window in breakpoints.windows(2) {
            let (start, end) = (window[0], window[1]);
            if end <= start {
                continue;
            }
            let sub_len = end - start;
            if sub_len < curvature_window_length {
                continue;
            }
            let sub_pixels: Vec<Point> = chain[start..end].to_vec();
            let sub_curvatures: Vec<f64> = curvatures[start..end].to_vec();
            let sub_tangents: Vec<(f64, f64)> = tangents[start..end].to_vec();

            let (reinflated, intensity) = reinflate(
                &mut tags,
                &sub_pixels,
                &sub_tangents,
                width,
                height,
                image,
                edge_intensity_position_offset,
            );

            let finite: Vec<f64> = sub_curvatures.iter().copied().filter(|&c| c < 180.0).collect();
            let (avg, min, max) = if finite.is_empty() {
                (360.0, 360.0, 360.0)
            } else {
                let sum: f64 = finite.iter().sum();
                (
                    sum / finite.len() as f64,
                    finite.iter().cloned().fold(f64::MAX, f64::min),
                    finite.iter().cloned().fold(f64::MIN, f64::max),
                )
            };

            arcs.push(Arc {
                pixels: reinflated,
                intensity,
                curvature_avg: avg,
                curvature_min: min,
                curvature_max: max,
            });
        }
    }

    tracing::debug!(arc_count = arcs.len(), "edge segmentation complete");
    arcs
}

fn index_of(p: Point, width: i32) -> usize {
    (width * p.1 + p.0) as usize
}

fn starburst_seed(tags: &[EdgeTag], width: i32, height: i32, cx: f64, cy: f64) -> Option<Point> {
    let (cx, cy) = (cx.round() as i32, cy.round() as i32);

    for d in 0..8 {
        let (dx, dy) = (DX[d], DY[d]);
        let (mut x, mut y) = (cx, cy);
        loop {
            x += dx;
            y += dy;
            if x < 0 || x >= width || y < 0 || y >= height {
                break;
            }
            match tags[index_of((x, y), width)] {
                EdgeTag::Edge => return Some((x, y)),
                EdgeTag::Empty | EdgeTag::Removed => continue,
                _ => break,
            }
        }
    }
    None
}

fn raster_seed(tags: &[EdgeTag], width: i32, cursor: &mut usize) -> Option<Point> {
    while *cursor < tags.len() {
        if tags[*cursor] == EdgeTag::Edge {
            let p = ((*cursor as i32) % width, (*cursor as i32) / width);
            *cursor += 1;
            return Some(p);
        }
        *cursor += 1;
    }
    None
}

fn grow_region(tags: &mut [EdgeTag], seed: Point, width: i32, height: i32) -> Vec<Point> {
    let mut region = vec![seed];
    let mut frontier = vec![seed];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &(x, y) in &frontier {
            for d in 0..8 {
                let (nx, ny) = (x + DX[d], y + DY[d]);
                if nx < 0 || nx >= width || ny < 0 || ny >= height {
                    continue;
                }
                let idx = index_of((nx, ny), width);
                if tags[idx] == EdgeTag::Edge {
                    tags[idx] = EdgeTag::Visited;
                    region.push((nx, ny));
                    next.push((nx, ny));
                }
            }
        }
        frontier = next;
    }

    region
}

fn neighbours_with_tag(tags: &[EdgeTag], p: Point, width: i32, height: i32, tag: EdgeTag) -> Vec<Point> {
    let mut out = Vec::new();
    for d in 0..8 {
        let (nx, ny) = (p.0 + DX[d], p.1 + DY[d]);
        if nx < 0 || nx >= width || ny < 0 || ny >= height {
            continue;
        }
        if tags[index_of((nx, ny), width)] == tag {
            out.push((nx, ny));
        }
    }
    out
}

/// Walks `region` into a single ordered chain, starting from the last
/// pixel discovered by region growth. At a fork, extends every branch
/// fully and keeps only the longest (first-found tie-break).
fn linearize(tags: &mut [EdgeTag], region: &[Point], width: i32, height: i32) -> Vec<Point> {
    let terminal = *region.last().unwrap();
    tags[index_of(terminal, width)] = EdgeTag::OnBranch;

    let mut chain = vec![terminal];
    let mut current = terminal;

    loop {
        let candidates = neighbours_with_tag(tags, current, width, height, EdgeTag::Visited);
        match candidates.len() {
            0 => break,
            1 => {
                let next = candidates[0];
                tags[index_of(next, width)] = EdgeTag::OnBranch;
                chain.push(next);
                current = next;
            }
            _ => {
                let mut best_branch: Vec<Point> = Vec::new();
                for &start in &candidates {
                    let branch = walk_branch(tags, start, width, height);
                    if branch.len() > best_branch.len() {
                        best_branch = branch;
                    }
                }
                for p in &best_branch {
                    tags[index_of(*p, width)] = EdgeTag::OnBranch;
                }
                current = *best_branch.last().unwrap_or(&current);
                let extended = !best_branch.is_empty();
                chain.extend(best_branch);
                if !extended {
                    break;
                }
            }
        }
    }

    chain
}

fn walk_branch(tags: &[EdgeTag], start: Point, width: i32, height: i32) -> Vec<Point> {
    let mut visited_local = vec![start];
    let mut current = start;
    loop {
        let candidates: Vec<Point> = neighbours_with_tag(tags, current, width, height, EdgeTag::Visited)
            .into_iter()
            .filter(|p| !visited_local.contains(p))
            .collect();
        match candidates.len() {
            0 => break,
            1 => {
                current = candidates[0];
                visited_local.push(current);
            }
            _ => {
                let mut best = Vec::new();
                for &c in &candidates {
                    let sub = walk_branch_from(tags, c, width, height, &visited_local);
                    if sub.len() > best.len() {
                        best = sub;
                    }
                }
                if best.is_empty() {
                    break;
                }
                current = *best.last().unwrap();
                visited_local.extend(best);
            }
        }
    }
    visited_local
}

fn walk_branch_from(tags: &[EdgeTag], start: Point, width: i32, height: i32, exclude: &[Point]) -> Vec<Point> {
    let mut chain = vec![start];
    let mut current = start;
    loop {
        let candidates: Vec<Point> = neighbours_with_tag(tags, current, width, height, EdgeTag::Visited)
            .into_iter()
            .filter(|p| !exclude.contains(p) && !chain.contains(p))
            .collect();
        match candidates.first() {
            None => break,
            Some(&next) => {
                current = next;
                chain.push(next);
            }
        }
    }
    chain
}

/// Per-pixel tangent (unit 8-direction step to successor) and signed
/// curvature in degrees over a centred window, wrapped to `(-180, 180]`.
/// The first and last `window` pixels carry the sentinel `360.0`.
fn compute_curvatures(chain: &[Point], window: usize) -> (Vec<(f64, f64)>, Vec<f64>) {
    let n = chain.len();
    let mut tangents = Vec::with_capacity(n);
    for i in 0..n {
        let (from, to) = if i + 1 < n {
            (chain[i], chain[i + 1])
        } else {
            (chain[i.saturating_sub(1)], chain[i])
        };
        let dx = (to.0 - from.0) as f64;
        let dy = (to.1 - from.1) as f64;
        let norm = (dx * dx + dy * dy).sqrt();
        if norm > 0.0 {
            tangents.push((dx / norm, dy / norm));
        } else {
            tangents.push(tangents.last().copied().unwrap_or((1.0, 0.0)));
        }
    }

    let mut curvatures = vec![360.0; n];
    if n > 2 * window {
        for i in window..(n - window) {
            let first: Vec<(f64, f64)> = tangents[(i - window)..i].to_vec();
            let second: Vec<(f64, f64)> = tangents[i..(i + window)].to_vec();
            let mean_first = mean_angle(&first);
            let mean_second = mean_angle(&second);
            let mut kappa = (mean_second - mean_first).to_degrees();
            while kappa > 180.0 {
                kappa -= 360.0;
            }
            while kappa <= -180.0 {
                kappa += 360.0;
            }
            curvatures[i] = kappa;
        }
    }

    (tangents, curvatures)
}

fn mean_angle(tangents: &[(f64, f64)]) -> f64 {
    let (sx, sy) = tangents.iter().fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
    sy.atan2(sx)
}

fn majority_sign(curvatures: &[f64]) -> f64 {
    let (mut pos, mut neg) = (0, 0);
    for &k in curvatures {
        if k >= 180.0 {
            continue;
        }
        if k > 0.0 {
            pos += 1;
        } else if k < 0.0 {
            neg += 1;
        }
    }
    if neg > pos {
        -1.0
    } else {
        1.0
    }
}

fn find_breakpoints(curvatures: &[f64], sign: f64, upper_limit: f64, lower_limit: f64) -> Vec<usize> {
    let mut points = vec![0usize];
    for (i, &k) in curvatures.iter().enumerate() {
        if k >= 180.0 {
            continue;
        }
        if k.abs() >= upper_limit || sign * k <= lower_limit {
            points.push(i);
        }
    }
    points.push(curvatures.len().saturating_sub(1));
    points.sort_unstable();
    points.dedup();
    points
}

fn ceil2(v: f64) -> f64 {
    if v >= 0.0 {
        v.ceil()
    } else {
        v.floor()
    }
}

fn reinflate(
    tags: &mut [EdgeTag],
    arc: &[Point],
    tangents: &[(f64, f64)],
    width: i32,
    height: i32,
    image: &GrayImage,
    offset: i32,
) -> (Vec<Point>, f64) {
    let mut out = arc.to_vec();
    let mut intensity_sum = 0.0;

    for (i, &p) in arc.iter().enumerate() {
        for d in 0..8 {
            let (nx, ny) = (p.0 + DX[d], p.1 + DY[d]);
            if nx < 0 || nx >= width || ny < 0 || ny >= height {
                continue;
            }
            let idx = index_of((nx, ny), width);
            if tags[idx] == EdgeTag::Removed {
                tags[idx] = EdgeTag::Accepted;
                out.push((nx, ny));
            }
        }

        let (tx, ty) = tangents.get(i).copied().unwrap_or((1.0, 0.0));
        let normal = (-ty, tx);
        let ox = p.0 + (offset as f64 * ceil2(normal.0)) as i32;
        let oy = p.1 + (offset as f64 * ceil2(normal.1)) as i32;
        intensity_sum += sample_intensity(image, ox, oy, p) as f64;
    }

    let intensity = if arc.is_empty() { 0.0 } else { intensity_sum / arc.len() as f64 };
    (out, intensity)
}

fn sample_intensity(image: &GrayImage, x: i32, y: i32, fallback: Point) -> u8 {
    image.get(x, y).unwrap_or_else(|| image.get(fallback.0, fallback.1).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_a_simple_horizontal_line() {
        let width = 10;
        let height = 3;
        let mut edges = vec![0u8; (width * height) as usize];
        for x in 2..8 {
            edges[(width * 1 + x) as usize] = 1;
        }
        let image = GrayImage::filled(width as u32, height as u32, 100);
        let arcs = segment_edges(&image, &edges, &edges, width, height, None, 2, 160.0, -160.0, 5);
        assert!(!arcs.is_empty());
        let total_pixels: usize = arcs.iter().map(|a| a.pixels.len()).sum();
        assert!(total_pixels >= 6);
    }

    #[test]
    fn empty_plane_produces_no_arcs() {
        let width = 5;
        let height = 5;
        let edges = vec![0u8; (width * height) as usize];
        let image = GrayImage::filled(width as u32, height as u32, 100);
        let arcs = segment_edges(&image, &edges, &edges, width, height, None, 2, 160.0, -160.0, 5);
        assert!(arcs.is_empty());
    }
}
