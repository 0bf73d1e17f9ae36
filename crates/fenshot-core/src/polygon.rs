//! Closed-contour helpers: perimeter and Douglas–Peucker simplification.

use nalgebra::Point2;

/// Length of the closed polyline through `pts` (last point joins the first).
pub fn closed_perimeter(pts: &[Point2<f32>]) -> f32 {
    if pts.len() < 2 {
        return 0.0;
    }
    let n = pts.len();
    (0..n).map(|i| (pts[(i + 1) % n] - pts[i]).norm()).sum()
}

fn dist_to_line(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let len = ab.norm();
    if len <= f32::EPSILON {
        return ap.norm();
    }
    (ab.x * ap.y - ab.y * ap.x).abs() / len
}

// Keeps the vertices strictly between `first` and `last` (indices into a
// ring of `n` points, walking forward) that lie farther than `epsilon` from
// the chord, recursively.
fn simplify_chain(
    pts: &[Point2<f32>],
    first: usize,
    last: usize,
    epsilon: f32,
    keep: &mut [bool],
) {
    let n = pts.len();
    let span = (last + n - first) % n;
    if span < 2 {
        return;
    }

    let a = pts[first];
    let b = pts[last];
    let mut best = None;
    let mut best_dist = epsilon;
    for step in 1..span {
        let idx = (first + step) % n;
        let d = dist_to_line(pts[idx], a, b);
        if d > best_dist {
            best_dist = d;
            best = Some(idx);
        }
    }

    if let Some(idx) = best {
        keep[idx] = true;
        simplify_chain(pts, first, idx, epsilon, keep);
        simplify_chain(pts, idx, last, epsilon, keep);
    }
}

fn farthest_from(pts: &[Point2<f32>], from: usize) -> usize {
    let origin = pts[from];
    let mut best = from;
    let mut best_d = -1.0f32;
    for (i, p) in pts.iter().enumerate() {
        let d = (p - origin).norm_squared();
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Approximate a closed contour with fewer vertices (Douglas–Peucker).
///
/// The ring is split at two mutually distant points found by a short
/// farthest-point walk from the first vertex; each half is simplified with
/// tolerance `epsilon`. The returned vertices keep the contour's order.
pub fn approx_closed_polygon(pts: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    let n = pts.len();
    if n <= 2 {
        return pts.to_vec();
    }

    let mut start = 0usize;
    for _ in 0..3 {
        start = farthest_from(pts, start);
    }
    let end = farthest_from(pts, start);
    if start == end {
        return vec![pts[start]];
    }

    let mut keep = vec![false; n];
    keep[start] = true;
    keep[end] = true;
    simplify_chain(pts, start, end, epsilon, &mut keep);
    simplify_chain(pts, end, start, epsilon, &mut keep);

    // Emit in ring order starting at `start`.
    (0..n)
        .map(|step| (start + step) % n)
        .filter(|&idx| keep[idx])
        .map(|idx| pts[idx])
        .collect()
}
