//! Uniform cubic B-splines, expressed as chains of cubic Bezier segments.
//!
//! Edge routes store a spline as its Bezier control points: after the start point, every three
//! consecutive points are the two inner control points and the end point of one Bezier segment.

use strata_graph::Point;

/// Converts the uniform cubic B-spline with control polygon `points` into Bezier control points.
///
/// The curve starts at the first and ends at the last point of `points`; both ends are clamped
/// by reflecting the neighboring control point. The returned chain excludes the two end points,
/// so for `n + 1` input points it holds `3n - 1` points. Fewer than two input points yield an
/// empty chain.
pub fn bspline_to_bezier(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    let mut padded = Vec::with_capacity(n + 2);
    padded.push(points[0] * 2.0 - points[1]);
    padded.extend_from_slice(points);
    padded.push(points[n - 1] * 2.0 - points[n - 2]);

    let mut out = Vec::with_capacity(3 * (n - 1));
    for w in padded.windows(4) {
        let (p1, p2, p3) = (w[1], w[2], w[3]);
        out.push((p1 * 2.0 + p2) * (1.0 / 3.0));
        out.push((p1 + p2 * 2.0) * (1.0 / 3.0));
        out.push((p1 + p2 * 4.0 + p3) * (1.0 / 6.0));
    }
    out.pop();
    out
}

/// Evaluates the Bezier chain `start, chain..., end` at `t` in `[0, 1]` of segment `segment`.
///
/// Used to sample a route, e.g. for hit testing or bounding boxes.
pub fn evaluate(start: Point, chain: &[Point], end: Point, segment: usize, t: f64) -> Option<Point> {
    let mut all = Vec::with_capacity(chain.len() + 2);
    all.push(start);
    all.extend_from_slice(chain);
    all.push(end);
    let base = segment * 3;
    let (Some(&b0), Some(&b1), Some(&b2), Some(&b3)) = (
        all.get(base),
        all.get(base + 1),
        all.get(base + 2),
        all.get(base + 3),
    ) else {
        return None;
    };
    let u = 1.0 - t;
    Some(b0 * (u * u * u) + b1 * (3.0 * u * u * t) + b2 * (3.0 * u * t * t) + b3 * (t * t * t))
}
