use super::{Point3, Vector3, TOLERANCE};

/// Closest point on a polyline to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    /// The closest point itself.
    pub point: Point3,
    /// Index of the segment containing the closest point.
    pub segment: usize,
    /// Parameter along that segment in `[0, 1]`.
    pub t: f64,
    /// Squared distance from the query point.
    pub distance_sq: f64,
}

/// Returns the closest point on segment `a → b` and its parameter `t`.
#[must_use]
pub fn closest_point_on_segment(p: &Point3, a: &Point3, b: &Point3) -> (Point3, f64) {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < TOLERANCE * TOLERANCE {
        return (*a, 0.0);
    }

    // Project onto the infinite line, clamp to the segment.
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (a + d * t, t)
}

/// Number of segments of a polyline with `n` points.
#[must_use]
pub fn segment_count(n: usize, closed: bool) -> usize {
    match (n, closed) {
        (0 | 1, _) => 0,
        (2, true) => 1,
        (n, true) => n,
        (n, false) => n - 1,
    }
}

/// Finds the closest point on a polyline.
///
/// Ties between segments go to the lowest segment index so the result is
/// deterministic. Returns `None` for polylines with fewer than two points.
#[must_use]
pub fn closest_point_on_polyline(
    p: &Point3,
    points: &[Point3],
    closed: bool,
) -> Option<ClosestPoint> {
    let n = points.len();
    let mut best: Option<ClosestPoint> = None;

    for i in 0..segment_count(n, closed) {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        let (point, t) = closest_point_on_segment(p, a, b);
        let distance_sq = (p - point).norm_squared();
        if best.map_or(true, |c| distance_sq < c.distance_sq) {
            best = Some(ClosestPoint {
                point,
                segment: i,
                t,
                distance_sq,
            });
        }
    }

    best
}

/// Unit direction of segment `i`, or `None` if it has zero length.
#[must_use]
pub fn segment_direction(points: &[Point3], i: usize) -> Option<Vector3> {
    let n = points.len();
    let d = points[(i + 1) % n] - points[i];
    let len = d.norm();
    (len > TOLERANCE).then(|| d / len)
}

/// Tangent of the polyline at a closest point.
///
/// Inside a segment this is the segment direction. At a shared vertex the
/// directions of both adjacent segments are averaged, so that points near a
/// corner are classified against the bisector rather than an arbitrary leg.
#[must_use]
pub fn tangent_at(points: &[Point3], closed: bool, closest: &ClosestPoint) -> Vector3 {
    let n = points.len();
    let segments = segment_count(n, closed);
    let own = segment_direction(points, closest.segment).unwrap_or_else(Vector3::zeros);

    let neighbor = if closest.t <= TOLERANCE {
        if closest.segment > 0 {
            Some(closest.segment - 1)
        } else if closed {
            Some(segments - 1)
        } else {
            None
        }
    } else if closest.t >= 1.0 - TOLERANCE {
        if closest.segment + 1 < segments {
            Some(closest.segment + 1)
        } else if closed {
            Some(0)
        } else {
            None
        }
    } else {
        None
    };

    let Some(other) = neighbor.and_then(|j| segment_direction(points, j)) else {
        return own;
    };
    let sum = own + other;
    let len = sum.norm();
    if len > TOLERANCE {
        sum / len
    } else {
        own
    }
}

/// Total length of a polyline.
#[must_use]
pub fn polyline_length(points: &[Point3], closed: bool) -> f64 {
    let n = points.len();
    (0..segment_count(n, closed))
        .map(|i| (points[(i + 1) % n] - points[i]).norm())
        .sum()
}

/// Arithmetic mean of a point set, or `None` if it is empty.
#[must_use]
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / points.len() as f64;
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum * inv))
}
