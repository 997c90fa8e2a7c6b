use super::intersect_2d::{orientation, point_on_segment, segments_touch};
use super::{Point2, Vector2, MIN_AREA, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the polygon with counter-clockwise winding.
#[must_use]
pub fn ensure_ccw(points: &[Point2]) -> Vec<Point2> {
    let mut out = points.to_vec();
    if signed_area_2d(&out) < 0.0 {
        out.reverse();
    }
    out
}

/// Returns the polygon with clockwise winding.
#[must_use]
pub fn ensure_cw(points: &[Point2]) -> Vec<Point2> {
    let mut out = points.to_vec();
    if signed_area_2d(&out) > 0.0 {
        out.reverse();
    }
    out
}

/// Rotates a closed polygon so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y. Ensures deterministic output for tests.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2]) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
            best = i;
        }
    }
    if best == 0 {
        return points.to_vec();
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Axis-aligned bounds of a point set as `(min, max)`.
#[must_use]
pub fn bounds_2d(points: &[Point2]) -> Option<(Point2, Point2)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for pt in &points[1..] {
        min.x = min.x.min(pt.x);
        min.y = min.y.min(pt.y);
        max.x = max.x.max(pt.x);
        max.y = max.y.max(pt.y);
    }
    Some((min, max))
}

/// Returns `true` if `p` lies on any edge of the closed polygon.
#[must_use]
pub fn point_on_boundary(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    (0..n).any(|i| point_on_segment(p, &polygon[i], &polygon[(i + 1) % n]))
}

/// Even-odd point-in-polygon test. Points on the boundary are unspecified;
/// combine with [`point_on_boundary`] when that matters.
#[must_use]
pub fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Removes consecutive duplicates and collinear vertices from a closed polygon.
///
/// Runs until stable, so spikes that fold back onto the previous edge are
/// removed as well.
#[must_use]
pub fn cleanup_polygon(points: &[Point2]) -> Vec<Point2> {
    let mut pts = points.to_vec();
    loop {
        let before = pts.len();

        let mut deduped: Vec<Point2> = Vec::with_capacity(pts.len());
        for pt in &pts {
            if deduped.last().is_none_or(|last| (pt - last).norm() > TOLERANCE) {
                deduped.push(*pt);
            }
        }
        while deduped.len() > 1
            && deduped
                .first()
                .zip(deduped.last())
                .is_some_and(|(f, l)| (f - l).norm() <= TOLERANCE)
        {
            deduped.pop();
        }

        let n = deduped.len();
        if n < 3 {
            return deduped;
        }
        let mut kept = Vec::with_capacity(n);
        for i in 0..n {
            let prev = &deduped[(i + n - 1) % n];
            let cur = &deduped[i];
            let next = &deduped[(i + 1) % n];
            let span = (next - prev).norm().max((cur - prev).norm());
            if orientation(prev, cur, next).abs() > TOLERANCE * span.max(1.0) {
                kept.push(*cur);
            }
        }
        pts = kept;
        if pts.len() == before || pts.len() < 3 {
            return pts;
        }
    }
}

/// Returns `true` if the closed polygon has no self-intersections.
///
/// Adjacent edges may only share their common vertex; non-adjacent edges
/// may not touch at all.
#[must_use]
pub fn is_simple(points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a0 = &points[i];
        let a1 = &points[(i + 1) % n];
        if (a1 - a0).norm() < TOLERANCE {
            return false;
        }
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            let b0 = &points[j];
            let b1 = &points[(j + 1) % n];
            if adjacent {
                // Shared vertex is fine; folding back over each other is not.
                let (shared, other_a, other_b) = if j == i + 1 {
                    (a1, a0, b1)
                } else {
                    (a0, a1, b0)
                };
                let da = other_a - shared;
                let db = other_b - shared;
                if orientation(shared, other_a, other_b).abs() < TOLERANCE * da.norm().max(1.0)
                    && da.dot(&db) > 0.0
                {
                    return false;
                }
                continue;
            }
            if segments_touch(a0, a1, b0, b1) {
                return false;
            }
        }
    }
    true
}

/// Returns `true` if every vertex of `inner` lies inside `outer` and no
/// edges cross.
#[must_use]
pub fn polygon_inside(inner: &[Point2], outer: &[Point2]) -> bool {
    if !inner
        .iter()
        .all(|p| point_in_polygon(p, outer) && !point_on_boundary(p, outer))
    {
        return false;
    }
    let n = inner.len();
    let m = outer.len();
    for i in 0..n {
        for j in 0..m {
            if segments_touch(
                &inner[i],
                &inner[(i + 1) % n],
                &outer[j],
                &outer[(j + 1) % m],
            ) {
                return false;
            }
        }
    }
    true
}

/// Returns `true` if the two closed polygons share any interior or boundary
/// point.
#[must_use]
pub fn polygons_overlap(a: &[Point2], b: &[Point2]) -> bool {
    let n = a.len();
    let m = b.len();
    for i in 0..n {
        for j in 0..m {
            if segments_touch(&a[i], &a[(i + 1) % n], &b[j], &b[(j + 1) % m]) {
                return true;
            }
        }
    }
    a.first().is_some_and(|p| point_in_polygon(p, b)) || b.first().is_some_and(|p| point_in_polygon(p, a))
}

/// Checks that a polygon is usable as a cut path: at least three vertices
/// and a non-negligible area.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` otherwise.
pub fn check_non_degenerate(points: &[Point2]) -> Result<()> {
    if points.len() < 3 {
        return Err(GeometryError::Degenerate(format!(
            "polygon has {} vertices",
            points.len()
        ))
        .into());
    }
    let area = signed_area_2d(points).abs();
    if area < MIN_AREA {
        return Err(GeometryError::Degenerate(format!("polygon area {area} is too small")).into());
    }
    Ok(())
}

/// Computes the normalized direction from point `a` to point `b`.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` if the segment has zero length.
pub fn segment_direction(a: &Point2, b: &Point2) -> Result<Vector2> {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate(format!(
            "zero-length segment between ({}, {}) and ({}, {})",
            a.x, a.y, b.x, b.y
        ))
        .into());
    }
    Ok(d / len)
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square() -> Vec<Point2> {
        vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area_2d(&square()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square();
        pts.reverse();
        assert!((signed_area_2d(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!((signed_area_2d(&[p(0.0, 0.0)])).abs() < TOLERANCE);
        assert!((signed_area_2d(&[])).abs() < TOLERANCE);
    }

    #[test]
    fn winding_normalisation() {
        let mut cw = square();
        cw.reverse();
        assert!(signed_area_2d(&ensure_ccw(&cw)) > 0.0);
        assert!(signed_area_2d(&ensure_cw(&square())) < 0.0);
    }

    #[test]
    fn canonical_start_rotation() {
        let pts = vec![p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(0.0, 0.0)];
        let rotated = rotate_to_canonical_start(&pts);
        assert!((rotated[0].x).abs() < TOLERANCE);
        assert!((rotated[0].y).abs() < TOLERANCE);
    }

    #[test]
    fn point_in_square() {
        assert!(point_in_polygon(&p(0.5, 0.5), &square()));
        assert!(!point_in_polygon(&p(1.5, 0.5), &square()));
        assert!(point_on_boundary(&p(1.0, 0.5), &square()));
    }

    #[test]
    fn cleanup_removes_duplicates_and_collinear() {
        let pts = vec![
            p(0.0, 0.0),
            p(0.5, 0.0),
            p(1.0, 0.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
            p(0.0, 0.0),
        ];
        let cleaned = cleanup_polygon(&pts);
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn cleanup_removes_spike() {
        let pts = vec![
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
        ];
        let cleaned = cleanup_polygon(&pts);
        assert_eq!(cleaned.len(), 4);
        assert!(is_simple(&cleaned));
    }

    #[test]
    fn simple_and_bow_tie() {
        assert!(is_simple(&square()));
        let bow_tie = vec![p(0.0, 0.0), p(1.0, 1.0), p(1.0, 0.0), p(0.0, 1.0)];
        assert!(!is_simple(&bow_tie));
    }

    #[test]
    fn containment() {
        let outer = vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        let inner = vec![p(2.0, 2.0), p(4.0, 2.0), p(4.0, 4.0), p(2.0, 4.0)];
        let crossing = vec![p(8.0, 2.0), p(12.0, 2.0), p(12.0, 4.0), p(8.0, 4.0)];
        assert!(polygon_inside(&inner, &outer));
        assert!(!polygon_inside(&crossing, &outer));
        assert!(polygons_overlap(&crossing, &outer));
        assert!(polygons_overlap(&inner, &outer));
    }

    #[test]
    fn degenerate_polygon_rejected() {
        assert!(check_non_degenerate(&[p(0.0, 0.0), p(1.0, 0.0)]).is_err());
        assert!(check_non_degenerate(&[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]).is_err());
        assert!(check_non_degenerate(&square()).is_ok());
    }

    #[test]
    fn segment_direction_basic() {
        let dir = segment_direction(&p(0.0, 0.0), &p(3.0, 4.0)).unwrap();
        assert!((dir.x - 0.6).abs() < TOLERANCE);
        assert!((dir.y - 0.8).abs() < TOLERANCE);
        assert!(segment_direction(&p(1.0, 1.0), &p(1.0, 1.0)).is_err());
    }

    #[test]
    fn left_normal_basic() {
        let n = left_normal(Vector2::new(1.0, 0.0));
        assert!((n.x).abs() < TOLERANCE);
        assert!((n.y - 1.0).abs() < TOLERANCE);
    }
}
