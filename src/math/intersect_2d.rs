use super::{Point2, Vector2, TOLERANCE};

/// Signed area of the parallelogram spanned by `a - o` and `b - o`.
///
/// Positive when `o -> a -> b` turns counter-clockwise.
#[must_use]
pub fn orientation(o: &Point2, a: &Point2, b: &Point2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < TOLERANCE * TOLERANCE {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
/// Parallel segments return `None`; use [`segments_touch`] to detect
/// collinear overlap.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let (t, u) = line_line_intersect_2d(a0, &da, b0, &db)?;

    let eps = TOLERANCE / da.norm().max(TOLERANCE);
    let eps_u = TOLERANCE / db.norm().max(TOLERANCE);
    if t >= -eps && t <= 1.0 + eps && u >= -eps_u && u <= 1.0 + eps_u {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Returns `true` if `p` lies on segment `a-b` within [`TOLERANCE`].
#[must_use]
pub fn point_on_segment(p: &Point2, a: &Point2, b: &Point2) -> bool {
    let ab = b - a;
    let len = ab.norm();
    if len < TOLERANCE {
        return (p - a).norm() < TOLERANCE;
    }
    let dist = orientation(a, b, p).abs() / len;
    if dist > TOLERANCE {
        return false;
    }
    let t = (p - a).dot(&ab) / (len * len);
    t >= -TOLERANCE / len && t <= 1.0 + TOLERANCE / len
}

/// Returns `true` if the two closed segments share at least one point.
///
/// Unlike [`segment_segment_intersect_2d`] this also reports collinear
/// overlaps and endpoint contacts.
#[must_use]
pub fn segments_touch(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    if segment_segment_intersect_2d(a0, a1, b0, b1).is_some() {
        return true;
    }
    point_on_segment(a0, b0, b1)
        || point_on_segment(a1, b0, b1)
        || point_on_segment(b0, a0, a1)
        || point_on_segment(b1, a0, a1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn crossing_segments() {
        let (pt, t, u) =
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0))
                .unwrap();
        assert!((pt.x - 1.0).abs() < TOLERANCE);
        assert!((pt.y - 1.0).abs() < TOLERANCE);
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn disjoint_segments() {
        assert!(
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 1.0), &p(2.0, 2.0))
                .is_none()
        );
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let d = Vector2::new(1.0, 0.0);
        assert!(line_line_intersect_2d(&p(0.0, 0.0), &d, &p(0.0, 1.0), &d).is_none());
    }

    #[test]
    fn collinear_overlap_touches() {
        assert!(segments_touch(
            &p(0.0, 0.0),
            &p(2.0, 0.0),
            &p(1.0, 0.0),
            &p(3.0, 0.0)
        ));
        assert!(!segments_touch(
            &p(0.0, 0.0),
            &p(1.0, 0.0),
            &p(2.0, 0.0),
            &p(3.0, 0.0)
        ));
    }

    #[test]
    fn endpoint_contact_touches() {
        assert!(segments_touch(
            &p(0.0, 0.0),
            &p(1.0, 0.0),
            &p(1.0, 0.0),
            &p(1.0, 1.0)
        ));
    }

    #[test]
    fn orientation_sign() {
        assert!(orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0)) > 0.0);
        assert!(orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, -1.0)) < 0.0);
    }
}
