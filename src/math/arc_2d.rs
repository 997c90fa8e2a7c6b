//! 2D arc math used for corner fillets.
use std::f64::consts::PI;

use super::{Point2, TOLERANCE};

/// Evaluates a point on an arc at parameter `t` in `[0, 1]`.
#[must_use]
pub fn arc_point_at(center: &Point2, radius: f64, start_angle: f64, sweep: f64, t: f64) -> Point2 {
    let angle = start_angle + sweep * t;
    Point2::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

/// Angle between the two edge rays leaving `corner`, in `(0, π)`.
///
/// Returns `None` when either edge has zero length or the edges are
/// collinear (no corner to round).
#[must_use]
pub fn corner_angle(prev: &Point2, corner: &Point2, next: &Point2) -> Option<f64> {
    let a = prev - corner;
    let b = next - corner;
    let (la, lb) = (a.norm(), b.norm());
    if la < TOLERANCE || lb < TOLERANCE {
        return None;
    }
    let cos = (a.dot(&b) / (la * lb)).clamp(-1.0, 1.0);
    let angle = cos.acos();
    if angle < 1e-6 || PI - angle < 1e-6 {
        return None;
    }
    Some(angle)
}

/// Distance from the corner to each tangent point for a fillet of `radius`.
#[must_use]
pub fn tangent_distance(radius: f64, angle: f64) -> f64 {
    radius / (angle * 0.5).tan()
}

/// Largest radius whose tangent points stay within `available` of the corner.
#[must_use]
pub fn radius_for_tangent_distance(available: f64, angle: f64) -> f64 {
    available * (angle * 0.5).tan()
}

/// Circular arc tangent to both edges of a corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilletArc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
}

impl FilletArc {
    /// Builds the fillet replacing `corner` between the incoming edge from
    /// `prev` and the outgoing edge to `next`.
    ///
    /// The arc starts on the incoming edge and ends on the outgoing edge.
    #[must_use]
    pub fn at_corner(prev: &Point2, corner: &Point2, next: &Point2, radius: f64) -> Option<Self> {
        if radius < TOLERANCE {
            return None;
        }
        let angle = corner_angle(prev, corner, next)?;
        let a = (prev - corner).normalize();
        let b = (next - corner).normalize();
        let dt = tangent_distance(radius, angle);
        let t_in = corner + a * dt;
        let t_out = corner + b * dt;
        let bisector = (a + b).normalize();
        let center = corner + bisector * (radius / (angle * 0.5).sin());

        let start_angle = (t_in.y - center.y).atan2(t_in.x - center.x);
        let end_angle = (t_out.y - center.y).atan2(t_out.x - center.x);
        let mut sweep = end_angle - start_angle;
        if sweep > PI {
            sweep -= 2.0 * PI;
        } else if sweep < -PI {
            sweep += 2.0 * PI;
        }
        Some(Self {
            center,
            radius,
            start_angle,
            sweep,
        })
    }

    /// Point at parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        arc_point_at(&self.center, self.radius, self.start_angle, self.sweep, t)
    }

    /// Tessellates the arc into `segments` chords (`segments + 1` points).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn points(&self, segments: usize) -> Vec<Point2> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn right_angle_corner() {
        let angle = corner_angle(&p(10.0, 0.0), &p(0.0, 0.0), &p(0.0, 10.0)).unwrap();
        assert!((angle - FRAC_PI_2).abs() < TOLERANCE);
        assert!((tangent_distance(2.0, angle) - 2.0).abs() < TOLERANCE);
        assert!((radius_for_tangent_distance(5.0, angle) - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn collinear_is_not_a_corner() {
        assert!(corner_angle(&p(-1.0, 0.0), &p(0.0, 0.0), &p(1.0, 0.0)).is_none());
    }

    #[test]
    fn fillet_touches_both_edges() {
        let arc = FilletArc::at_corner(&p(0.0, 10.0), &p(0.0, 0.0), &p(10.0, 0.0), 3.0).unwrap();
        assert!((arc.center.x - 3.0).abs() < TOLERANCE);
        assert!((arc.center.y - 3.0).abs() < TOLERANCE);
        let start = arc.point_at(0.0);
        let end = arc.point_at(1.0);
        assert!((start - p(0.0, 3.0)).norm() < TOLERANCE);
        assert!((end - p(3.0, 0.0)).norm() < TOLERANCE);
        assert!((arc.sweep.abs() - FRAC_PI_2).abs() < TOLERANCE);
    }

    #[test]
    fn fillet_points_count_and_radius() {
        let arc = FilletArc::at_corner(&p(0.0, 10.0), &p(0.0, 0.0), &p(10.0, 0.0), 3.0).unwrap();
        let pts = arc.points(8);
        assert_eq!(pts.len(), 9);
        for pt in pts {
            assert!(((pt - arc.center).norm() - 3.0).abs() < TOLERANCE);
        }
    }
}
