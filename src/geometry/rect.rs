use serde::{Deserialize, Serialize};

use crate::math::intersect_2d::segments_touch;
use crate::math::{Point2, TOLERANCE};

/// Axis-aligned rectangle in panel-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect2 {
    pub min: Point2,
    pub max: Point2,
}

impl Rect2 {
    /// Creates a rectangle from two opposite corners in any order.
    #[must_use]
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min: Point2::new(x0.min(x1), y0.min(y1)),
            max: Point2::new(x0.max(x1), y0.max(y1)),
        }
    }

    #[must_use]
    pub fn from_center(center: Point2, width: f64, height: f64) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            center.x + width * 0.5,
            center.y + height * 0.5,
        )
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Rectangle grown by `margin` on every side.
    #[must_use]
    pub fn grow(&self, margin: f64) -> Self {
        Self::new(
            self.min.x - margin,
            self.min.y - margin,
            self.max.x + margin,
            self.max.y + margin,
        )
    }

    /// Strict interior test: points on (or within tolerance of) the border
    /// are outside.
    #[must_use]
    pub fn contains_strict(&self, p: &Point2) -> bool {
        p.x > self.min.x + TOLERANCE
            && p.x < self.max.x - TOLERANCE
            && p.y > self.min.y + TOLERANCE
            && p.y < self.max.y - TOLERANCE
    }

    /// Returns `true` if the interiors of the two rectangles overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Rect2) -> bool {
        self.min.x < other.max.x - TOLERANCE
            && other.min.x < self.max.x - TOLERANCE
            && self.min.y < other.max.y - TOLERANCE
            && other.min.y < self.max.y - TOLERANCE
    }

    /// Returns `true` if the segment enters the rectangle's interior.
    #[must_use]
    pub fn crossed_by_segment(&self, a: &Point2, b: &Point2) -> bool {
        if self.contains_strict(a) || self.contains_strict(b) {
            return true;
        }
        let mid = Point2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
        if self.contains_strict(&mid) {
            return true;
        }
        let inner = self.grow(-TOLERANCE * 2.0);
        if inner.width() <= 0.0 || inner.height() <= 0.0 {
            return false;
        }
        let c = inner.to_contour();
        (0..4).any(|i| segments_touch(a, b, &c[i], &c[(i + 1) % 4]))
    }

    /// Returns `true` if the closed polygon and the rectangle interior share
    /// any area.
    #[must_use]
    pub fn overlaps_polygon(&self, polygon: &[Point2]) -> bool {
        let n = polygon.len();
        if (0..n).any(|i| self.crossed_by_segment(&polygon[i], &polygon[(i + 1) % n])) {
            return true;
        }
        crate::math::polygon_2d::point_in_polygon(&self.center(), polygon)
    }

    /// Counter-clockwise contour starting at the minimum corner.
    #[must_use]
    pub fn to_contour(&self) -> Vec<Point2> {
        vec![
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn normalises_corners() {
        let r = Rect2::new(4.0, 3.0, 1.0, 1.0);
        assert!((r.width() - 3.0).abs() < TOLERANCE);
        assert!((r.height() - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn strict_containment_excludes_border() {
        let r = Rect2::new(0.0, 0.0, 2.0, 2.0);
        assert!(r.contains_strict(&p(1.0, 1.0)));
        assert!(!r.contains_strict(&p(2.0, 1.0)));
    }

    #[test]
    fn segment_crossing() {
        let r = Rect2::new(0.0, 0.0, 2.0, 2.0);
        assert!(r.crossed_by_segment(&p(-1.0, 1.0), &p(3.0, 1.0)));
        assert!(!r.crossed_by_segment(&p(-1.0, 2.0), &p(3.0, 2.0)));
        assert!(!r.crossed_by_segment(&p(-1.0, 3.0), &p(3.0, 3.0)));
    }

    #[test]
    fn polygon_overlap() {
        let r = Rect2::new(0.0, 0.0, 2.0, 2.0);
        let big = Rect2::new(-5.0, -5.0, 5.0, 5.0).to_contour();
        let far = Rect2::new(10.0, 10.0, 11.0, 11.0).to_contour();
        let touching = Rect2::new(2.0, 0.0, 3.0, 2.0).to_contour();
        assert!(r.overlaps_polygon(&big));
        assert!(!r.overlaps_polygon(&far));
        assert!(!r.overlaps_polygon(&touching));
    }
}
