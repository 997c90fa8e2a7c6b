use serde::{Deserialize, Serialize};

use crate::math::polygon_2d::{point_in_polygon, signed_area_2d};
use crate::math::Point2;

/// A closed 2D region: one counter-clockwise outline and clockwise holes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub outline: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
}

impl Profile {
    #[must_use]
    pub fn new(outline: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        Self { outline, holes }
    }

    /// Net area (outline minus holes).
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area_2d(h).abs()).sum();
        signed_area_2d(&self.outline).abs() - holes
    }

    /// Returns `true` if `p` lies in material: inside the outline and
    /// outside every hole.
    #[must_use]
    pub fn in_material(&self, p: &Point2) -> bool {
        point_in_polygon(p, &self.outline) && !self.holes.iter().any(|h| point_in_polygon(p, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect2;
    use crate::math::polygon_2d::ensure_cw;
    use crate::math::TOLERANCE;

    #[test]
    fn material_test_respects_holes() {
        let outline = Rect2::new(0.0, 0.0, 10.0, 10.0).to_contour();
        let hole = ensure_cw(&Rect2::new(4.0, 4.0, 6.0, 6.0).to_contour());
        let profile = Profile::new(outline, vec![hole]);
        assert!((profile.area() - 96.0).abs() < TOLERANCE);
        assert!(profile.in_material(&Point2::new(1.0, 1.0)));
        assert!(!profile.in_material(&Point2::new(5.0, 5.0)));
        assert!(!profile.in_material(&Point2::new(11.0, 5.0)));
    }
}
