use serde::{Deserialize, Serialize};

use crate::geometry::{boolean_2d, BooleanOp, Profile, Rect2};
use crate::math::polygon_2d::{point_in_polygon, polygon_inside, polygons_overlap};
use crate::math::Point2;

/// Why a region of a panel may not receive user geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForbiddenKind {
    /// Finger zone of a jointed edge plus a thickness margin.
    EdgeJoint,
    /// Cross-lap notch plus a thickness margin.
    CrossLap,
    /// Slot hole plus a thickness margin.
    SlotHole,
}

/// A margined rectangle in panel-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForbiddenRegion {
    pub kind: ForbiddenKind,
    pub rect: Rect2,
}

impl ForbiddenRegion {
    /// Region covering `rect` grown by `margin` on every side.
    #[must_use]
    pub fn new(kind: ForbiddenKind, rect: Rect2, margin: f64) -> Self {
        Self {
            kind,
            rect: rect.grow(margin),
        }
    }

    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        self.rect.contains_strict(p)
    }
}

/// Region of a panel where cutouts and edge paths may go.
///
/// `outline` and `holes` are the panel body with the edge margins removed;
/// `exclusions` are the margined slot holes lying inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeSpace {
    pub outline: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
    pub exclusions: Vec<Rect2>,
}

impl SafeSpace {
    /// Subtracts the edge and cross-lap margins from the body and keeps the
    /// slot margins as exclusions.
    #[must_use]
    pub fn compute(outline: &[Point2], holes: &[Vec<Point2>], forbidden: &[ForbiddenRegion]) -> Self {
        let body = Profile::new(outline.to_vec(), holes.to_vec());
        let margins: Vec<Vec<Point2>> = forbidden
            .iter()
            .filter(|r| r.kind != ForbiddenKind::SlotHole)
            .map(|r| r.rect.to_contour())
            .collect();
        let safe = if margins.is_empty() {
            Some(body.clone())
        } else {
            boolean_2d(&body, &margins, BooleanOp::Difference)
        };
        let Some(safe) = safe else {
            return Self::default();
        };
        Self {
            outline: safe.outline,
            holes: safe.holes,
            exclusions: forbidden
                .iter()
                .filter(|r| r.kind == ForbiddenKind::SlotHole)
                .map(|r| r.rect)
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outline.len() < 3
    }

    /// Returns `true` if `p` lies in the safe region.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        !self.is_empty()
            && point_in_polygon(p, &self.outline)
            && !self.holes.iter().any(|h| point_in_polygon(p, h))
            && !self.exclusions.iter().any(|r| r.contains_strict(p))
    }

    /// Returns `true` if the closed polygon lies entirely in the safe region.
    #[must_use]
    pub fn contains_polygon(&self, polygon: &[Point2]) -> bool {
        !self.is_empty()
            && polygon_inside(polygon, &self.outline)
            && !self.holes.iter().any(|h| polygons_overlap(h, polygon))
            && !self.exclusions.iter().any(|r| r.overlaps_polygon(polygon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Vec<Point2> {
        Rect2::new(-50.0, -40.0, 50.0, 40.0).to_contour()
    }

    #[test]
    fn edge_margins_are_removed() {
        let forbidden = [ForbiddenRegion::new(
            ForbiddenKind::EdgeJoint,
            Rect2::new(-32.0, 37.0, 32.0, 40.0),
            3.0,
        )];
        let safe = SafeSpace::compute(&body(), &[], &forbidden);
        assert!(safe.contains(&Point2::new(0.0, 0.0)));
        assert!(!safe.contains(&Point2::new(0.0, 36.0)));
        assert!(safe.contains(&Point2::new(45.0, 38.0)));
    }

    #[test]
    fn slot_margins_are_exclusions() {
        let forbidden = [ForbiddenRegion::new(
            ForbiddenKind::SlotHole,
            Rect2::new(-1.5, -10.0, 1.5, 10.0),
            3.0,
        )];
        let safe = SafeSpace::compute(&body(), &[], &forbidden);
        assert_eq!(safe.exclusions.len(), 1);
        assert!(!safe.contains(&Point2::new(4.0, 0.0)));
        assert!(safe.contains(&Point2::new(5.0, 0.0)));
        let square = Rect2::new(10.0, -5.0, 20.0, 5.0).to_contour();
        assert!(safe.contains_polygon(&square));
        let crossing = Rect2::new(-10.0, -5.0, 10.0, 5.0).to_contour();
        assert!(!safe.contains_polygon(&crossing));
    }
}
