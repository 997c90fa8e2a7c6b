//! Panel derivation: flat parts cut from faces and dividers.
//!
//! Panels are never authored directly. Each derivation lays out the slabs
//! of an assembly, classifies every edge against its neighbour, traces the
//! toothed outline, cuts slot holes and user cutouts, and finally detects
//! corners and the safe space for further edits.
pub mod corners;
pub mod cutout;
pub mod derive;
pub mod frame;
pub mod joint;
pub mod layout;
pub mod outline;
pub mod overrides;
pub mod safe_space;

pub use corners::{CornerContour, CornerInfo, NamedCorner};
pub use cutout::{Cutout, CutoutMode, CutoutShape};
pub use derive::{derive_assembly, AssemblyDerived};
pub use frame::PanelFrame;
pub use joint::{Joint, JointAnchor, JointKind, Probe};
pub use overrides::{CornerFillet, CornerKey, EdgePathPoint, PanelOverrides};
pub use safe_space::{ForbiddenKind, ForbiddenRegion, SafeSpace};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::finger::{EdgeFeature, FeatureKind};
use crate::geometry::{Axis, Profile};
use crate::math::{Isometry3, Point2, Point3};
use crate::scene::{AssemblyId, CutoutId, DividerKey, FaceId, PanelId, VoidId};

/// One of the four edges of a panel in its local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PanelEdge {
    Bottom,
    Right,
    Top,
    Left,
}

impl PanelEdge {
    /// Edges in counter-clockwise traversal order.
    pub const ALL: [PanelEdge; 4] = [
        PanelEdge::Bottom,
        PanelEdge::Right,
        PanelEdge::Top,
        PanelEdge::Left,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            PanelEdge::Bottom => 0,
            PanelEdge::Right => 1,
            PanelEdge::Top => 2,
            PanelEdge::Left => 3,
        }
    }

    /// `+1` if the outward normal points along the positive local axis.
    #[must_use]
    pub fn outward(self) -> f64 {
        match self {
            PanelEdge::Bottom | PanelEdge::Left => -1.0,
            PanelEdge::Top | PanelEdge::Right => 1.0,
        }
    }

    /// Left and right edges run along local `v`.
    #[must_use]
    pub fn is_vertical(self) -> bool {
        matches!(self, PanelEdge::Left | PanelEdge::Right)
    }

    /// Counter-clockwise traversal runs towards increasing `along` on the
    /// bottom and right edges.
    #[must_use]
    pub fn ascending(self) -> bool {
        matches!(self, PanelEdge::Bottom | PanelEdge::Right)
    }

    /// Maps an `(along, across)` pair to a local point.
    #[must_use]
    pub fn point(self, along: f64, across: f64) -> Point2 {
        if self.is_vertical() {
            Point2::new(across, along)
        } else {
            Point2::new(along, across)
        }
    }

    /// The perpendicular edges at the low and high end of this edge.
    #[must_use]
    pub fn neighbours(self) -> (PanelEdge, PanelEdge) {
        if self.is_vertical() {
            (PanelEdge::Bottom, PanelEdge::Top)
        } else {
            (PanelEdge::Left, PanelEdge::Right)
        }
    }
}

impl fmt::Display for PanelEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PanelEdge::Bottom => "bottom",
            PanelEdge::Right => "right",
            PanelEdge::Top => "top",
            PanelEdge::Left => "left",
        };
        f.write_str(name)
    }
}

/// One of the four named outer corners of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PanelCorner {
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

impl PanelCorner {
    pub const ALL: [PanelCorner; 4] = [
        PanelCorner::BottomLeft,
        PanelCorner::BottomRight,
        PanelCorner::TopRight,
        PanelCorner::TopLeft,
    ];

    /// `(vertical, horizontal)` edges meeting at the corner.
    #[must_use]
    pub fn edges(self) -> (PanelEdge, PanelEdge) {
        match self {
            PanelCorner::BottomLeft => (PanelEdge::Left, PanelEdge::Bottom),
            PanelCorner::BottomRight => (PanelEdge::Right, PanelEdge::Bottom),
            PanelCorner::TopRight => (PanelEdge::Right, PanelEdge::Top),
            PanelCorner::TopLeft => (PanelEdge::Left, PanelEdge::Top),
        }
    }
}

impl fmt::Display for PanelCorner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PanelCorner::BottomLeft => "bottom-left",
            PanelCorner::BottomRight => "bottom-right",
            PanelCorner::TopRight => "top-right",
            PanelCorner::TopLeft => "top-left",
        };
        f.write_str(name)
    }
}

/// Edit freedom of a panel edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeStatus {
    /// Carries tabs or cross-lap notches; cannot move.
    Locked,
    /// Receives slots; may only grow outward.
    OutwardOnly,
    /// No joint; free to extend or inset.
    Open,
}

impl EdgeStatus {
    /// Status implied by the features an edge carries.
    #[must_use]
    pub fn from_features(features: &[EdgeFeature]) -> Self {
        if features
            .iter()
            .any(|f| matches!(f.kind, FeatureKind::Tab | FeatureKind::Notch))
        {
            EdgeStatus::Locked
        } else if features.iter().any(|f| f.kind == FeatureKind::Slot) {
            EdgeStatus::OutwardOnly
        } else {
            EdgeStatus::Open
        }
    }
}

/// Derived state of one panel edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub edge: PanelEdge,
    pub status: EdgeStatus,
    /// Extension actually applied (mm, outward positive).
    pub extension: f64,
    pub custom_path: bool,
    pub feet: bool,
    /// Features traced along the edge, in local `along` coordinates.
    pub features: Vec<EdgeFeature>,
    /// Local across coordinate of the nominal edge.
    pub nominal: f64,
    /// Local across coordinate of the traced edge line.
    pub line: f64,
    /// Panel this edge mates with, if any.
    pub mate: Option<PanelId>,
}

impl EdgeInfo {
    #[must_use]
    pub fn feature_count(&self, kind: FeatureKind) -> usize {
        self.features.iter().filter(|f| f.kind == kind).count()
    }

    /// Returns `true` if a positive extension is allowed.
    #[must_use]
    pub fn can_extend(&self) -> bool {
        !self.feet && self.status != EdgeStatus::Locked
    }

    /// Returns `true` if a negative extension is allowed.
    #[must_use]
    pub fn can_inset(&self) -> bool {
        !self.feet && self.status == EdgeStatus::Open
    }

    /// Custom paths are allowed on open or outward-extended edges.
    #[must_use]
    pub fn accepts_custom_path(&self) -> bool {
        !self.feet && (self.status == EdgeStatus::Open || self.extension > 0.0)
    }
}

/// Where a panel comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PanelSource {
    Face {
        face: FaceId,
    },
    Divider {
        void: VoidId,
        key: DividerKey,
        position: f64,
    },
}

impl PanelSource {
    /// Normal axis of the panel.
    #[must_use]
    pub fn normal(&self) -> Axis {
        match self {
            PanelSource::Face { face } => face.normal(),
            PanelSource::Divider { key, .. } => key.axis,
        }
    }
}

/// What produced a hole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoleKind {
    /// Receives tabs of the named joint.
    Slot { joint: String },
    /// A user cutout cut cleanly inside the panel.
    Cutout(CutoutId),
    /// Result of a boolean composition; provenance lost.
    Composed,
}

/// A clockwise hole in a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub kind: HoleKind,
    pub points: Vec<Point2>,
}

/// A derived flat part with its cut outline and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: PanelId,
    pub assembly: AssemblyId,
    pub source: PanelSource,
    pub thickness: f64,
    /// Nominal size along local `u`.
    pub width: f64,
    /// Nominal size along local `v`.
    pub height: f64,
    /// Counter-clockwise cut outline in local coordinates.
    pub outline: Vec<Point2>,
    pub holes: Vec<Hole>,
    /// Edges indexed by [`PanelEdge::index`].
    pub edges: [EdgeInfo; 4],
    pub corners: Vec<CornerInfo>,
    pub named_corners: Vec<NamedCorner>,
    pub forbidden: Vec<ForbiddenRegion>,
    pub safe_space: SafeSpace,
    /// Local-to-world placement; the panel's mid-plane is local `z = 0`.
    pub transform: Isometry3,
}

impl Panel {
    #[must_use]
    pub fn edge(&self, edge: PanelEdge) -> &EdgeInfo {
        &self.edges[edge.index()]
    }

    /// World position of a local point on the mid-plane.
    #[must_use]
    pub fn world_point(&self, local: &Point2) -> Point3 {
        self.transform * Point3::new(local.x, local.y, 0.0)
    }

    /// Outline and holes as a plain profile.
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile::new(
            self.outline.clone(),
            self.holes.iter().map(|h| h.points.clone()).collect(),
        )
    }

    /// Returns `true` if the local point lies in the cut material.
    #[must_use]
    pub fn in_material(&self, p: &Point2) -> bool {
        crate::math::polygon_2d::point_in_polygon(p, &self.outline)
            && !self
                .holes
                .iter()
                .any(|h| crate::math::polygon_2d::point_in_polygon(p, &h.points))
    }

    /// Corner info for a key, if the corner exists.
    #[must_use]
    pub fn corner(&self, key: CornerKey) -> Option<&CornerInfo> {
        self.corners.iter().find(|c| c.key == key)
    }

    #[must_use]
    pub fn named_corner(&self, corner: PanelCorner) -> Option<&NamedCorner> {
        self.named_corners.iter().find(|c| c.corner == corner)
    }

    /// Eligible corners over outline and holes.
    #[must_use]
    pub fn eligible_corner_count(&self) -> usize {
        self.corners.iter().filter(|c| c.eligible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_orientation() {
        assert_eq!(PanelEdge::Left.point(2.0, 1.0), Point2::new(1.0, 2.0));
        assert_eq!(PanelEdge::Top.point(2.0, 1.0), Point2::new(2.0, 1.0));
        assert!(PanelEdge::Bottom.ascending() && !PanelEdge::Top.ascending());
        assert_eq!(PanelEdge::Top.neighbours(), (PanelEdge::Left, PanelEdge::Right));
    }

    #[test]
    fn status_follows_features() {
        let feature = |kind| EdgeFeature {
            start: 0.0,
            end: 1.0,
            offset: 1.0,
            kind,
        };
        assert_eq!(EdgeStatus::from_features(&[]), EdgeStatus::Open);
        assert_eq!(
            EdgeStatus::from_features(&[feature(FeatureKind::Slot)]),
            EdgeStatus::OutwardOnly
        );
        assert_eq!(
            EdgeStatus::from_features(&[feature(FeatureKind::Slot), feature(FeatureKind::Notch)]),
            EdgeStatus::Locked
        );
        assert_eq!(
            EdgeStatus::from_features(&[feature(FeatureKind::Leg)]),
            EdgeStatus::Open
        );
    }
}
