use serde::{Deserialize, Serialize};

use super::PanelEdge;
use crate::geometry::Axis;
use crate::math::{Point2, Point3};
use crate::scene::PanelId;

/// How two panels mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointKind {
    /// Tabs of one edge into slots of the mating edge.
    Edge,
    /// Tabs of one edge through slot holes in the other panel's interior.
    Slot,
    /// Two dividers notched halfway into each other.
    CrossLap,
}

/// A local point that must (or must not) be in material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub point: Point2,
    pub material: bool,
}

/// One mating feature pair of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAnchor {
    /// Centre of the tab (or notch) on the male panel, local coordinates.
    pub male: Point2,
    /// Centre of the receiving slot on the female panel, local coordinates.
    pub female: Point2,
    /// Where both centres must land, world coordinates.
    pub expected: Point3,
    pub male_probe: Probe,
    pub female_probe: Probe,
}

/// A derived pairing of two panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub id: String,
    pub kind: JointKind,
    /// Assembly axis the features are spaced along.
    pub axis: Axis,
    pub male: PanelId,
    pub male_edge: PanelEdge,
    pub female: PanelId,
    /// Mating edge for edge joints and cross-laps; slot joints land in the
    /// female panel's interior.
    pub female_edge: Option<PanelEdge>,
    pub anchors: Vec<JointAnchor>,
}

impl Joint {
    /// Id of the joint formed by `male`'s `edge`. Every edge has at most one
    /// joint.
    #[must_use]
    pub fn edge_id(male: PanelId, edge: PanelEdge) -> String {
        format!("{male}:{edge}")
    }

    /// Id of the cross-lap between two dividers.
    #[must_use]
    pub fn cross_lap_id(a: PanelId, b: PanelId) -> String {
        format!("{a}x{b}")
    }
}
