use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::cache::Cache;
use super::{PanelId, VoidId};
use crate::finger::MaterialConfig;
use crate::geometry::{Axis, Bounds3, Side};
use crate::math::Point3;
use crate::panel::{AssemblyDerived, PanelOverrides};

/// One of the six outer faces of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FaceId {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl FaceId {
    pub const ALL: [FaceId; 6] = [
        FaceId::Front,
        FaceId::Back,
        FaceId::Left,
        FaceId::Right,
        FaceId::Top,
        FaceId::Bottom,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            FaceId::Front => 0,
            FaceId::Back => 1,
            FaceId::Left => 2,
            FaceId::Right => 3,
            FaceId::Top => 4,
            FaceId::Bottom => 5,
        }
    }

    /// Axis the face is perpendicular to.
    #[must_use]
    pub fn normal(self) -> Axis {
        match self {
            FaceId::Front | FaceId::Back => Axis::Z,
            FaceId::Left | FaceId::Right => Axis::X,
            FaceId::Top | FaceId::Bottom => Axis::Y,
        }
    }

    #[must_use]
    pub fn side(self) -> Side {
        match self {
            FaceId::Front | FaceId::Right | FaceId::Top => Side::Max,
            FaceId::Back | FaceId::Left | FaceId::Bottom => Side::Min,
        }
    }

    #[must_use]
    pub fn from_axis_side(axis: Axis, side: Side) -> Self {
        match (axis, side) {
            (Axis::Z, Side::Max) => FaceId::Front,
            (Axis::Z, Side::Min) => FaceId::Back,
            (Axis::X, Side::Min) => FaceId::Left,
            (Axis::X, Side::Max) => FaceId::Right,
            (Axis::Y, Side::Max) => FaceId::Top,
            (Axis::Y, Side::Min) => FaceId::Bottom,
        }
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaceId::Front => "front",
            FaceId::Back => "back",
            FaceId::Left => "left",
            FaceId::Right => "right",
            FaceId::Top => "top",
            FaceId::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Which panel carries the fingers on a lid joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabDirection {
    /// The lid carries the tabs.
    TabsOut,
    /// The walls carry the tabs.
    #[default]
    TabsIn,
}

/// Per-lid joint configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LidConfig {
    pub tab_direction: TabDirection,
    /// Distance the lid sits inward from the outer boundary (mm).
    pub inset: f64,
}

/// Lid settings for both ends of the assembly axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Lids {
    pub positive: LidConfig,
    pub negative: LidConfig,
}

impl Lids {
    #[must_use]
    pub fn get(&self, side: Side) -> &LidConfig {
        match side {
            Side::Max => &self.positive,
            Side::Min => &self.negative,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut LidConfig {
        match side {
            Side::Max => &mut self.positive,
            Side::Min => &mut self.negative,
        }
    }
}

/// Legs cut into the walls below the negative lid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeetConfig {
    pub height: f64,
    pub width: f64,
    pub inset: f64,
}

/// An enclosure: outer dimensions, material, faces and the void tree
/// rooted at `root_void`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyNode {
    pub(crate) dims: [f64; 3],
    pub(crate) material: MaterialConfig,
    pub(crate) solid: [bool; 6],
    pub(crate) axis: Axis,
    pub(crate) lids: Lids,
    pub(crate) feet: Option<FeetConfig>,
    pub(crate) origin: Point3,
    pub(crate) root_void: VoidId,
    pub(crate) parent_void: Option<VoidId>,
    pub(crate) clearance: f64,
    pub(crate) face_ids: [PanelId; 6],
    pub(crate) overrides: BTreeMap<PanelId, PanelOverrides>,
    pub(crate) cache: Cache<AssemblyDerived>,
}

impl AssemblyNode {
    pub(crate) fn new(dims: [f64; 3], material: MaterialConfig) -> Self {
        Self {
            dims,
            material,
            solid: [true; 6],
            axis: Axis::Y,
            lids: Lids::default(),
            feet: None,
            origin: Point3::origin(),
            root_void: VoidId::default(),
            parent_void: None,
            clearance: 0.0,
            face_ids: std::array::from_fn(|_| PanelId::generate()),
            overrides: BTreeMap::new(),
            cache: Cache::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.dims[0]
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.dims[1]
    }

    #[must_use]
    pub fn depth(&self) -> f64 {
        self.dims[2]
    }

    #[must_use]
    pub fn dims(&self) -> [f64; 3] {
        self.dims
    }

    #[must_use]
    pub fn dim(&self, axis: Axis) -> f64 {
        self.dims[axis.index()]
    }

    #[must_use]
    pub fn material(&self) -> &MaterialConfig {
        &self.material
    }

    /// Material with the finger width clamped to the current dimensions.
    /// Derivation always uses this; the requested values are kept so that
    /// growing the box again restores them.
    #[must_use]
    pub fn effective_material(&self) -> MaterialConfig {
        self.material.clamped_to(self.dims).0
    }

    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.material.thickness
    }

    #[must_use]
    pub fn is_solid(&self, face: FaceId) -> bool {
        self.solid[face.index()]
    }

    /// Assembly (lid) axis.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[must_use]
    pub fn lids(&self) -> &Lids {
        &self.lids
    }

    #[must_use]
    pub fn feet(&self) -> Option<&FeetConfig> {
        self.feet.as_ref()
    }

    /// World position of the assembly's minimum corner.
    #[must_use]
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    #[must_use]
    pub fn root_void(&self) -> VoidId {
        self.root_void
    }

    /// Void this assembly fills, for sub-assemblies.
    #[must_use]
    pub fn parent_void(&self) -> Option<VoidId> {
        self.parent_void
    }

    #[must_use]
    pub fn clearance(&self) -> f64 {
        self.clearance
    }

    #[must_use]
    pub fn face_panel_id(&self, face: FaceId) -> PanelId {
        self.face_ids[face.index()]
    }

    #[must_use]
    pub fn overrides(&self, panel: PanelId) -> Option<&PanelOverrides> {
        self.overrides.get(&panel)
    }

    /// Lid side of `face`, if the face is a lid.
    #[must_use]
    pub fn lid_side(&self, face: FaceId) -> Option<Side> {
        (face.normal() == self.axis).then_some(face.side())
    }

    /// Inset applied on `side` of `axis`; zero away from the lid axis.
    #[must_use]
    pub fn inset(&self, axis: Axis, side: Side) -> f64 {
        if axis == self.axis {
            self.lids.get(side).inset
        } else {
            0.0
        }
    }

    /// A slot-joined lid carries tabs on every edge that enter holes in the
    /// walls instead of meeting them edge to edge.
    #[must_use]
    pub fn is_slot_joined(&self, face: FaceId) -> bool {
        match self.lid_side(face) {
            Some(side) => {
                self.lids.get(side).inset > 0.0 || (side == Side::Min && self.feet.is_some())
            }
            None => false,
        }
    }

    /// Range the face slab occupies along its normal.
    #[must_use]
    pub fn face_range(&self, face: FaceId) -> (f64, f64) {
        let axis = face.normal();
        let t = self.thickness();
        let inset = self.inset(axis, face.side());
        match face.side() {
            Side::Min => (inset, inset + t),
            Side::Max => {
                let outer = self.dim(axis) - inset;
                (outer - t, outer)
            }
        }
    }

    /// Interior bounds: outer box shrunk by one thickness on every side plus
    /// the lid insets.
    #[must_use]
    pub fn interior_bounds(&self) -> Bounds3 {
        let t = self.thickness();
        let mut min = Point3::origin();
        let mut max = Point3::origin();
        for axis in Axis::ALL {
            min[axis.index()] = t + self.inset(axis, Side::Min);
            max[axis.index()] = self.dim(axis) - t - self.inset(axis, Side::Max);
        }
        Bounds3::new(min, max)
    }

    /// World-space outer bounds.
    #[must_use]
    pub fn world_bounds(&self) -> Bounds3 {
        Bounds3::new(
            self.origin,
            Point3::new(
                self.origin.x + self.dims[0],
                self.origin.y + self.dims[1],
                self.origin.z + self.dims[2],
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    #[test]
    fn faces_round_trip_through_axis_and_side() {
        for face in FaceId::ALL {
            assert_eq!(FaceId::from_axis_side(face.normal(), face.side()), face);
        }
    }

    #[test]
    fn interior_accounts_for_inset_lid() {
        let mut node = AssemblyNode::new([100.0, 80.0, 60.0], MaterialConfig::default());
        node.lids.positive.inset = 5.0;
        let b = node.interior_bounds();
        assert!((b.hi(Axis::Y) - 72.0).abs() < TOLERANCE);
        assert!((b.lo(Axis::Y) - 3.0).abs() < TOLERANCE);
        assert!((b.hi(Axis::X) - 97.0).abs() < TOLERANCE);
        assert!(node.is_slot_joined(FaceId::Top));
        assert!(!node.is_slot_joined(FaceId::Bottom));
        let (lo, hi) = node.face_range(FaceId::Top);
        assert!((lo - 72.0).abs() < TOLERANCE && (hi - 75.0).abs() < TOLERANCE);
    }

    #[test]
    fn feet_make_negative_lid_slot_joined() {
        let mut node = AssemblyNode::new([100.0, 80.0, 60.0], MaterialConfig::default());
        node.feet = Some(FeetConfig {
            height: 10.0,
            width: 15.0,
            inset: 5.0,
        });
        assert!(node.is_slot_joined(FaceId::Bottom));
        assert!(!node.is_slot_joined(FaceId::Front));
    }
}
