use nalgebra::{Matrix3, Rotation3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use super::PanelEdge;
use crate::geometry::{Axis, Bounds3, Side};
use crate::math::{Isometry3, Point3, Vector3};

/// Placement of a panel slab in its assembly.
///
/// The slab occupies `normal_range` along `normal` and the nominal
/// rectangle `u_range` x `v_range` in its plane. Local 2D coordinates are
/// measured from the centre of that rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelFrame {
    pub normal: Axis,
    pub u_axis: Axis,
    pub v_axis: Axis,
    pub normal_range: (f64, f64),
    pub u_range: (f64, f64),
    pub v_range: (f64, f64),
}

impl PanelFrame {
    #[must_use]
    pub fn new(normal: Axis, normal_range: (f64, f64), u_range: (f64, f64), v_range: (f64, f64)) -> Self {
        let (u_axis, v_axis) = normal.plane_axes();
        Self {
            normal,
            u_axis,
            v_axis,
            normal_range,
            u_range,
            v_range,
        }
    }

    /// Assembly-space range of the slab along `axis`.
    #[must_use]
    pub fn range(&self, axis: Axis) -> (f64, f64) {
        if axis == self.normal {
            self.normal_range
        } else if axis == self.u_axis {
            self.u_range
        } else {
            self.v_range
        }
    }

    /// Occupied box, nominal rectangle times slab thickness.
    #[must_use]
    pub fn bounds(&self) -> Bounds3 {
        let mut min = Point3::origin();
        let mut max = Point3::origin();
        for axis in Axis::ALL {
            let (lo, hi) = self.range(axis);
            min[axis.index()] = lo;
            max[axis.index()] = hi;
        }
        Bounds3::new(min, max)
    }

    #[must_use]
    pub fn center(&self, axis: Axis) -> f64 {
        let (lo, hi) = self.range(axis);
        (lo + hi) * 0.5
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.u_range.1 - self.u_range.0
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.v_range.1 - self.v_range.0
    }

    /// Local coordinate of an assembly-space value along an in-plane axis.
    #[must_use]
    pub fn to_local(&self, axis: Axis, value: f64) -> f64 {
        value - self.center(axis)
    }

    /// Local interval for an assembly-space interval along an in-plane axis.
    #[must_use]
    pub fn to_local_range(&self, axis: Axis, lo: f64, hi: f64) -> (f64, f64) {
        (self.to_local(axis, lo), self.to_local(axis, hi))
    }

    /// `(across, along)` assembly axes of an edge.
    #[must_use]
    pub fn edge_axes(&self, edge: PanelEdge) -> (Axis, Axis) {
        if edge.is_vertical() {
            (self.u_axis, self.v_axis)
        } else {
            (self.v_axis, self.u_axis)
        }
    }

    /// Side of the across axis the edge lies on.
    #[must_use]
    pub fn edge_side(edge: PanelEdge) -> Side {
        if edge.outward() > 0.0 {
            Side::Max
        } else {
            Side::Min
        }
    }

    /// Edge lying on `side` of the in-plane axis `across`.
    #[must_use]
    pub fn edge_for(&self, across: Axis, side: Side) -> PanelEdge {
        match (across == self.u_axis, side) {
            (true, Side::Min) => PanelEdge::Left,
            (true, Side::Max) => PanelEdge::Right,
            (false, Side::Min) => PanelEdge::Bottom,
            (false, Side::Max) => PanelEdge::Top,
        }
    }

    /// Local across coordinate of an edge's nominal line.
    #[must_use]
    pub fn nominal(&self, edge: PanelEdge) -> f64 {
        let (across, _) = self.edge_axes(edge);
        let (lo, hi) = self.range(across);
        match Self::edge_side(edge) {
            Side::Min => self.to_local(across, lo),
            Side::Max => self.to_local(across, hi),
        }
    }

    /// Rigid transform from local panel coordinates to world space, for an
    /// assembly whose minimum corner sits at `origin`.
    #[must_use]
    pub fn transform(&self, origin: &Point3) -> Isometry3 {
        let eu = self.u_axis.unit();
        let ev = self.v_axis.unit();
        let rotation =
            Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[eu, ev, eu.cross(&ev)]));
        let mut center = Vector3::zeros();
        for axis in Axis::ALL {
            center[axis.index()] = self.center(axis);
        }
        let t = origin.coords + center;
        Isometry3::from_parts(
            Translation3::new(t.x, t.y, t.z),
            UnitQuaternion::from_rotation_matrix(&rotation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point2, TOLERANCE};

    fn front() -> PanelFrame {
        PanelFrame::new(Axis::Z, (57.0, 60.0), (0.0, 100.0), (0.0, 80.0))
    }

    #[test]
    fn nominal_edges_are_centred() {
        let f = front();
        assert!((f.nominal(PanelEdge::Left) + 50.0).abs() < TOLERANCE);
        assert!((f.nominal(PanelEdge::Top) - 40.0).abs() < TOLERANCE);
        assert_eq!(f.edge_for(Axis::X, Side::Max), PanelEdge::Right);
        assert_eq!(f.edge_axes(PanelEdge::Bottom), (Axis::Y, Axis::X));
    }

    #[test]
    fn transform_maps_local_to_assembly() {
        let f = front();
        let iso = f.transform(&Point3::origin());
        let p = iso * Point3::new(-50.0, -40.0, 0.0);
        assert!((p - Point3::new(0.0, 0.0, 58.5)).norm() < TOLERANCE);
    }

    #[test]
    fn side_panel_uses_z_as_u() {
        let f = PanelFrame::new(Axis::X, (0.0, 3.0), (0.0, 60.0), (0.0, 80.0));
        let iso = f.transform(&Point3::new(10.0, 0.0, 0.0));
        let local = Point2::new(30.0, 40.0);
        let p = iso * Point3::new(local.x, local.y, 0.0);
        assert!((p - Point3::new(11.5, 80.0, 60.0)).norm() < TOLERANCE);
    }
}
