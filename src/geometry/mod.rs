pub mod boolean;
pub mod profile;
pub mod rect;

pub use boolean::{boolean_2d, BooleanOp};
pub use profile::Profile;
pub use rect::Rect2;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::{Point3, Vector3, TOLERANCE};

/// A world axis of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index (`0`, `1`, `2`).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// In-plane `(u, v)` axes of a slab whose normal is `self`.
    ///
    /// Slabs normal to X read as (Z, Y), normal to Y as (X, Z), normal to Z
    /// as (X, Y).
    #[must_use]
    pub fn plane_axes(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Z, Axis::Y),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// The axis that is neither `a` nor `b`. Callers pass distinct axes.
    #[must_use]
    pub fn third(a: Axis, b: Axis) -> Axis {
        Axis::ALL
            .into_iter()
            .find(|&c| c != a && c != b)
            .unwrap_or(Axis::X)
    }

    /// Unit vector along the axis.
    #[must_use]
    pub fn unit(self) -> Vector3 {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Which end of an axis range something sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Min,
    Max,
}

impl Side {
    /// `-1` for [`Side::Min`], `+1` for [`Side::Max`].
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Side::Min => -1.0,
            Side::Max => 1.0,
        }
    }

    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::Min => Side::Max,
            Side::Max => Side::Min,
        }
    }
}

/// Axis-aligned box in an assembly's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds3 {
    #[must_use]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn lo(&self, axis: Axis) -> f64 {
        self.min[axis.index()]
    }

    #[must_use]
    pub fn hi(&self, axis: Axis) -> f64 {
        self.max[axis.index()]
    }

    /// Coordinate of the given side along `axis`.
    #[must_use]
    pub fn at(&self, axis: Axis, side: Side) -> f64 {
        match side {
            Side::Min => self.lo(axis),
            Side::Max => self.hi(axis),
        }
    }

    #[must_use]
    pub fn size(&self, axis: Axis) -> f64 {
        self.hi(axis) - self.lo(axis)
    }

    #[must_use]
    pub fn center(&self, axis: Axis) -> f64 {
        (self.lo(axis) + self.hi(axis)) * 0.5
    }

    /// Copy of `self` with the range along `axis` replaced.
    #[must_use]
    pub fn with_range(&self, axis: Axis, lo: f64, hi: f64) -> Self {
        let mut out = *self;
        out.min[axis.index()] = lo;
        out.max[axis.index()] = hi;
        out
    }

    /// Returns `true` if `other` lies inside `self` within [`TOLERANCE`].
    #[must_use]
    pub fn contains_bounds(&self, other: &Bounds3) -> bool {
        Axis::ALL.into_iter().all(|a| {
            other.lo(a) >= self.lo(a) - TOLERANCE && other.hi(a) <= self.hi(a) + TOLERANCE
        })
    }

    /// Component-wise comparison within [`TOLERANCE`].
    #[must_use]
    pub fn approx_eq(&self, other: &Bounds3) -> bool {
        Axis::ALL.into_iter().all(|a| {
            (self.lo(a) - other.lo(a)).abs() < TOLERANCE
                && (self.hi(a) - other.hi(a)).abs() < TOLERANCE
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bounds3 {
        Bounds3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 20.0, 30.0))
    }

    #[test]
    fn plane_axes_follow_normal() {
        assert_eq!(Axis::X.plane_axes(), (Axis::Z, Axis::Y));
        assert_eq!(Axis::Y.plane_axes(), (Axis::X, Axis::Z));
        assert_eq!(Axis::Z.plane_axes(), (Axis::X, Axis::Y));
        assert_eq!(Axis::third(Axis::X, Axis::Z), Axis::Y);
    }

    #[test]
    fn bounds_accessors() {
        let b = unit_box();
        assert!((b.size(Axis::Y) - 20.0).abs() < TOLERANCE);
        assert!((b.center(Axis::Z) - 15.0).abs() < TOLERANCE);
        assert!((b.at(Axis::X, Side::Max) - 10.0).abs() < TOLERANCE);
        let narrowed = b.with_range(Axis::X, 2.0, 4.0);
        assert!(b.contains_bounds(&narrowed));
        assert!(!narrowed.contains_bounds(&b));
    }
}
