pub mod arc_2d;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type (panel-local coordinates, millimetres).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type (world coordinates, millimetres).
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Rigid 3D transform used for panel placement.
pub type Isometry3 = nalgebra::Isometry3<f64>;

/// Geometric tolerance for coordinate comparisons, in millimetres.
pub const TOLERANCE: f64 = 1e-6;

/// Polygons with an absolute area below this are treated as degenerate.
pub const MIN_AREA: f64 = 1e-10;

/// Returns `true` if `a` and `b` are equal within [`TOLERANCE`].
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}
