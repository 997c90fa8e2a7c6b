//! Corner detection and fillets.
//!
//! Corners are found on the tooth-free profile (joint features removed), so
//! the many small vertices of finger teeth never show up as candidates.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CornerKey, ForbiddenRegion, PanelCorner};
use crate::math::arc_2d::{corner_angle, radius_for_tangent_distance, FilletArc};
use crate::math::intersect_2d::orientation;
use crate::math::polygon_2d::cleanup_polygon;
use crate::math::{Point2, TOLERANCE};

/// Points sampled along a trial arc when checking it against forbidden
/// regions.
const ARC_SAMPLES: usize = 16;
const RADIUS_ITERATIONS: usize = 30;

/// Contour a corner belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CornerContour {
    Outline,
    /// Index into the panel's holes.
    Hole(usize),
}

/// A detected corner of a panel's outline or one of its holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerInfo {
    pub key: CornerKey,
    pub position: Point2,
    pub contour: CornerContour,
    /// Angle between the two edges, in `(0, π)`.
    pub angle: f64,
    /// Convex with respect to the material.
    pub convex: bool,
    pub eligible: bool,
    pub max_radius: f64,
    /// Radius actually applied.
    pub fillet: Option<f64>,
}

/// One of the four outer corners, where two panel edges meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCorner {
    pub corner: PanelCorner,
    pub key: CornerKey,
    pub position: Point2,
    /// Both edges are open or extended outward.
    pub eligible: bool,
    pub max_radius: f64,
    pub fillet: Option<f64>,
}

/// Detects the corners of the outline and every hole.
#[must_use]
pub fn detect_corners(
    outline: &[Point2],
    holes: &[Vec<Point2>],
    forbidden: &[ForbiddenRegion],
    min_radius: f64,
) -> Vec<CornerInfo> {
    let mut out = Vec::new();
    detect_contour(outline, CornerContour::Outline, forbidden, min_radius, &mut out);
    for (i, hole) in holes.iter().enumerate() {
        detect_contour(hole, CornerContour::Hole(i), forbidden, min_radius, &mut out);
    }
    out
}

fn detect_contour(
    points: &[Point2],
    contour: CornerContour,
    forbidden: &[ForbiddenRegion],
    min_radius: f64,
    out: &mut Vec<CornerInfo>,
) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let angles: Vec<Option<f64>> = (0..n)
        .map(|i| corner_angle(&points[(i + n - 1) % n], &points[i], &points[(i + 1) % n]))
        .collect();
    let candidate: Vec<bool> = (0..n)
        .map(|i| angles[i].is_some() && !forbidden.iter().any(|r| r.contains(&points[i])))
        .collect();

    for i in 0..n {
        let Some(angle) = angles[i] else {
            continue;
        };
        let (ip, inx) = ((i + n - 1) % n, (i + 1) % n);
        let (prev, p, next) = (&points[ip], &points[i], &points[inx]);
        let share = |j: usize, len: f64| if candidate[j] { len * 0.5 } else { len };
        let available = share(ip, (p - prev).norm()).min(share(inx, (next - p).norm()));
        let max_radius = if candidate[i] {
            clear_radius(prev, p, next, radius_for_tangent_distance(available, angle), forbidden)
        } else {
            0.0
        };
        out.push(CornerInfo {
            key: CornerKey::from_point(p),
            position: *p,
            contour,
            angle,
            convex: orientation(prev, p, next) > 0.0,
            eligible: candidate[i] && max_radius >= min_radius,
            max_radius,
            fillet: None,
        });
    }
}

/// Largest radius up to `limit` whose arc stays out of every forbidden
/// region.
fn clear_radius(prev: &Point2, p: &Point2, next: &Point2, limit: f64, forbidden: &[ForbiddenRegion]) -> f64 {
    let clear = |r: f64| {
        FilletArc::at_corner(prev, p, next, r).is_some_and(|arc| {
            arc.points(ARC_SAMPLES)
                .iter()
                .all(|q| !forbidden.iter().any(|region| region.contains(q)))
        })
    };
    if limit < TOLERANCE {
        return 0.0;
    }
    if clear(limit) {
        return limit;
    }
    let (mut lo, mut hi) = (0.0, limit);
    for _ in 0..RADIUS_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        if clear(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Replaces every vertex keyed in `fillets` with an arc of `segments`
/// chords.
#[must_use]
pub fn apply_fillets(points: &[Point2], fillets: &BTreeMap<CornerKey, f64>, segments: usize) -> Vec<Point2> {
    let n = points.len();
    if n < 3 || fillets.is_empty() {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(n + fillets.len() * segments);
    for i in 0..n {
        let p = &points[i];
        let arc = fillets.get(&CornerKey::from_point(p)).and_then(|&r| {
            FilletArc::at_corner(&points[(i + n - 1) % n], p, &points[(i + 1) % n], r)
        });
        match arc {
            Some(arc) => out.extend(arc.points(segments)),
            None => out.push(*p),
        }
    }
    cleanup_polygon(&out)
}
