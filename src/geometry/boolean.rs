//! 2D polygon booleans on panel profiles, backed by `i_overlay`.
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use tracing::debug;

use super::Profile;
use crate::math::polygon_2d::{
    cleanup_polygon, ensure_ccw, ensure_cw, rotate_to_canonical_start, signed_area_2d,
};
use crate::math::{Point2, MIN_AREA};

/// Boolean operation between a profile and a set of clip contours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
}

impl BooleanOp {
    fn rule(self) -> OverlayRule {
        match self {
            BooleanOp::Union => OverlayRule::Union,
            BooleanOp::Difference => OverlayRule::Difference,
        }
    }
}

/// Applies `op` between `subject` and the clip contours.
///
/// Clip contours may overlap each other; they are combined with the non-zero
/// fill rule. When the result splits into several pieces the one with the
/// largest area is kept. Returns `None` when nothing of measurable area
/// remains.
#[must_use]
pub fn boolean_2d(subject: &Profile, clip: &[Vec<Point2>], op: BooleanOp) -> Option<Profile> {
    let mut subject_paths = vec![to_path(&ensure_ccw(&subject.outline))];
    subject_paths.extend(subject.holes.iter().map(|h| to_path(&ensure_cw(h))));

    let clip_paths: Vec<Vec<[f64; 2]>> = clip
        .iter()
        .filter(|c| c.len() >= 3)
        .map(|c| to_path(&ensure_ccw(c)))
        .collect();

    let shapes = subject_paths.overlay(&clip_paths, op.rule(), FillRule::NonZero);
    if shapes.len() > 1 {
        debug!(pieces = shapes.len(), "boolean produced several pieces, keeping largest");
    }
    largest_shape(&shapes)
}

fn to_path(points: &[Point2]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

fn from_path(path: &[[f64; 2]]) -> Vec<Point2> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

fn largest_shape(shapes: &[Vec<Vec<[f64; 2]>>]) -> Option<Profile> {
    let mut best: Option<(f64, Profile)> = None;
    for shape in shapes {
        let Some(outer) = shape.first() else {
            continue;
        };
        let outline = cleanup_polygon(&from_path(outer));
        let area = signed_area_2d(&outline).abs();
        if outline.len() < 3 || area < MIN_AREA {
            continue;
        }
        if best.as_ref().is_some_and(|(a, _)| *a >= area) {
            continue;
        }
        let holes = shape
            .iter()
            .skip(1)
            .map(|h| cleanup_polygon(&from_path(h)))
            .filter(|h| h.len() >= 3 && signed_area_2d(h).abs() >= MIN_AREA)
            .map(|h| ensure_cw(&rotate_to_canonical_start(&h)))
            .collect();
        let outline = ensure_ccw(&rotate_to_canonical_start(&outline));
        best = Some((area, Profile::new(outline, holes)));
    }
    best.map(|(_, profile)| profile)
}
