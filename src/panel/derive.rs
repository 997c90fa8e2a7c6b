//! Per-assembly panel derivation.
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::corners::{apply_fillets, detect_corners};
use super::layout::{EdgeRole, Layout, PanelPlan, SlotCut};
use super::outline::{OutlineBuilder, OutlineMode, ResolvedEdge};
use super::{
    Cutout, CutoutMode, EdgeInfo, EdgeStatus, ForbiddenKind, ForbiddenRegion, Hole, HoleKind,
    Joint, NamedCorner, Panel, PanelCorner, PanelEdge, PanelOverrides, SafeSpace,
};
use crate::finger::{FeatureKind, FingerData, MaterialConfig};
use crate::geometry::{boolean_2d, BooleanOp, Profile, Rect2};
use crate::math::polygon_2d::{bounds_2d, ensure_ccw, ensure_cw, polygon_inside, polygons_overlap};
use crate::math::{Point2, TOLERANCE};
use crate::panel::CornerKey;
use crate::scene::{AssemblyId, AssemblyNode, SceneSettings, SceneStore};

/// Everything derived from one assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyDerived {
    pub finger: FingerData,
    /// Material after finger-width clamping.
    pub material: MaterialConfig,
    pub panels: Vec<Panel>,
    pub joints: Vec<Joint>,
}

/// Derives the panels and joints of one assembly. Nested assemblies are
/// derived separately.
#[must_use]
pub fn derive_assembly(
    store: &SceneStore,
    id: AssemblyId,
    node: &AssemblyNode,
    settings: &SceneSettings,
) -> AssemblyDerived {
    let material = node.effective_material();
    let finger = FingerData::compute(node.dims(), &material);
    let layout = Layout::compute(store, node, &finger, &material);
    let panels: Vec<Panel> = layout
        .plans
        .iter()
        .map(|plan| derive_panel(id, node, plan, material.thickness, settings))
        .collect();
    debug!(
        assembly = ?id,
        panels = panels.len(),
        joints = layout.joints.len(),
        "derived assembly"
    );
    AssemblyDerived {
        finger,
        material,
        panels,
        joints: layout.joints,
    }
}

fn derive_panel(
    assembly: AssemblyId,
    node: &AssemblyNode,
    plan: &PanelPlan,
    t: f64,
    settings: &SceneSettings,
) -> Panel {
    let overrides = node.overrides(plan.id);
    let builder = OutlineBuilder::new(plan, overrides, t);
    let mut outline = builder.trace(OutlineMode::Full);
    let mut tooth_free = builder.trace(OutlineMode::ToothFree);

    let slots: Vec<SlotCut> = plan
        .slots
        .iter()
        .cloned()
        .chain(builder.extension_slots())
        .collect();
    let mut holes: Vec<Hole> = slots
        .iter()
        .map(|s| Hole {
            kind: HoleKind::Slot {
                joint: s.joint.clone(),
            },
            points: ensure_cw(&s.rect.to_contour()),
        })
        .collect();
    let forbidden = forbidden_regions(plan, builder.edges(), &slots, t);

    let mut cutout_holes = Vec::new();
    for cutout in overrides.map(|o| o.cutouts.as_slice()).unwrap_or_default() {
        apply_cutout(&mut outline, &mut holes, cutout);
        apply_cutout(&mut tooth_free, &mut cutout_holes, cutout);
    }

    let hole_points: Vec<Vec<Point2>> = holes.iter().map(|h| h.points.clone()).collect();
    let mut corners = detect_corners(&tooth_free, &hole_points, &forbidden, settings.min_fillet_radius);

    let edges: [EdgeInfo; 4] = PanelEdge::ALL.map(|edge| {
        let p = plan.edge(edge);
        let r = builder.edge(edge);
        EdgeInfo {
            edge,
            status: p.status(),
            extension: r.extension,
            custom_path: !r.custom.is_empty(),
            feet: p.role == EdgeRole::Feet,
            features: r.features.clone(),
            nominal: p.nominal,
            line: r.line,
            mate: p.mate,
        }
    });
    let safe = |e: &EdgeInfo| !e.feet && (e.status == EdgeStatus::Open || e.extension > 0.0);
    let corner_open = |corner: PanelCorner| {
        let (v, h) = corner.edges();
        safe(&edges[v.index()]) && safe(&edges[h.index()])
    };
    let corner_keys = PanelCorner::ALL.map(|corner| {
        let position = builder.corner_vertex(corner);
        (corner, position, CornerKey::from_point(&position))
    });

    let mut requested = overrides.map(PanelOverrides::fillet_map).unwrap_or_default();
    for (corner, radius) in overrides.map(|o| &o.corner_fillets).into_iter().flatten() {
        if !corner_open(*corner) {
            debug!(panel = %plan.id, %corner, "fillet on closed corner skipped");
            continue;
        }
        if let Some((_, _, key)) = corner_keys.iter().find(|(c, _, _)| c == corner) {
            requested.insert(*key, *radius);
        }
    }
    let mut applied = BTreeMap::new();
    for corner in &mut corners {
        let Some(&radius) = requested.get(&corner.key) else {
            continue;
        };
        if !corner.eligible {
            debug!(panel = %plan.id, corner = %corner.key, "fillet on ineligible corner skipped");
            continue;
        }
        let radius = if radius > corner.max_radius {
            debug!(
                panel = %plan.id,
                corner = %corner.key,
                requested = radius,
                max = corner.max_radius,
                "fillet radius clamped"
            );
            corner.max_radius
        } else {
            radius
        };
        corner.fillet = Some(radius);
        applied.insert(corner.key, radius);
    }
    if !applied.is_empty() {
        outline = apply_fillets(&outline, &applied, settings.fillet_segments);
        for hole in &mut holes {
            hole.points = apply_fillets(&hole.points, &applied, settings.fillet_segments);
        }
    }

    let named_corners = corner_keys
        .iter()
        .map(|&(corner, position, key)| {
            let info = corners.iter().find(|c| c.key == key);
            NamedCorner {
                corner,
                key,
                position,
                eligible: corner_open(corner) && info.is_some_and(|c| c.eligible),
                max_radius: info.map_or(0.0, |c| c.max_radius),
                fillet: info.and_then(|c| c.fillet),
            }
        })
        .collect();

    let cutout_points: Vec<Vec<Point2>> = cutout_holes.into_iter().map(|h| h.points).collect();
    let safe_space = SafeSpace::compute(&tooth_free, &cutout_points, &forbidden);

    Panel {
        id: plan.id,
        assembly,
        source: plan.source,
        thickness: t,
        width: plan.frame.width(),
        height: plan.frame.height(),
        outline: ensure_ccw(&outline),
        holes,
        edges,
        corners,
        named_corners,
        forbidden,
        safe_space,
        transform: plan.frame.transform(&node.origin()),
    }
}

/// Margined regions around jointed edges, cross-lap notches and slot holes.
fn forbidden_regions(
    plan: &PanelPlan,
    edges: &[ResolvedEdge; 4],
    slots: &[SlotCut],
    t: f64,
) -> Vec<ForbiddenRegion> {
    let mut out = Vec::new();
    for resolved in edges {
        let edge = resolved.edge;
        let p = plan.edge(edge);
        let zone = resolved
            .features
            .iter()
            .filter(|f| matches!(f.kind, FeatureKind::Tab | FeatureKind::Slot))
            .fold(None, |acc: Option<(f64, f64)>, f| match acc {
                None => Some((f.start, f.end)),
                Some((lo, hi)) => Some((lo.min(f.start), hi.max(f.end))),
            });
        if let Some((lo, hi)) = zone {
            let a = edge.point(lo, p.nominal - p.outward() * t);
            let b = edge.point(hi, p.nominal);
            out.push(ForbiddenRegion::new(
                ForbiddenKind::EdgeJoint,
                Rect2::new(a.x, a.y, b.x, b.y),
                t,
            ));
        }
        for f in resolved.features.iter().filter(|f| f.kind == FeatureKind::Notch) {
            let a = edge.point(f.start, p.base);
            let b = edge.point(f.end, p.base + p.outward() * f.offset);
            out.push(ForbiddenRegion::new(
                ForbiddenKind::CrossLap,
                Rect2::new(a.x, a.y, b.x, b.y),
                t,
            ));
        }
    }
    out.extend(
        slots
            .iter()
            .map(|s| ForbiddenRegion::new(ForbiddenKind::SlotHole, s.rect, t)),
    );
    out
}

/// Applies one cutout to an outline and its holes.
///
/// A subtractive cutout lying cleanly inside the material becomes a hole of
/// its own; anything else goes through a boolean, after which holes that
/// survived unchanged keep their provenance.
fn apply_cutout(outline: &mut Vec<Point2>, holes: &mut Vec<Hole>, cutout: &Cutout) {
    let contour = ensure_ccw(&cutout.contour());
    if cutout.mode == CutoutMode::Subtract
        && polygon_inside(&contour, outline)
        && !holes.iter().any(|h| polygons_overlap(&h.points, &contour))
    {
        holes.push(Hole {
            kind: HoleKind::Cutout(cutout.id),
            points: ensure_cw(&contour),
        });
        return;
    }
    let op = match cutout.mode {
        CutoutMode::Subtract => BooleanOp::Difference,
        CutoutMode::Add => BooleanOp::Union,
    };
    let profile = Profile::new(
        outline.clone(),
        holes.iter().map(|h| h.points.clone()).collect(),
    );
    let Some(result) = boolean_2d(&profile, &[contour], op) else {
        warn!(cutout = %cutout.id, "cutout would remove the whole panel, skipped");
        return;
    };
    let retagged = result
        .holes
        .into_iter()
        .map(|points| {
            let kind = holes
                .iter()
                .find(|h| same_bounds(&h.points, &points))
                .map_or(HoleKind::Composed, |h| h.kind.clone());
            Hole { kind, points }
        })
        .collect();
    *outline = result.outline;
    *holes = retagged;
}

fn same_bounds(a: &[Point2], b: &[Point2]) -> bool {
    match (bounds_2d(a), bounds_2d(b)) {
        (Some((a0, a1)), Some((b0, b1))) => {
            a.len() == b.len() && (a0 - b0).norm() < TOLERANCE && (a1 - b1).norm() < TOLERANCE
        }
        _ => false,
    }
}
