//! Outline tracing: edge lines, corner joins, features and custom paths.
use super::layout::{EdgePlan, EdgeRole, PanelPlan, SlotCut};
use super::{EdgePathPoint, EdgeStatus, PanelCorner, PanelEdge, PanelOverrides};
use crate::finger::{trace_features, EdgeFeature, FeatureKind};
use crate::geometry::Rect2;
use crate::math::polygon_2d::cleanup_polygon;
use crate::math::Point2;

/// Which features the traced outline keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineMode {
    /// Everything: the cut outline.
    Full,
    /// Joint features removed; legs and custom paths kept.
    ToothFree,
}

/// Edge after user overrides have been applied.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedEdge {
    pub edge: PanelEdge,
    pub extension: f64,
    /// Local across coordinate of the straight edge line.
    pub line: f64,
    pub features: Vec<EdgeFeature>,
    pub custom: Vec<EdgePathPoint>,
}

/// Extension an edge actually takes for a requested amount.
#[must_use]
pub(crate) fn effective_extension(plan: &EdgePlan, requested: f64) -> f64 {
    if plan.role == EdgeRole::Feet {
        return 0.0;
    }
    match plan.status() {
        EdgeStatus::Locked => 0.0,
        EdgeStatus::OutwardOnly => requested.max(0.0),
        EdgeStatus::Open => requested,
    }
}

/// Traces the outline of one panel plan.
pub(crate) struct OutlineBuilder<'a> {
    plan: &'a PanelPlan,
    edges: [ResolvedEdge; 4],
    thickness: f64,
}

impl<'a> OutlineBuilder<'a> {
    #[must_use]
    pub fn new(plan: &'a PanelPlan, overrides: Option<&PanelOverrides>, thickness: f64) -> Self {
        let edges = PanelEdge::ALL.map(|edge| {
            let p = plan.edge(edge);
            let requested = overrides.map_or(0.0, |o| o.extension(edge));
            let extension = effective_extension(p, requested);
            let custom = overrides
                .and_then(|o| o.custom_paths.get(&edge))
                .filter(|_| p.role != EdgeRole::Feet && (p.status() == EdgeStatus::Open || extension > 0.0))
                .cloned()
                .unwrap_or_default();
            if extension == 0.0 {
                ResolvedEdge {
                    edge,
                    extension,
                    line: p.base,
                    features: p.features.clone(),
                    custom,
                }
            } else {
                ResolvedEdge {
                    edge,
                    extension,
                    line: p.nominal + p.outward() * extension,
                    features: Vec::new(),
                    custom,
                }
            }
        });
        Self {
            plan,
            edges,
            thickness,
        }
    }

    #[must_use]
    pub fn edge(&self, edge: PanelEdge) -> &ResolvedEdge {
        &self.edges[edge.index()]
    }

    #[must_use]
    pub fn edges(&self) -> &[ResolvedEdge; 4] {
        &self.edges
    }

    /// Slot holes replacing the edge slots of outward-extended female edges.
    #[must_use]
    pub fn extension_slots(&self) -> Vec<SlotCut> {
        let t = self.thickness;
        let mut out = Vec::new();
        for resolved in &self.edges {
            let plan = self.plan.edge(resolved.edge);
            if resolved.extension <= 0.0 {
                continue;
            }
            let Some(joint) = plan.joint.as_ref() else {
                continue;
            };
            let inner = plan.nominal - plan.outward() * t;
            for f in plan.features.iter().filter(|f| f.kind == FeatureKind::Slot) {
                let a = resolved.edge.point(f.start, inner);
                let b = resolved.edge.point(f.end, plan.nominal);
                out.push(SlotCut {
                    joint: joint.clone(),
                    rect: Rect2::new(a.x, a.y, b.x, b.y),
                });
            }
        }
        out
    }

    /// Points where the vertical and horizontal edges of `corner` meet,
    /// ordered from the vertical edge to the horizontal one.
    ///
    /// An edge extended on its own keeps its full width up to the mating
    /// edge's nominal line, then steps back to that edge's line.
    fn corner_points(&self, corner: PanelCorner) -> Vec<Point2> {
        let (v, h) = corner.edges();
        let (rv, rh) = (self.edge(v), self.edge(h));
        let (pv, ph) = (self.plan.edge(v), self.plan.edge(h));
        let v_out = rv.extension > 0.0;
        let h_out = rh.extension > 0.0;
        if v_out == h_out {
            return vec![Point2::new(rv.line, rh.line)];
        }
        let vn = if rv.extension < 0.0 { rv.line } else { pv.nominal };
        let hn = if rh.extension < 0.0 { rh.line } else { ph.nominal };
        vec![
            Point2::new(rv.line, hn),
            Point2::new(vn, hn),
            Point2::new(vn, rh.line),
        ]
    }

    /// Outermost vertex of a named corner.
    #[must_use]
    pub fn corner_vertex(&self, corner: PanelCorner) -> Point2 {
        let (v, h) = corner.edges();
        let points = self.corner_points(corner);
        let outer = if self.edge(h).extension > 0.0 && self.edge(v).extension <= 0.0 {
            points.last()
        } else {
            points.first()
        };
        outer
            .copied()
            .unwrap_or_else(|| Point2::new(self.edge(v).line, self.edge(h).line))
    }

    fn edge_points(&self, edge: PanelEdge, mode: OutlineMode) -> Vec<Point2> {
        let resolved = self.edge(edge);
        let ascending = edge.ascending();
        if !resolved.custom.is_empty() {
            let (lo_edge, hi_edge) = edge.neighbours();
            let (lo, hi) = (self.edge(lo_edge).line, self.edge(hi_edge).line);
            let mut path: Vec<&EdgePathPoint> = resolved.custom.iter().collect();
            path.sort_by(|a, b| a.t.total_cmp(&b.t));
            if !ascending {
                path.reverse();
            }
            return path
                .into_iter()
                .map(|p| edge.point(lo + (hi - lo) * p.t, resolved.line + edge.outward() * p.offset))
                .collect();
        }
        let features: Vec<EdgeFeature> = resolved
            .features
            .iter()
            .filter(|f| mode == OutlineMode::Full || !f.kind.is_joint())
            .copied()
            .collect();
        trace_features(resolved.line, edge.outward(), &features, ascending)
            .into_iter()
            .map(|(along, across)| edge.point(along, across))
            .collect()
    }

    /// Counter-clockwise outline.
    #[must_use]
    pub fn trace(&self, mode: OutlineMode) -> Vec<Point2> {
        let mut points = Vec::new();
        let corner = |c: PanelCorner, reversed: bool| {
            let mut pts = self.corner_points(c);
            if reversed {
                pts.reverse();
            }
            pts
        };
        points.extend(corner(PanelCorner::BottomLeft, false));
        points.extend(self.edge_points(PanelEdge::Bottom, mode));
        points.extend(corner(PanelCorner::BottomRight, true));
        points.extend(self.edge_points(PanelEdge::Right, mode));
        points.extend(corner(PanelCorner::TopRight, false));
        points.extend(self.edge_points(PanelEdge::Top, mode));
        points.extend(corner(PanelCorner::TopLeft, true));
        points.extend(self.edge_points(PanelEdge::Left, mode));
        cleanup_polygon(&points)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Axis;
    use crate::math::polygon_2d::{is_simple, signed_area_2d};
    use crate::panel::{PanelFrame, PanelSource};
    use crate::scene::{FaceId, PanelId};

    /// Front panel of a 100x80x60 box with the given roles per edge.
    fn plan(roles: [EdgeRole; 4]) -> PanelPlan {
        let frame = PanelFrame::new(Axis::Z, (57.0, 60.0), (0.0, 100.0), (0.0, 80.0));
        let mut edges = PanelEdge::ALL.map(|edge| EdgePlan {
            edge,
            role: EdgeRole::Open,
            nominal: frame.nominal(edge),
            base: frame.nominal(edge),
            features: Vec::new(),
            mate: None,
            joint: None,
        });
        for (edge, role) in edges.iter_mut().zip(roles) {
            edge.role = role;
            if role == EdgeRole::Male {
                edge.base = edge.nominal - edge.outward() * 3.0;
                edge.features.push(EdgeFeature {
                    start: -10.0,
                    end: 10.0,
                    offset: 3.0,
                    kind: FeatureKind::Tab,
                });
            }
        }
        PanelPlan {
            id: PanelId::generate(),
            source: PanelSource::Face { face: FaceId::Front },
            frame,
            edges,
            slots: Vec::new(),
        }
    }

    fn count_at(points: &[Point2], p: Point2) -> usize {
        points.iter().filter(|q| (*q - p).norm() < 1e-6).count()
    }

    #[test]
    fn all_male_outline_is_inset() {
        let plan = plan([EdgeRole::Male; 4]);
        let builder = OutlineBuilder::new(&plan, None, 3.0);
        let full = builder.trace(OutlineMode::Full);
        let free = builder.trace(OutlineMode::ToothFree);
        assert_eq!(free.len(), 4);
        assert_eq!(full.len(), 4 + 4 * 4);
        assert!(signed_area_2d(&full) > 0.0);
        assert!(is_simple(&full));
        assert_eq!(count_at(&free, Point2::new(-47.0, -37.0)), 1);
    }

    #[test]
    fn locked_edge_ignores_extension() {
        let plan = plan([EdgeRole::Male; 4]);
        let mut o = PanelOverrides::default();
        o.set_extension(PanelEdge::Top, 20.0);
        let builder = OutlineBuilder::new(&plan, Some(&o), 3.0);
        assert_eq!(builder.edge(PanelEdge::Top).extension, 0.0);
    }

    #[test]
    fn equal_adjacent_extensions_merge_into_one_corner() {
        let plan = plan([EdgeRole::Male, EdgeRole::Male, EdgeRole::Open, EdgeRole::Open]);
        let mut o = PanelOverrides::default();
        o.set_extension(PanelEdge::Top, 20.0);
        o.set_extension(PanelEdge::Left, 20.0);
        let free = OutlineBuilder::new(&plan, Some(&o), 3.0).trace(OutlineMode::ToothFree);
        assert_eq!(count_at(&free, Point2::new(-70.0, 60.0)), 1);
        let i = free
            .iter()
            .position(|q| (q - Point2::new(-70.0, 60.0)).norm() < 1e-6)
            .unwrap();
        let n = free.len();
        let (prev, next) = (free[(i + n - 1) % n], free[(i + 1) % n]);
        // previous point on the top cap, next on the left side
        assert!((prev.y - 60.0).abs() < 1e-6);
        assert!((next.x + 70.0).abs() < 1e-6);
        // two extensions add two corners each
        assert_eq!(free.len(), 8);
        assert!(is_simple(&free));
    }

    #[test]
    fn single_extension_steps_to_mating_line() {
        let plan = plan([EdgeRole::Male, EdgeRole::Male, EdgeRole::Open, EdgeRole::Male]);
        let mut o = PanelOverrides::default();
        o.set_extension(PanelEdge::Top, 10.0);
        let free = OutlineBuilder::new(&plan, Some(&o), 3.0).trace(OutlineMode::ToothFree);
        for p in [
            Point2::new(-50.0, 50.0),
            Point2::new(-50.0, 40.0),
            Point2::new(-47.0, 40.0),
            Point2::new(50.0, 50.0),
        ] {
            assert_eq!(count_at(&free, p), 1, "{p:?}");
        }
        assert_eq!(free.len(), 8);
    }

    #[test]
    fn negative_extension_insets_open_edge() {
        let plan = plan([EdgeRole::Male, EdgeRole::Male, EdgeRole::Open, EdgeRole::Male]);
        let mut o = PanelOverrides::default();
        o.set_extension(PanelEdge::Top, -5.0);
        let free = OutlineBuilder::new(&plan, Some(&o), 3.0).trace(OutlineMode::ToothFree);
        assert_eq!(count_at(&free, Point2::new(-47.0, 35.0)), 1);
        assert_eq!(free.len(), 4);
    }

    #[test]
    fn custom_path_replaces_straight_edge() {
        let plan = plan([EdgeRole::Male, EdgeRole::Male, EdgeRole::Open, EdgeRole::Male]);
        let mut o = PanelOverrides::default();
        o.custom_paths.insert(
            PanelEdge::Top,
            vec![EdgePathPoint::new(0.4, 0.0), EdgePathPoint::new(0.5, 5.0), EdgePathPoint::new(0.6, 0.0)],
        );
        let full = OutlineBuilder::new(&plan, Some(&o), 3.0).trace(OutlineMode::Full);
        assert_eq!(count_at(&full, Point2::new(0.0, 45.0)), 1);
        assert!(is_simple(&full));
        assert!(signed_area_2d(&full) > 0.0);
    }

    #[test]
    fn extended_female_edge_moves_slots_into_holes() {
        let mut plan = plan([EdgeRole::Male, EdgeRole::Female, EdgeRole::Male, EdgeRole::Male]);
        let right = &mut plan.edges[PanelEdge::Right.index()];
        right.joint = Some("j".into());
        right.features.push(EdgeFeature {
            start: -5.0,
            end: 5.0,
            offset: -3.0,
            kind: FeatureKind::Slot,
        });
        let mut o = PanelOverrides::default();
        o.set_extension(PanelEdge::Right, 10.0);
        let builder = OutlineBuilder::new(&plan, Some(&o), 3.0);
        let slots = builder.extension_slots();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].rect, Rect2::new(47.0, -5.0, 50.0, 5.0));
        assert!((builder.edge(PanelEdge::Right).line - 60.0).abs() < 1e-9);
    }
}
