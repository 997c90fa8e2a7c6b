//! Slab layout and edge classification for one assembly.
//!
//! Every joint is emitted from its male side: the male edge receives tabs
//! and the female panel receives slots at exactly the same assembly-space
//! sections, so mating features agree without a separate alignment pass.
use std::collections::HashMap;
use std::ops::Range;

use super::{EdgeStatus, Joint, JointAnchor, JointKind, PanelEdge, PanelFrame, PanelSource, Probe};
use crate::finger::{EdgeFeature, FeatureKind, FingerData, FingerPattern, FingerSection, MaterialConfig};
use crate::geometry::{Axis, Bounds3, Rect2, Side};
use crate::math::{Point3, TOLERANCE};
use crate::scene::{AssemblyNode, FaceId, PanelId, SceneStore, TabDirection};

/// What an edge does at its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeRole {
    Open,
    Male,
    Female,
    Feet,
}

/// Layout of one panel edge before user overrides.
#[derive(Debug, Clone)]
pub(crate) struct EdgePlan {
    pub edge: PanelEdge,
    pub role: EdgeRole,
    pub nominal: f64,
    pub base: f64,
    pub features: Vec<EdgeFeature>,
    pub mate: Option<PanelId>,
    pub joint: Option<String>,
}

impl EdgePlan {
    fn new(edge: PanelEdge, nominal: f64) -> Self {
        Self {
            edge,
            role: EdgeRole::Open,
            nominal,
            base: nominal,
            features: Vec::new(),
            mate: None,
            joint: None,
        }
    }

    #[must_use]
    pub fn outward(&self) -> f64 {
        self.edge.outward()
    }

    /// A male edge stays locked even when crossings removed every tab: its
    /// body is still inset against the mating panel.
    #[must_use]
    pub fn status(&self) -> EdgeStatus {
        if self.role == EdgeRole::Male {
            EdgeStatus::Locked
        } else {
            EdgeStatus::from_features(&self.features)
        }
    }
}

/// A through-hole receiving another panel's tab.
#[derive(Debug, Clone)]
pub(crate) struct SlotCut {
    pub joint: String,
    pub rect: Rect2,
}

/// Everything known about a panel before outlines are traced.
#[derive(Debug, Clone)]
pub(crate) struct PanelPlan {
    pub id: PanelId,
    pub source: PanelSource,
    pub frame: PanelFrame,
    pub edges: [EdgePlan; 4],
    pub slots: Vec<SlotCut>,
}

impl PanelPlan {
    fn new(id: PanelId, source: PanelSource, frame: PanelFrame) -> Self {
        Self {
            id,
            source,
            frame,
            edges: PanelEdge::ALL.map(|e| EdgePlan::new(e, frame.nominal(e))),
            slots: Vec::new(),
        }
    }

    #[must_use]
    pub fn edge(&self, edge: PanelEdge) -> &EdgePlan {
        &self.edges[edge.index()]
    }

    fn edge_mut(&mut self, edge: PanelEdge) -> &mut EdgePlan {
        &mut self.edges[edge.index()]
    }
}

/// Plans and joints of one assembly.
#[derive(Debug, Clone, Default)]
pub(crate) struct Layout {
    pub plans: Vec<PanelPlan>,
    pub joints: Vec<Joint>,
}

#[derive(Debug, Clone, Copy)]
struct DividerCtx {
    bounds: Bounds3,
    position: f64,
}

struct PendingJoint {
    male: usize,
    edge: PanelEdge,
    target: usize,
    kind: JointKind,
    axis: Axis,
    sections: Vec<FingerSection>,
}

/// Interval occupied by a crossing divider, along `axis`.
#[derive(Debug, Clone, Copy)]
struct Crossing {
    axis: Axis,
    lo: f64,
    hi: f64,
}

/// Male wall-wall edges go to the panel whose normal ranks higher.
fn priority(axis: Axis) -> u8 {
    match axis {
        Axis::Z => 2,
        Axis::X => 1,
        Axis::Y => 0,
    }
}

enum FaceEdge {
    Open,
    Feet,
    Male(JointKind),
    Female,
}

fn classify_face_edge(assembly: &AssemblyNode, face: FaceId, neighbour: FaceId) -> FaceEdge {
    if assembly.feet().is_some() && assembly.lid_side(neighbour) == Some(Side::Min) {
        return FaceEdge::Feet;
    }
    if !assembly.is_solid(neighbour) {
        return FaceEdge::Open;
    }
    if assembly.is_slot_joined(face) {
        return FaceEdge::Male(JointKind::Slot);
    }
    if assembly.is_slot_joined(neighbour) {
        return FaceEdge::Open;
    }
    if let Some(side) = assembly.lid_side(face) {
        return match assembly.lids().get(side).tab_direction {
            TabDirection::TabsOut => FaceEdge::Male(JointKind::Edge),
            TabDirection::TabsIn => FaceEdge::Female,
        };
    }
    if let Some(side) = assembly.lid_side(neighbour) {
        return match assembly.lids().get(side).tab_direction {
            TabDirection::TabsOut => FaceEdge::Female,
            TabDirection::TabsIn => FaceEdge::Male(JointKind::Edge),
        };
    }
    if priority(face.normal()) > priority(neighbour.normal()) {
        FaceEdge::Male(JointKind::Edge)
    } else {
        FaceEdge::Female
    }
}

/// Rectangle in `frame`'s local plane spanning `r1` along `a1` and `r2`
/// along `a2` (assembly coordinates).
fn local_rect(frame: &PanelFrame, a1: Axis, r1: (f64, f64), a2: Axis, r2: (f64, f64)) -> Rect2 {
    let (l1, h1) = frame.to_local_range(a1, r1.0, r1.1);
    let (l2, h2) = frame.to_local_range(a2, r2.0, r2.1);
    if a1 == frame.u_axis {
        Rect2::new(l1, l2, h1, h2)
    } else {
        Rect2::new(l2, l1, h2, h1)
    }
}

fn assembly_point(origin: &Point3, coords: [(Axis, f64); 3]) -> Point3 {
    let mut p = *origin;
    for (axis, value) in coords {
        p[axis.index()] += value;
    }
    p
}

/// Finds the slab a divider edge runs into: normal along `across`, face at
/// `c` on the divider's side, covering the divider's span.
fn find_slab(
    plans: &[PanelPlan],
    skip: usize,
    across: Axis,
    side: Side,
    c: f64,
    along: (Axis, f64, f64),
    normal: (Axis, f64),
) -> Option<usize> {
    plans.iter().enumerate().position(|(i, plan)| {
        if i == skip || plan.frame.normal != across {
            return false;
        }
        let (lo, hi) = plan.frame.normal_range;
        let face = match side {
            Side::Max => lo,
            Side::Min => hi,
        };
        let (b_lo, b_hi) = plan.frame.range(along.0);
        let (n_lo, n_hi) = plan.frame.range(normal.0);
        (face - c).abs() < TOLERANCE
            && b_lo <= along.1 + TOLERANCE
            && b_hi >= along.2 - TOLERANCE
            && n_lo < normal.1 - TOLERANCE
            && n_hi > normal.1 + TOLERANCE
    })
}

impl Layout {
    /// Lays out the faces and dividers of `assembly`.
    pub(crate) fn compute(
        store: &SceneStore,
        assembly: &AssemblyNode,
        finger: &FingerData,
        material: &MaterialConfig,
    ) -> Self {
        let t = material.thickness;
        let mut plans = Vec::new();
        let mut dividers: Vec<Option<DividerCtx>> = Vec::new();

        for face in FaceId::ALL {
            if !assembly.is_solid(face) {
                continue;
            }
            let normal = face.normal();
            let (u, v) = normal.plane_axes();
            let frame = PanelFrame::new(
                normal,
                assembly.face_range(face),
                (0.0, assembly.dim(u)),
                (0.0, assembly.dim(v)),
            );
            plans.push(PanelPlan::new(
                assembly.face_panel_id(face),
                PanelSource::Face { face },
                frame,
            ));
            dividers.push(None);
        }

        let mut grids: Vec<(Range<usize>, Axis, Bounds3)> = Vec::new();
        for void_id in store.voids_of(assembly.root_void()) {
            let Some(void) = store.voids.get(void_id) else {
                continue;
            };
            let vb = *void.bounds();
            let first = plans.len();
            for d in void.dividers() {
                let n = d.key.axis;
                let (u, v) = n.plane_axes();
                let frame = PanelFrame::new(
                    n,
                    (d.position - t * 0.5, d.position + t * 0.5),
                    (vb.lo(u) - t, vb.hi(u) + t),
                    (vb.lo(v) - t, vb.hi(v) + t),
                );
                plans.push(PanelPlan::new(
                    d.id,
                    PanelSource::Divider {
                        void: void_id,
                        key: d.key,
                        position: d.position,
                    },
                    frame,
                ));
                dividers.push(Some(DividerCtx {
                    bounds: vb,
                    position: d.position,
                }));
            }
            if let Some(split) = void.split().filter(|s| s.is_grid()) {
                grids.push((first..plans.len(), split.primary_axis(), vb));
            }
        }

        let face_index: HashMap<FaceId, usize> = plans
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match p.source {
                PanelSource::Face { face } => Some((face, i)),
                PanelSource::Divider { .. } => None,
            })
            .collect();

        let mut crossings: Vec<Vec<Crossing>> = vec![Vec::new(); plans.len()];
        for (range, _, _) in &grids {
            for i in range.clone() {
                for j in range.clone() {
                    let Some(dj) = dividers[j] else { continue };
                    if plans[i].frame.normal == plans[j].frame.normal {
                        continue;
                    }
                    crossings[i].push(Crossing {
                        axis: plans[j].frame.normal,
                        lo: dj.position - t * 0.5,
                        hi: dj.position + t * 0.5,
                    });
                }
            }
        }

        let mut pending = Vec::new();
        for i in 0..plans.len() {
            for edge in PanelEdge::ALL {
                let frame = plans[i].frame;
                let (across, along) = frame.edge_axes(edge);
                let side = PanelFrame::edge_side(edge);
                let role = match (plans[i].source, dividers[i]) {
                    (PanelSource::Face { face }, _) => {
                        let neighbour = FaceId::from_axis_side(across, side);
                        match classify_face_edge(assembly, face, neighbour) {
                            FaceEdge::Open => EdgeRole::Open,
                            FaceEdge::Feet => EdgeRole::Feet,
                            FaceEdge::Female => EdgeRole::Female,
                            FaceEdge::Male(kind) => {
                                if let Some(&target) = face_index.get(&neighbour) {
                                    pending.push(PendingJoint {
                                        male: i,
                                        edge,
                                        target,
                                        kind,
                                        axis: along,
                                        sections: finger.get(along).features().copied().collect(),
                                    });
                                }
                                EdgeRole::Male
                            }
                        }
                    }
                    (PanelSource::Divider { .. }, Some(ctx)) => {
                        let vb = ctx.bounds;
                        let c = vb.at(across, side);
                        match find_slab(
                            &plans,
                            i,
                            across,
                            side,
                            c,
                            (along, vb.lo(along), vb.hi(along)),
                            (frame.normal, ctx.position),
                        ) {
                            Some(target) => {
                                let mut sections = finger.get(along).features_within(vb.lo(along), vb.hi(along));
                                if sections.is_empty() {
                                    sections = FingerPattern::compute(along, vb.lo(along), vb.hi(along), material)
                                        .features()
                                        .copied()
                                        .collect();
                                }
                                sections.retain(|s| {
                                    !crossings[i]
                                        .iter()
                                        .any(|x| x.axis == along && s.overlaps(x.lo, x.hi))
                                });
                                pending.push(PendingJoint {
                                    male: i,
                                    edge,
                                    target,
                                    kind: JointKind::Slot,
                                    axis: along,
                                    sections,
                                });
                                EdgeRole::Male
                            }
                            None => EdgeRole::Open,
                        }
                    }
                    (PanelSource::Divider { .. }, None) => EdgeRole::Open,
                };
                let plan = plans[i].edge_mut(edge);
                plan.role = role;
                plan.base = match role {
                    EdgeRole::Male => plan.nominal - plan.outward() * t,
                    EdgeRole::Feet => plan.nominal + plan.outward() * t,
                    EdgeRole::Open | EdgeRole::Female => plan.nominal,
                };
            }
        }

        let origin = assembly.origin();
        let mut joints = Vec::new();
        for p in pending {
            if p.sections.is_empty() {
                continue;
            }
            if let Some(joint) = emit_joint(&mut plans, &p, t, &origin) {
                joints.push(joint);
            }
        }

        for (range, primary, vb) in grids {
            for i in range.clone() {
                for j in range.clone() {
                    if plans[i].frame.normal != primary || plans[j].frame.normal == primary {
                        continue;
                    }
                    if let Some(joint) = emit_cross_lap(&mut plans, i, j, &vb, t, &origin) {
                        joints.push(joint);
                    }
                }
            }
        }

        if let Some(feet) = assembly.feet().copied() {
            for plan in &mut plans {
                for edge in PanelEdge::ALL {
                    if plan.edge(edge).role != EdgeRole::Feet {
                        continue;
                    }
                    let (lo_edge, hi_edge) = edge.neighbours();
                    let lo = plan.edge(lo_edge).base;
                    let hi = plan.edge(hi_edge).base;
                    let offset = feet.height - t;
                    let legs = [
                        (lo + feet.inset, lo + feet.inset + feet.width),
                        (hi - feet.inset - feet.width, hi - feet.inset),
                    ];
                    plan.edge_mut(edge).features.extend(legs.into_iter().map(|(start, end)| EdgeFeature {
                        start,
                        end,
                        offset,
                        kind: FeatureKind::Leg,
                    }));
                }
            }
        }

        Self { plans, joints }
    }
}

/// Adds tabs to the male edge and slots (edge notches or through-holes) to
/// the female panel.
fn emit_joint(plans: &mut [PanelPlan], p: &PendingJoint, t: f64, origin: &Point3) -> Option<Joint> {
    let male = plans.get(p.male)?.clone();
    let female_frame = plans.get(p.target)?.frame;
    let male_frame = male.frame;
    let male_edge = male.edge(p.edge);
    let (across, along) = male_frame.edge_axes(p.edge);
    let n = male_frame.normal;
    let id = Joint::edge_id(male.id, p.edge);

    let female_edge = (p.kind == JointKind::Edge).then(|| {
        let side = if male_frame.center(n) > female_frame.center(n) {
            Side::Max
        } else {
            Side::Min
        };
        female_frame.edge_for(n, side)
    });

    let mut anchors = Vec::with_capacity(p.sections.len());
    let mut tabs = Vec::with_capacity(p.sections.len());
    let mut slots = Vec::with_capacity(p.sections.len());
    let mut holes = Vec::new();
    for s in &p.sections {
        let (m_lo, m_hi) = male_frame.to_local_range(along, s.start, s.end);
        tabs.push(EdgeFeature {
            start: m_lo,
            end: m_hi,
            offset: t,
            kind: FeatureKind::Tab,
        });
        let male_point = p
            .edge
            .point((m_lo + m_hi) * 0.5, male_edge.base + male_edge.outward() * t * 0.5);

        let (f_lo, f_hi) = female_frame.to_local_range(along, s.start, s.end);
        let female_point = match female_edge {
            Some(fe) => {
                slots.push(EdgeFeature {
                    start: f_lo,
                    end: f_hi,
                    offset: -t,
                    kind: FeatureKind::Slot,
                });
                let nominal = female_frame.nominal(fe);
                fe.point((f_lo + f_hi) * 0.5, nominal - fe.outward() * t * 0.5)
            }
            None => {
                let rect = local_rect(&female_frame, along, (s.start, s.end), n, male_frame.normal_range);
                holes.push(SlotCut {
                    joint: id.clone(),
                    rect,
                });
                rect.center()
            }
        };

        anchors.push(JointAnchor {
            male: male_point,
            female: female_point,
            expected: assembly_point(
                origin,
                [
                    (along, s.center()),
                    (across, female_frame.center(across)),
                    (n, male_frame.center(n)),
                ],
            ),
            male_probe: Probe {
                point: male_point,
                material: true,
            },
            female_probe: Probe {
                point: female_point,
                material: false,
            },
        });
    }

    let female_id = plans[p.target].id;
    {
        let edge = plans[p.male].edge_mut(p.edge);
        edge.features.extend(tabs);
        edge.mate = Some(female_id);
        edge.joint = Some(id.clone());
    }
    match female_edge {
        Some(fe) => {
            let edge = plans[p.target].edge_mut(fe);
            edge.features.extend(slots);
            edge.mate = Some(male.id);
            edge.joint = Some(id.clone());
        }
        None => plans[p.target].slots.extend(holes),
    }

    Some(Joint {
        id,
        kind: p.kind,
        axis: p.axis,
        male: male.id,
        male_edge: p.edge,
        female: female_id,
        female_edge,
        anchors,
    })
}

/// Notches two crossing grid dividers halfway: `primary` from its high edge
/// and `secondary` from its low edge along the crossing line.
fn emit_cross_lap(
    plans: &mut [PanelPlan],
    primary: usize,
    secondary: usize,
    vb: &Bounds3,
    t: f64,
    origin: &Point3,
) -> Option<Joint> {
    let a = plans.get(primary)?.frame;
    let b = plans.get(secondary)?.frame;
    let c = Axis::third(a.normal, b.normal);
    let p_a = a.center(a.normal);
    let p_b = b.center(b.normal);
    let mid = vb.center(c);

    let notch = |frame: &PanelFrame, plan: &PanelPlan, other_axis: Axis, other_pos: f64, side: Side| {
        let edge = frame.edge_for(c, side);
        let base = plan.edge(edge).base;
        let mid_local = frame.to_local(c, mid);
        let (lo, hi) = frame.to_local_range(other_axis, other_pos - t * 0.5, other_pos + t * 0.5);
        let feature = EdgeFeature {
            start: lo,
            end: hi,
            offset: -(base - mid_local).abs(),
            kind: FeatureKind::Notch,
        };
        let center = (lo + hi) * 0.5;
        let anchor = edge.point(center, mid_local);
        let probe = edge.point(center, mid_local + side.sign() * t * 0.5);
        (edge, feature, anchor, probe)
    };

    let (edge_a, feature_a, anchor_a, probe_a) = notch(&a, &plans[primary], b.normal, p_b, Side::Max);
    let (edge_b, feature_b, anchor_b, probe_b) = notch(&b, &plans[secondary], a.normal, p_a, Side::Min);
    let (id_a, id_b) = (plans[primary].id, plans[secondary].id);
    plans[primary].edge_mut(edge_a).features.push(feature_a);
    plans[secondary].edge_mut(edge_b).features.push(feature_b);

    Some(Joint {
        id: Joint::cross_lap_id(id_a, id_b),
        kind: JointKind::CrossLap,
        axis: c,
        male: id_a,
        male_edge: edge_a,
        female: id_b,
        female_edge: Some(edge_b),
        anchors: vec![JointAnchor {
            male: anchor_a,
            female: anchor_b,
            expected: assembly_point(origin, [(a.normal, p_a), (b.normal, p_b), (c, mid)]),
            male_probe: Probe {
                point: probe_a,
                material: false,
            },
            female_probe: Probe {
                point: probe_b,
                material: false,
            },
        }],
    })
}
