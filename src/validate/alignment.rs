use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::finger::FeatureKind;
use crate::geometry::Axis;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::panel::{HoleKind, Joint, JointKind, Panel, PanelEdge, PanelSource};
use crate::scene::{PanelId, Scene};

/// What an alignment finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentErrorKind {
    /// Mating anchors do not coincide in world space.
    AnchorMismatch,
    /// An anchor is away from where the layout placed the joint.
    ExpectedPoint,
    /// A tab centre is not in material, or a slot centre is.
    MaterialProbe,
    /// Tab and slot counts disagree.
    FeatureCount,
    /// A void's children do not partition it.
    VoidPartition,
    /// A divider is not where its split puts it.
    DividerPosition,
    /// A sub-assembly does not fill its void.
    SubAssemblyNesting,
}

impl fmt::Display for AlignmentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlignmentErrorKind::AnchorMismatch => "anchor-mismatch",
            AlignmentErrorKind::ExpectedPoint => "expected-point",
            AlignmentErrorKind::MaterialProbe => "material-probe",
            AlignmentErrorKind::FeatureCount => "feature-count",
            AlignmentErrorKind::VoidPartition => "void-partition",
            AlignmentErrorKind::DividerPosition => "divider-position",
            AlignmentErrorKind::SubAssemblyNesting => "sub-assembly-nesting",
        };
        f.write_str(name)
    }
}

/// A structural or alignment problem found after derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentError {
    pub kind: AlignmentErrorKind,
    pub joint_id: Option<String>,
    pub panel_a: Option<PanelId>,
    pub edge_a: Option<PanelEdge>,
    pub panel_b: Option<PanelId>,
    pub edge_b: Option<PanelEdge>,
    pub point_a: Point3,
    pub point_b: Point3,
    /// `point_b - point_a`.
    pub deviation: Vector3,
    pub magnitude: f64,
    pub message: String,
}

impl AlignmentError {
    fn new(kind: AlignmentErrorKind, point_a: Point3, point_b: Point3, message: String) -> Self {
        let deviation = point_b - point_a;
        Self {
            kind,
            joint_id: None,
            panel_a: None,
            edge_a: None,
            panel_b: None,
            edge_b: None,
            point_a,
            point_b,
            deviation,
            magnitude: deviation.norm(),
            message,
        }
    }

    fn for_joint(mut self, joint: &Joint) -> Self {
        self.joint_id = Some(joint.id.clone());
        self.panel_a = Some(joint.male);
        self.edge_a = Some(joint.male_edge);
        self.panel_b = Some(joint.female);
        self.edge_b = joint.female_edge;
        self
    }
}

/// Checks every joint and the void tree of `scene` against the given
/// derived panels and joints.
///
/// Only structural state and settings are read from `scene`, so this can
/// run while the scene's own derived cache is being filled.
#[must_use]
pub fn validate_alignment(scene: &Scene, panels: &[Panel], joints: &[Joint]) -> Vec<AlignmentError> {
    let tolerance = scene.settings.alignment_tolerance;
    let index: HashMap<PanelId, &Panel> = panels.iter().map(|p| (p.id, p)).collect();
    let mut errors = Vec::new();

    for joint in joints {
        check_joint(joint, &index, tolerance, &mut errors);
    }
    check_voids(scene, &mut errors);
    check_dividers(scene, panels, tolerance, &mut errors);
    check_nesting(scene, &mut errors);

    for e in &errors {
        warn!(
            kind = %e.kind,
            joint = e.joint_id.as_deref().unwrap_or("-"),
            magnitude = e.magnitude,
            "{}",
            e.message
        );
    }
    errors
}

fn check_joint(
    joint: &Joint,
    index: &HashMap<PanelId, &Panel>,
    tolerance: f64,
    errors: &mut Vec<AlignmentError>,
) {
    let (Some(male), Some(female)) = (index.get(&joint.male), index.get(&joint.female)) else {
        errors.push(
            AlignmentError::new(
                AlignmentErrorKind::FeatureCount,
                Point3::origin(),
                Point3::origin(),
                format!("joint {} refers to a missing panel", joint.id),
            )
            .for_joint(joint),
        );
        return;
    };

    if joint.kind != JointKind::CrossLap {
        let tabs = male.edge(joint.male_edge).feature_count(FeatureKind::Tab);
        let edge_slots = joint
            .female_edge
            .map_or(0, |e| female.edge(e).feature_count(FeatureKind::Slot));
        let hole_slots = female
            .holes
            .iter()
            .filter(|h| matches!(&h.kind, HoleKind::Slot { joint: j } if *j == joint.id))
            .count();
        let expected = joint.anchors.len();
        if tabs != expected || edge_slots + hole_slots != expected {
            errors.push(
                AlignmentError::new(
                    AlignmentErrorKind::FeatureCount,
                    Point3::origin(),
                    Point3::origin(),
                    format!(
                        "joint {}: {tabs} tabs, {} slots, {expected} anchors",
                        joint.id,
                        edge_slots + hole_slots
                    ),
                )
                .for_joint(joint),
            );
        }
    }

    for anchor in &joint.anchors {
        let a = male.world_point(&anchor.male);
        let b = female.world_point(&anchor.female);
        if (b - a).norm() > tolerance {
            errors.push(
                AlignmentError::new(
                    AlignmentErrorKind::AnchorMismatch,
                    a,
                    b,
                    format!("joint {} anchors are {:.6} mm apart", joint.id, (b - a).norm()),
                )
                .for_joint(joint),
            );
        }
        if (anchor.expected - a).norm() > tolerance {
            errors.push(
                AlignmentError::new(
                    AlignmentErrorKind::ExpectedPoint,
                    anchor.expected,
                    a,
                    format!("joint {} anchor is off its expected point", joint.id),
                )
                .for_joint(joint),
            );
        }
        for (panel, probe) in [(male, &anchor.male_probe), (female, &anchor.female_probe)] {
            if panel.in_material(&probe.point) != probe.material {
                let w = panel.world_point(&probe.point);
                errors.push(
                    AlignmentError::new(
                        AlignmentErrorKind::MaterialProbe,
                        w,
                        w,
                        format!(
                            "joint {}: probe on {} expected material = {}",
                            joint.id, panel.id, probe.material
                        ),
                    )
                    .for_joint(joint),
                );
            }
        }
    }
}

fn check_voids(scene: &Scene, errors: &mut Vec<AlignmentError>) {
    let store = &scene.store;
    for assembly_id in store.assemblies_from(scene.root) {
        let Ok(assembly) = store.assembly(assembly_id) else {
            continue;
        };
        let t = assembly.thickness();
        for void_id in store.voids_of(assembly.root_void()) {
            let Ok(void) = store.void(void_id) else {
                continue;
            };
            let Some(split) = void.split() else {
                continue;
            };
            let children: Vec<_> = void
                .children()
                .iter()
                .filter_map(|c| store.void(*c).ok().map(|v| *v.bounds()))
                .collect();
            let ok = split.child_bounds(void.bounds(), t).is_ok_and(|expected| {
                expected.len() == children.len()
                    && expected.iter().zip(&children).all(|(e, c)| e.approx_eq(c))
            });
            if !ok {
                let origin = assembly.origin();
                errors.push(AlignmentError::new(
                    AlignmentErrorKind::VoidPartition,
                    origin + void.bounds().min.coords,
                    origin + void.bounds().max.coords,
                    format!("children of void {void_id:?} do not partition it"),
                ));
            }
        }
    }
}

fn check_dividers(scene: &Scene, panels: &[Panel], tolerance: f64, errors: &mut Vec<AlignmentError>) {
    for panel in panels {
        let PanelSource::Divider { void, key, position } = panel.source else {
            continue;
        };
        let Ok(assembly) = scene.store.assembly(panel.assembly) else {
            continue;
        };
        let in_split = scene
            .store
            .void(void)
            .ok()
            .and_then(|v| v.split())
            .is_some_and(|s| {
                s.dividers()
                    .iter()
                    .any(|(k, p)| *k == key && (p - position).abs() < TOLERANCE)
            });
        let axis: Axis = key.axis;
        let actual = panel.transform.translation.vector[axis.index()];
        let expected = assembly.origin()[axis.index()] + position;
        if !in_split || (actual - expected).abs() > tolerance {
            let mut a = Point3::from(panel.transform.translation.vector);
            let b = a;
            a[axis.index()] = expected;
            errors.push(AlignmentError {
                panel_a: Some(panel.id),
                ..AlignmentError::new(
                    AlignmentErrorKind::DividerPosition,
                    a,
                    b,
                    format!("divider {} is not at {axis} = {position}", panel.id),
                )
            });
        }
    }
}

fn check_nesting(scene: &Scene, errors: &mut Vec<AlignmentError>) {
    let store = &scene.store;
    for id in store.assemblies_from(scene.root) {
        let Ok(sub) = store.assembly(id) else {
            continue;
        };
        let Some(parent_void) = sub.parent_void() else {
            continue;
        };
        let Some((void, parent)) = store
            .void(parent_void)
            .ok()
            .and_then(|v| store.assembly(v.assembly()).ok().map(|a| (v, a)))
        else {
            errors.push(AlignmentError::new(
                AlignmentErrorKind::SubAssemblyNesting,
                sub.origin(),
                sub.origin(),
                format!("sub-assembly {id:?} has no parent void"),
            ));
            continue;
        };
        let c = sub.clearance();
        let offset = Vector3::new(c, c, c);
        let lo = parent.origin() + void.bounds().min.coords + offset;
        let hi = parent.origin() + void.bounds().max.coords - offset;
        let world = sub.world_bounds();
        if (world.min - lo).norm() > TOLERANCE || (world.max - hi).norm() > TOLERANCE {
            errors.push(AlignmentError::new(
                AlignmentErrorKind::SubAssemblyNesting,
                lo,
                world.min,
                format!("sub-assembly {id:?} does not fill its void"),
            ));
        }
    }
}
