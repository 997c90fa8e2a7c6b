use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Axis;
use crate::math::polygon_2d::{check_non_degenerate, is_simple, polygon_inside, signed_area_2d};
use crate::math::TOLERANCE;
use crate::scene::{PanelId, Scene};
use crate::validate::AlignmentErrorKind;

/// Root voids must equal the assembly interior (dimensions minus two
/// material thicknesses and any lid insets).
pub const RULE_VOID_BOUNDS: &str = "void-bounds-2mt";
pub const RULE_VOID_PARTITION: &str = "void-partition";
pub const RULE_FINGER_MINIMUM: &str = "finger-3-section-minimum";
pub const RULE_WINDING: &str = "path-winding-order";
pub const RULE_HOLES_INSIDE: &str = "holes-inside-outline";
pub const RULE_DEGENERATE: &str = "no-degenerate-paths";
pub const RULE_SELF_INTERSECTION: &str = "outline-self-intersection";
pub const RULE_JOINT_ALIGNMENT: &str = "joint-alignment";
pub const RULE_NESTING: &str = "sub-assembly-nesting";

/// A broken rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: String,
    pub message: String,
    pub panel: Option<PanelId>,
}

/// Result of a full geometry check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub passed: bool,
    pub violations: Vec<RuleViolation>,
}

impl CheckReport {
    /// Violations of one rule.
    pub fn violations_of<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a RuleViolation> + 'a {
        self.violations.iter().filter(move |v| v.rule == rule)
    }
}

/// On-demand diagnostic pass over a scene.
pub struct GeometryChecker<'a> {
    scene: &'a Scene,
    violations: Vec<RuleViolation>,
}

impl<'a> GeometryChecker<'a> {
    #[must_use]
    pub fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            violations: Vec::new(),
        }
    }

    /// Runs every rule and returns the report.
    #[must_use]
    pub fn check(mut self) -> CheckReport {
        self.check_voids();
        self.check_fingers();
        self.check_panels();
        self.check_alignment();
        debug!(violations = self.violations.len(), "geometry check finished");
        CheckReport {
            passed: self.violations.is_empty(),
            violations: self.violations,
        }
    }

    fn push(&mut self, rule: &str, message: String, panel: Option<PanelId>) {
        self.violations.push(RuleViolation {
            rule: rule.to_string(),
            message,
            panel,
        });
    }

    fn check_voids(&mut self) {
        let scene = self.scene;
        let store = scene.store();
        for id in store.assemblies_from(scene.root()) {
            let Ok(assembly) = store.assembly(id) else {
                continue;
            };
            let Ok(root) = store.void(assembly.root_void()) else {
                self.push(RULE_VOID_BOUNDS, format!("assembly {id:?} has no root void"), None);
                continue;
            };
            if !root.bounds().approx_eq(&assembly.interior_bounds()) {
                self.push(
                    RULE_VOID_BOUNDS,
                    format!("root void of {id:?} does not match the assembly interior"),
                    None,
                );
            }
            for void_id in store.voids_of(assembly.root_void()) {
                let Ok(void) = store.void(void_id) else {
                    continue;
                };
                let b = void.bounds();
                if Axis::ALL.iter().any(|&a| b.size(a) <= TOLERANCE) {
                    self.push(RULE_VOID_BOUNDS, format!("void {void_id:?} is empty"), None);
                }
            }
        }
    }

    fn check_fingers(&mut self) {
        let scene = self.scene;
        for id in scene.store().assemblies_from(scene.root()) {
            let Ok(finger) = scene.finger_data(id) else {
                continue;
            };
            let short: Vec<_> = [&finger.x, &finger.y, &finger.z]
                .into_iter()
                .filter(|p| p.section_count() < 3)
                .map(|p| (p.axis, p.section_count()))
                .collect();
            for (axis, count) in short {
                self.push(
                    RULE_FINGER_MINIMUM,
                    format!("assembly {id:?} axis {axis} has {count} finger sections"),
                    None,
                );
            }
        }
    }

    fn check_panels(&mut self) {
        let scene = self.scene;
        for panel in scene.panels() {
            let id = Some(panel.id);
            if let Err(e) = check_non_degenerate(&panel.outline) {
                self.push(RULE_DEGENERATE, format!("outline: {e}"), id);
                continue;
            }
            if signed_area_2d(&panel.outline) <= 0.0 {
                self.push(RULE_WINDING, "outline is not counter-clockwise".into(), id);
            }
            if !is_simple(&panel.outline) {
                self.push(RULE_SELF_INTERSECTION, "outline intersects itself".into(), id);
            }
            for (i, hole) in panel.holes.iter().enumerate() {
                if let Err(e) = check_non_degenerate(&hole.points) {
                    self.push(RULE_DEGENERATE, format!("hole {i}: {e}"), id);
                    continue;
                }
                if signed_area_2d(&hole.points) >= 0.0 {
                    self.push(RULE_WINDING, format!("hole {i} is not clockwise"), id);
                }
                if !polygon_inside(&hole.points, &panel.outline) {
                    self.push(RULE_HOLES_INSIDE, format!("hole {i} leaves the outline"), id);
                }
            }
        }
    }

    fn check_alignment(&mut self) {
        let scene = self.scene;
        for e in scene.alignment_errors() {
            let rule = match e.kind {
                AlignmentErrorKind::VoidPartition => RULE_VOID_PARTITION,
                AlignmentErrorKind::SubAssemblyNesting => RULE_NESTING,
                _ => RULE_JOINT_ALIGNMENT,
            };
            self.push(rule, e.message.clone(), e.panel_a);
        }
    }
}

impl Scene {
    /// Runs every geometry rule over the scene.
    #[must_use]
    pub fn check_geometry(&self) -> CheckReport {
        GeometryChecker::new(self).check()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::finger::MaterialConfig;

    #[test]
    fn closed_box_passes() {
        let scene = Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap();
        let report = scene.check_geometry();
        assert!(report.passed, "{:?}", report.violations);
    }

    #[test]
    fn broken_partition_is_reported() {
        let mut scene = Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap();
        let root = scene.root_void();
        crate::operations::AddSubdivision::new(root, Axis::X, 50.0)
            .execute(&mut scene)
            .unwrap();
        let child = scene.void(root).unwrap().children()[0];
        let store = scene.store_mut();
        store.void_mut(child).unwrap().bounds.max.x += 5.0;
        store.mark_void_dirty(child);
        let report = GeometryChecker::new(&scene).check();
        assert!(!report.passed);
        assert!(report.violations_of(RULE_VOID_PARTITION).count() >= 1);
    }
}
