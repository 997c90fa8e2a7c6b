//! Scene edits.
//!
//! Every edit is a small struct built with `new` and applied with
//! `execute(&mut Scene)`. Edits run against a clone of the scene; the clone
//! replaces the original only if the edit succeeds and introduces no
//! geometry problem that was not already there, so a rejected edit never
//! changes stored state.
pub mod assembly;
pub mod cutout;
pub mod edge;
pub mod fillet;
pub mod void;

pub use assembly::{
    SetAssemblyAxis, SetDimensions, SetFaceSolid, SetFeet, SetLidConfig, SetMaterial,
};
pub use cutout::{AddCutout, DeleteCutout, UpdateCutout};
pub use edge::{ClearCustomEdgePath, SetCustomEdgePath, SetEdgeExtension, SetEdgeExtensions};
pub use fillet::{SetAllCornerFillet, SetAllCornerFillets, SetCornerFillet, SetCornerFillets};
pub use void::{AddGridSubdivision, AddSubdivision, CreateSubAssembly, PurgeVoid, RemoveSubAssembly};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

use crate::error::{EditError, Result};
use crate::finger::MaterialConfig;
use crate::geometry::{Axis, Side};
use crate::panel::{CornerKey, Cutout, EdgePathPoint, PanelCorner, PanelEdge, PanelOverrides};
use crate::scene::{
    AssemblyId, CutoutId, FaceId, FeetConfig, GridCut, LidConfig, PanelId, Scene, VoidId,
};
use crate::validate::GeometryChecker;
use fillet::prune_stale_fillets;

/// Every edit a caller can request, as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    SetDimensions {
        assembly: AssemblyId,
        width: f64,
        height: f64,
        depth: f64,
    },
    SetMaterial {
        assembly: AssemblyId,
        material: MaterialConfig,
    },
    SetFaceSolid {
        assembly: AssemblyId,
        face: FaceId,
        solid: bool,
    },
    SetAssemblyAxis {
        assembly: AssemblyId,
        axis: Axis,
    },
    SetLidConfig {
        assembly: AssemblyId,
        side: Side,
        config: LidConfig,
    },
    SetFeet {
        assembly: AssemblyId,
        feet: Option<FeetConfig>,
    },
    AddSubdivision {
        void: VoidId,
        axis: Axis,
        position: f64,
    },
    AddGridSubdivision {
        void: VoidId,
        cuts: Vec<GridCut>,
    },
    PurgeVoid {
        void: VoidId,
    },
    CreateSubAssembly {
        void: VoidId,
        clearance: f64,
    },
    RemoveSubAssembly {
        void: VoidId,
    },
    SetEdgeExtension {
        panel: PanelId,
        edge: PanelEdge,
        amount: f64,
    },
    SetEdgeExtensions {
        panel: PanelId,
        extensions: Vec<(PanelEdge, f64)>,
    },
    SetCornerFillet {
        panel: PanelId,
        corner: PanelCorner,
        radius: f64,
    },
    SetCornerFillets {
        panel: PanelId,
        fillets: Vec<(PanelCorner, f64)>,
    },
    SetAllCornerFillet {
        panel: PanelId,
        corner: CornerKey,
        radius: f64,
    },
    SetAllCornerFillets {
        panel: PanelId,
        fillets: Vec<(CornerKey, f64)>,
    },
    SetCustomEdgePath {
        panel: PanelId,
        edge: PanelEdge,
        points: Vec<EdgePathPoint>,
    },
    ClearCustomEdgePath {
        panel: PanelId,
        edge: PanelEdge,
    },
    AddCutout {
        panel: PanelId,
        cutout: Cutout,
    },
    UpdateCutout {
        panel: PanelId,
        cutout: Cutout,
    },
    DeleteCutout {
        panel: PanelId,
        cutout: CutoutId,
    },
}

impl Action {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetDimensions { .. } => "set-dimensions",
            Action::SetMaterial { .. } => "set-material",
            Action::SetFaceSolid { .. } => "set-face-solid",
            Action::SetAssemblyAxis { .. } => "set-assembly-axis",
            Action::SetLidConfig { .. } => "set-lid-config",
            Action::SetFeet { .. } => "set-feet",
            Action::AddSubdivision { .. } => "add-subdivision",
            Action::AddGridSubdivision { .. } => "add-grid-subdivision",
            Action::PurgeVoid { .. } => "purge-void",
            Action::CreateSubAssembly { .. } => "create-sub-assembly",
            Action::RemoveSubAssembly { .. } => "remove-sub-assembly",
            Action::SetEdgeExtension { .. } => "set-edge-extension",
            Action::SetEdgeExtensions { .. } => "set-edge-extensions",
            Action::SetCornerFillet { .. } => "set-corner-fillet",
            Action::SetCornerFillets { .. } => "set-corner-fillets",
            Action::SetAllCornerFillet { .. } => "set-all-corner-fillet",
            Action::SetAllCornerFillets { .. } => "set-all-corner-fillets",
            Action::SetCustomEdgePath { .. } => "set-custom-edge-path",
            Action::ClearCustomEdgePath { .. } => "clear-custom-edge-path",
            Action::AddCutout { .. } => "add-cutout",
            Action::UpdateCutout { .. } => "update-cutout",
            Action::DeleteCutout { .. } => "delete-cutout",
        }
    }
}

impl Scene {
    /// Applies an action. On error the scene is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation.
    #[instrument(level = "debug", skip_all, fields(action = action.name()))]
    pub fn dispatch(&mut self, action: &Action) -> Result<()> {
        let result = match action {
            Action::SetDimensions {
                assembly,
                width,
                height,
                depth,
            } => SetDimensions::new(*assembly, *width, *height, *depth).execute(self),
            Action::SetMaterial { assembly, material } => {
                SetMaterial::new(*assembly, *material).execute(self)
            }
            Action::SetFaceSolid {
                assembly,
                face,
                solid,
            } => SetFaceSolid::new(*assembly, *face, *solid).execute(self),
            Action::SetAssemblyAxis { assembly, axis } => {
                SetAssemblyAxis::new(*assembly, *axis).execute(self)
            }
            Action::SetLidConfig {
                assembly,
                side,
                config,
            } => SetLidConfig::new(*assembly, *side, *config).execute(self),
            Action::SetFeet { assembly, feet } => SetFeet::new(*assembly, *feet).execute(self),
            Action::AddSubdivision {
                void,
                axis,
                position,
            } => AddSubdivision::new(*void, *axis, *position).execute(self),
            Action::AddGridSubdivision { void, cuts } => {
                AddGridSubdivision::new(*void, cuts.clone()).execute(self)
            }
            Action::PurgeVoid { void } => PurgeVoid::new(*void).execute(self),
            Action::CreateSubAssembly { void, clearance } => {
                CreateSubAssembly::new(*void, *clearance).execute(self)
            }
            Action::RemoveSubAssembly { void } => RemoveSubAssembly::new(*void).execute(self),
            Action::SetEdgeExtension {
                panel,
                edge,
                amount,
            } => SetEdgeExtension::new(*panel, *edge, *amount).execute(self),
            Action::SetEdgeExtensions { panel, extensions } => {
                SetEdgeExtensions::new(*panel, extensions.clone()).execute(self)
            }
            Action::SetCornerFillet {
                panel,
                corner,
                radius,
            } => SetCornerFillet::new(*panel, *corner, *radius).execute(self),
            Action::SetCornerFillets { panel, fillets } => {
                SetCornerFillets::new(*panel, fillets.clone()).execute(self)
            }
            Action::SetAllCornerFillet {
                panel,
                corner,
                radius,
            } => SetAllCornerFillet::new(*panel, *corner, *radius).execute(self),
            Action::SetAllCornerFillets { panel, fillets } => {
                SetAllCornerFillets::new(*panel, fillets.clone()).execute(self)
            }
            Action::SetCustomEdgePath {
                panel,
                edge,
                points,
            } => SetCustomEdgePath::new(*panel, *edge, points.clone()).execute(self),
            Action::ClearCustomEdgePath { panel, edge } => {
                ClearCustomEdgePath::new(*panel, *edge).execute(self)
            }
            Action::AddCutout { panel, cutout } => {
                AddCutout::new(*panel, cutout.clone()).execute(self)
            }
            Action::UpdateCutout { panel, cutout } => {
                UpdateCutout::new(*panel, cutout.clone()).execute(self)
            }
            Action::DeleteCutout { panel, cutout } => {
                DeleteCutout::new(*panel, *cutout).execute(self)
            }
        };
        match &result {
            Ok(()) => debug!("action applied"),
            Err(e) => warn!(error = %e, "action rejected"),
        }
        result
    }

    /// Runs `edit` on a clone and keeps the clone if the edit succeeds
    /// without adding geometry problems. Problems already present before the
    /// edit may stay or go; any new one rejects the edit.
    pub(crate) fn transact(&mut self, edit: impl FnOnce(&mut Scene) -> Result<()>) -> Result<()> {
        let before = GeometryChecker::new(self).check();
        let known: HashSet<(&str, Option<PanelId>, &str)> = before
            .violations
            .iter()
            .map(|v| (v.rule.as_str(), v.panel, v.message.as_str()))
            .collect();
        let mut next = self.clone();
        edit(&mut next)?;
        prune_stale_fillets(&mut next)?;
        let report = GeometryChecker::new(&next).check();
        if let Some(v) = report
            .violations
            .iter()
            .find(|v| !known.contains(&(v.rule.as_str(), v.panel, v.message.as_str())))
        {
            return Err(EditError::WouldInvalidateGeometry(format!("{}: {}", v.rule, v.message)).into());
        }
        *self = next;
        Ok(())
    }
}

/// Edits the stored overrides of `panel` and marks its assembly dirty.
/// Entries left empty are dropped.
pub(crate) fn edit_overrides<R>(
    scene: &mut Scene,
    panel: PanelId,
    edit: impl FnOnce(&mut PanelOverrides) -> R,
) -> Result<R> {
    let owner = scene.store.panel_owner(panel)?;
    let store = scene.store_mut();
    let node = store.assembly_mut(owner)?;
    let entry = node.overrides.entry(panel).or_default();
    let out = edit(entry);
    if entry.is_empty() {
        node.overrides.remove(&panel);
    }
    store.mark_assembly_dirty(owner);
    Ok(out)
}

/// Rejects non-finite numbers.
pub(crate) fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EditError::InvalidValue(format!("{name} must be finite, got {value}")).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FingerboxError;
    use crate::geometry::Bounds3;

    fn scene() -> Scene {
        Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap()
    }

    #[test]
    fn dispatch_applies_actions() {
        let mut s = scene();
        let root = s.root();
        s.dispatch(&Action::SetFaceSolid {
            assembly: root,
            face: FaceId::Top,
            solid: false,
        })
        .unwrap();
        assert_eq!(s.panels().len(), 5);
    }

    #[test]
    fn rejected_action_leaves_scene_unchanged() {
        let mut s = scene();
        let before = s.clone();
        let root = s.root();
        let err = s
            .dispatch(&Action::SetDimensions {
                assembly: root,
                width: 4.0,
                height: 80.0,
                depth: 60.0,
            })
            .unwrap_err();
        assert!(matches!(err, FingerboxError::Scene(_)));
        assert!(s.structurally_eq(&before));
    }

    /// Split scene whose first child void has been collapsed to zero width.
    /// Also returns the child's original bounds.
    fn scene_with_empty_child() -> (Scene, VoidId, VoidId, Bounds3) {
        let mut s = scene();
        let root = s.root_void();
        AddSubdivision::new(root, Axis::X, 50.0).execute(&mut s).unwrap();
        let children = s.void(root).unwrap().children().to_vec();
        let (a, b) = (children[0], children[1]);
        let original = *s.void(a).unwrap().bounds();
        collapse(&mut s, a);
        (s, a, b, original)
    }

    fn collapse(s: &mut Scene, void: VoidId) {
        let store = s.store_mut();
        let node = store.void_mut(void).unwrap();
        node.bounds.max.x = node.bounds.min.x;
        store.mark_void_dirty(void);
    }

    #[test]
    fn edit_trading_one_problem_for_another_is_rejected() {
        let (mut s, a, b, original) = scene_with_empty_child();
        assert!(!s.check_geometry().passed);
        let before = s.clone();

        let err = s
            .transact(|n| {
                let store = n.store_mut();
                store.void_mut(a).unwrap().bounds = original;
                store.mark_void_dirty(a);
                collapse(n, b);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(
            err,
            FingerboxError::Edit(EditError::WouldInvalidateGeometry(_))
        ));
        assert!(s.structurally_eq(&before));
    }

    #[test]
    fn edit_keeping_known_problems_is_accepted() {
        let (mut s, _, _, _) = scene_with_empty_child();
        let known = s.check_geometry().violations;
        let root = s.root();
        let feet = FeetConfig {
            height: 8.0,
            width: 10.0,
            inset: 5.0,
        };
        SetFeet::new(root, Some(feet)).execute(&mut s).unwrap();
        let after = s.check_geometry().violations;
        assert!(after.iter().all(|v| known.contains(v)));
    }

    #[test]
    fn actions_serialize() {
        let s = scene();
        let action = Action::AddSubdivision {
            void: s.root_void(),
            axis: Axis::X,
            position: 50.0,
        };
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
        assert_eq!(back.name(), "add-subdivision");
    }
}
