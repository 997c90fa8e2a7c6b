use std::collections::BTreeMap;

use tracing::debug;

use super::check_finite;
use crate::error::{EditError, Result, SceneError};
use crate::geometry::{Axis, Bounds3};
use crate::math::{Point3, Vector3};
use crate::scene::store::check_dims;
use crate::scene::{AssemblyNode, GridCut, PanelId, Scene, Split, VoidId, VoidNode};

/// Checks that `void` can take a split or a sub-assembly.
fn require_empty_leaf(scene: &Scene, void: VoidId) -> Result<()> {
    let node = scene.store.void(void)?;
    if !node.is_leaf() {
        return Err(SceneError::VoidNotLeaf(format!("{void:?}")).into());
    }
    if node.sub_assembly().is_some() {
        return Err(SceneError::VoidHasSubAssembly(format!("{void:?}")).into());
    }
    Ok(())
}

/// Splits a leaf void, creating its children and a fresh divider id per
/// divider.
fn apply_split(scene: &mut Scene, void: VoidId, split: Split) -> Result<()> {
    require_empty_leaf(scene, void)?;
    let node = scene.store.void(void)?;
    let assembly = node.assembly();
    let thickness = scene.store.assembly(assembly)?.thickness();
    let children = split.child_bounds(node.bounds(), thickness)?;
    let divider_ids: BTreeMap<_, _> = split
        .dividers()
        .into_iter()
        .map(|(key, _)| (key, PanelId::generate()))
        .collect();

    let store = scene.store_mut();
    let child_ids: Vec<VoidId> = children
        .into_iter()
        .map(|bounds| store.voids.insert(VoidNode::new(assembly, Some(void), bounds)))
        .collect();
    let node = store.void_mut(void)?;
    debug!(
        children = child_ids.len(),
        dividers = divider_ids.len(),
        "void split"
    );
    node.split = Some(split);
    node.children = child_ids;
    node.divider_ids = divider_ids;
    store.mark_void_dirty(void);
    Ok(())
}

/// Splits a leaf void with one divider.
pub struct AddSubdivision {
    void: VoidId,
    axis: Axis,
    position: f64,
}

impl AddSubdivision {
    /// `position` is in the owning assembly's frame.
    #[must_use]
    pub fn new(void: VoidId, axis: Axis, position: f64) -> Self {
        Self {
            void,
            axis,
            position,
        }
    }

    /// # Errors
    ///
    /// Returns `SceneError::VoidNotLeaf` or `SceneError::VoidHasSubAssembly`
    /// for an occupied void and `SceneError::InvalidSplit` if either child
    /// would be thinner than the material.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            apply_split(
                s,
                self.void,
                Split::Single {
                    axis: self.axis,
                    position: self.position,
                },
            )
        })
    }
}

/// Splits a leaf void with full-span dividers on one or two axes.
pub struct AddGridSubdivision {
    void: VoidId,
    cuts: Vec<GridCut>,
}

impl AddGridSubdivision {
    #[must_use]
    pub fn new(void: VoidId, cuts: Vec<GridCut>) -> Self {
        Self { void, cuts }
    }

    /// # Errors
    ///
    /// Same as [`AddSubdivision::execute`]; also rejects more than two axes
    /// or a repeated axis.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let mut cuts = self.cuts.clone();
            for cut in &mut cuts {
                cut.positions.sort_by(f64::total_cmp);
            }
            apply_split(s, self.void, Split::Grid { cuts })
        })
    }
}

/// Removes everything below a void: its split, child voids, dividers and
/// any sub-assembly. Overrides stored for removed dividers are dropped.
pub struct PurgeVoid {
    void: VoidId,
}

impl PurgeVoid {
    #[must_use]
    pub fn new(void: VoidId) -> Self {
        Self { void }
    }

    /// # Errors
    ///
    /// Returns `SceneError::VoidNotFound` for a stale key.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let assembly = s.store.void(self.void)?.assembly();
            let store = s.store_mut();
            let removed = store.clear_void(self.void);
            let node = store.assembly_mut(assembly)?;
            for id in &removed {
                node.overrides.remove(id);
            }
            debug!(dividers = removed.len(), "void purged");
            Ok(())
        })
    }
}

/// Fills a leaf void with a nested assembly, shrunk by `clearance` on every
/// side. The nested assembly starts with the parent's material.
pub struct CreateSubAssembly {
    void: VoidId,
    clearance: f64,
}

impl CreateSubAssembly {
    #[must_use]
    pub fn new(void: VoidId, clearance: f64) -> Self {
        Self { void, clearance }
    }

    /// # Errors
    ///
    /// Returns `EditError::InvalidValue` for a negative clearance,
    /// `SceneError::VoidNotLeaf`/`VoidHasSubAssembly` for an occupied void
    /// and `SceneError::InvalidDimensions` if the void is too small.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| self.apply(s))
    }

    fn apply(&self, scene: &mut Scene) -> Result<()> {
        check_finite("clearance", self.clearance)?;
        if self.clearance < 0.0 {
            return Err(EditError::InvalidValue(format!(
                "clearance must not be negative, got {}",
                self.clearance
            ))
            .into());
        }
        require_empty_leaf(scene, self.void)?;
        let void = scene.store.void(self.void)?;
        let bounds: Bounds3 = *void.bounds();
        let parent = scene.store.assembly(void.assembly())?;
        let material = *parent.material();
        let c = self.clearance;
        let dims = [
            bounds.size(Axis::X) - 2.0 * c,
            bounds.size(Axis::Y) - 2.0 * c,
            bounds.size(Axis::Z) - 2.0 * c,
        ];
        check_dims(dims, material.thickness)?;

        let mut node = AssemblyNode::new(dims, material);
        node.parent_void = Some(self.void);
        node.clearance = c;
        node.origin = parent.origin() + (bounds.min - Point3::origin()) + Vector3::new(c, c, c);

        let store = scene.store_mut();
        let id = store.add_assembly(node);
        store.void_mut(self.void)?.sub_assembly = Some(id);
        store.fit_sub_assembly(id)?;
        store.mark_void_dirty(self.void);
        debug!(?dims, "sub-assembly created");
        Ok(())
    }
}

/// Removes the nested assembly held by a void.
pub struct RemoveSubAssembly {
    void: VoidId,
}

impl RemoveSubAssembly {
    #[must_use]
    pub fn new(void: VoidId) -> Self {
        Self { void }
    }

    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` if the void holds none.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let sub = s
                .store
                .void(self.void)?
                .sub_assembly()
                .ok_or_else(|| SceneError::AssemblyNotFound(format!("in void {:?}", self.void)))?;
            let store = s.store_mut();
            store.void_mut(self.void)?.sub_assembly = None;
            store.remove_assembly(sub);
            store.mark_void_dirty(self.void);
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FingerboxError;
    use crate::finger::MaterialConfig;
    use crate::operations::SetEdgeExtension;
    use crate::panel::{JointKind, PanelEdge};
    use crate::scene::FaceId;

    fn scene() -> Scene {
        Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap()
    }

    #[test]
    fn single_split_adds_a_divider() {
        let mut s = scene();
        let root = s.root_void();
        AddSubdivision::new(root, Axis::X, 50.0).execute(&mut s).unwrap();
        assert_eq!(s.panels().len(), 7);
        assert_eq!(s.void(root).unwrap().children().len(), 2);
        assert!(s.alignment_errors().is_empty(), "{:?}", s.alignment_errors());
    }

    #[test]
    fn split_of_split_void_is_rejected() {
        let mut s = scene();
        let root = s.root_void();
        AddSubdivision::new(root, Axis::X, 50.0).execute(&mut s).unwrap();
        let err = AddSubdivision::new(root, Axis::Z, 30.0)
            .execute(&mut s)
            .unwrap_err();
        assert!(matches!(err, FingerboxError::Scene(SceneError::VoidNotLeaf(_))));
    }

    #[test]
    fn split_too_close_to_wall_is_rejected() {
        let mut s = scene();
        let root = s.root_void();
        assert!(AddSubdivision::new(root, Axis::X, 5.0).execute(&mut s).is_err());
        assert!(s.void(root).unwrap().is_leaf());
    }

    #[test]
    fn grid_split_crosses_dividers() {
        let mut s = scene();
        let root = s.root_void();
        let cuts = vec![
            GridCut {
                axis: Axis::X,
                positions: vec![50.0],
            },
            GridCut {
                axis: Axis::Z,
                positions: vec![30.0],
            },
        ];
        AddGridSubdivision::new(root, cuts).execute(&mut s).unwrap();
        assert_eq!(s.panels().len(), 8);
        assert_eq!(s.void(root).unwrap().children().len(), 4);
        assert!(s.joints().iter().any(|j| j.kind == JointKind::CrossLap));
        assert!(s.alignment_errors().is_empty());
    }

    #[test]
    fn purge_drops_dividers_and_their_overrides() {
        let mut s = scene();
        let root = s.root_void();
        AddSubdivision::new(root, Axis::X, 50.0).execute(&mut s).unwrap();
        let divider = s.divider_panel(root, Axis::X, 0).unwrap().id;
        // Divider top edge is open because the lid is off.
        let asm = s.root();
        crate::operations::SetFaceSolid::new(asm, FaceId::Top, false)
            .execute(&mut s)
            .unwrap();
        SetEdgeExtension::new(divider, PanelEdge::Top, 5.0)
            .execute(&mut s)
            .unwrap();
        assert!(s.overrides(divider).is_some());

        PurgeVoid::new(root).execute(&mut s).unwrap();
        assert_eq!(s.panels().len(), 5);
        assert!(s.void(root).unwrap().is_leaf());
        assert!(s.overrides(divider).is_none());
        assert!(s.store().assembly(asm).unwrap().overrides.is_empty());
    }

    #[test]
    fn sub_assembly_fills_its_void() {
        let mut s = scene();
        let root = s.root_void();
        AddSubdivision::new(root, Axis::X, 50.0).execute(&mut s).unwrap();
        let left = s.void(root).unwrap().children()[0];
        CreateSubAssembly::new(left, 1.0).execute(&mut s).unwrap();

        let sub = s.void(left).unwrap().sub_assembly().unwrap();
        let node = s.assembly(sub).unwrap();
        // Left child spans x 3..48.5.
        assert!((node.width() - 43.5).abs() < 1e-9);
        assert!((node.origin().x - 4.0).abs() < 1e-9);
        assert_eq!(s.panels().len(), 13);
        assert!(s.alignment_errors().is_empty(), "{:?}", s.alignment_errors());

        RemoveSubAssembly::new(left).execute(&mut s).unwrap();
        assert_eq!(s.panels().len(), 7);
        assert!(s.assembly(sub).is_err());
    }

    #[test]
    fn sub_assembly_needs_a_leaf() {
        let mut s = scene();
        let root = s.root_void();
        AddSubdivision::new(root, Axis::X, 50.0).execute(&mut s).unwrap();
        assert!(CreateSubAssembly::new(root, 1.0).execute(&mut s).is_err());
        let left = s.void(root).unwrap().children()[0];
        CreateSubAssembly::new(left, 1.0).execute(&mut s).unwrap();
        assert!(AddSubdivision::new(left, Axis::Y, 40.0).execute(&mut s).is_err());
    }
}
