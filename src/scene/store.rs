use slotmap::SlotMap;
use tracing::debug;

use super::{AssemblyId, AssemblyNode, PanelId, VoidId, VoidNode};
use crate::error::{Result, SceneError};
use crate::geometry::{Axis, Bounds3};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::panel::{derive_assembly, AssemblyDerived};
use crate::scene::SceneSettings;

/// Central arena that owns every assembly and void of a scene.
///
/// Nodes reference each other through slotmap keys, so cloning the store
/// yields a fully independent scene with identical keys and panel ids.
#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    pub(crate) assemblies: SlotMap<AssemblyId, AssemblyNode>,
    pub(crate) voids: SlotMap<VoidId, VoidNode>,
}

impl SceneStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Assembly operations ---

    /// Inserts an assembly together with its root void covering the
    /// assembly interior.
    pub(crate) fn add_assembly(&mut self, mut node: AssemblyNode) -> AssemblyId {
        let interior = node.interior_bounds();
        node.root_void = VoidId::default();
        let id = self.assemblies.insert(node);
        let root = self.voids.insert(VoidNode::new(id, None, interior));
        if let Some(node) = self.assemblies.get_mut(id) {
            node.root_void = root;
        }
        id
    }

    /// Returns a reference to the assembly, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` if the key is stale.
    pub fn assembly(&self, id: AssemblyId) -> Result<&AssemblyNode> {
        self.assemblies
            .get(id)
            .ok_or_else(|| SceneError::AssemblyNotFound(format!("{id:?}")).into())
    }

    /// Returns a mutable reference to the assembly, or an error if not
    /// found. Callers are responsible for marking the assembly dirty.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` if the key is stale.
    pub(crate) fn assembly_mut(&mut self, id: AssemblyId) -> Result<&mut AssemblyNode> {
        self.assemblies
            .get_mut(id)
            .ok_or_else(|| SceneError::AssemblyNotFound(format!("{id:?}")).into())
    }

    // --- Void operations ---

    /// Returns a reference to the void, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::VoidNotFound` if the key is stale.
    pub fn void(&self, id: VoidId) -> Result<&VoidNode> {
        self.voids
            .get(id)
            .ok_or_else(|| SceneError::VoidNotFound(format!("{id:?}")).into())
    }

    /// Returns a mutable reference to the void, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::VoidNotFound` if the key is stale.
    pub(crate) fn void_mut(&mut self, id: VoidId) -> Result<&mut VoidNode> {
        self.voids
            .get_mut(id)
            .ok_or_else(|| SceneError::VoidNotFound(format!("{id:?}")).into())
    }

    // --- Derived data ---

    /// Derived panels and joints of one assembly, memoized on the node.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` if the key is stale.
    pub fn assembly_derived(
        &self,
        id: AssemblyId,
        settings: &SceneSettings,
    ) -> Result<&AssemblyDerived> {
        let node = self.assembly(id)?;
        Ok(node
            .cache
            .get_or_init(|| derive_assembly(self, id, node, settings)))
    }

    /// Assemblies in depth-first order starting at `root`: each assembly is
    /// followed by the sub-assemblies nested in its voids.
    #[must_use]
    pub fn assemblies_from(&self, root: AssemblyId) -> Vec<AssemblyId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.assemblies.get(id) else {
                continue;
            };
            out.push(id);
            let mut nested: Vec<AssemblyId> = self
                .voids_of(node.root_void)
                .into_iter()
                .filter_map(|v| self.voids.get(v).and_then(VoidNode::sub_assembly))
                .collect();
            nested.reverse();
            stack.extend(nested);
        }
        out
    }

    /// Voids of the subtree rooted at `root`, parents before children.
    #[must_use]
    pub fn voids_of(&self, root: VoidId) -> Vec<VoidId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.voids.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    // --- Dirty tracking ---

    /// Clears the cached data of `id` and of every ancestor up to the
    /// scene root.
    pub(crate) fn mark_void_dirty(&mut self, id: VoidId) {
        let mut current = Some(id);
        let mut assembly = None;
        while let Some(v) = current {
            let Some(node) = self.voids.get_mut(v) else {
                break;
            };
            node.cache.invalidate();
            assembly = Some(node.assembly);
            current = node.parent;
        }
        if let Some(a) = assembly {
            self.mark_assembly_dirty(a);
        }
    }

    /// Clears the cached panels of `id`, then continues the walk through
    /// the void that holds it.
    pub(crate) fn mark_assembly_dirty(&mut self, id: AssemblyId) {
        let Some(node) = self.assemblies.get_mut(id) else {
            return;
        };
        node.cache.invalidate();
        if let Some(parent) = node.parent_void {
            self.mark_void_dirty(parent);
        }
    }

    // --- Identity ---

    /// Finds the assembly that owns `panel`, either as a face or as a
    /// divider in one of its voids.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::PanelNotFound` if no node knows the id.
    pub fn panel_owner(&self, panel: PanelId) -> Result<AssemblyId> {
        if let Some((id, _)) = self
            .assemblies
            .iter()
            .find(|(_, a)| a.face_ids.contains(&panel))
        {
            return Ok(id);
        }
        self.voids
            .values()
            .find(|v| v.divider_ids.values().any(|p| *p == panel))
            .map(|v| v.assembly)
            .ok_or_else(|| SceneError::PanelNotFound(panel.to_string()).into())
    }

    // --- Structural edits ---

    /// Removes the subtree below `id` (children, their sub-assemblies and
    /// any sub-assembly held by `id` itself) and returns the divider ids
    /// that disappeared with it.
    pub(crate) fn clear_void(&mut self, id: VoidId) -> Vec<PanelId> {
        let mut removed_panels = Vec::new();
        let (children, sub, dividers) = match self.voids.get_mut(id) {
            Some(node) => {
                let children = std::mem::take(&mut node.children);
                let sub = node.sub_assembly.take();
                let dividers = std::mem::take(&mut node.divider_ids);
                node.split = None;
                (children, sub, dividers)
            }
            None => return removed_panels,
        };
        removed_panels.extend(dividers.into_values());
        for child in children {
            removed_panels.extend(self.clear_void(child));
            self.voids.remove(child);
        }
        if let Some(sub) = sub {
            self.remove_assembly(sub);
        }
        self.mark_void_dirty(id);
        removed_panels
    }

    /// Removes an assembly and its whole void tree.
    pub(crate) fn remove_assembly(&mut self, id: AssemblyId) {
        let Some(root) = self.assemblies.get(id).map(|a| a.root_void) else {
            return;
        };
        self.clear_void(root);
        self.voids.remove(root);
        self.assemblies.remove(id);
    }

    /// Moves `id` to `bounds`, rescaling its split positions proportionally
    /// and refitting every descendant and nested assembly.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::InvalidSplit` when a child would become thinner
    /// than the material.
    pub(crate) fn relayout_void(&mut self, id: VoidId, bounds: Bounds3) -> Result<()> {
        let node = self.void(id)?;
        let old = node.bounds;
        let assembly = node.assembly;
        let thickness = self.assembly(assembly)?.thickness();

        let node = self.void_mut(id)?;
        node.bounds = bounds;
        if let Some(split) = node.split.as_mut() {
            split.rescale(&old, &bounds);
        }
        let split = node.split.clone();
        let children = node.children.clone();
        let sub = node.sub_assembly;
        node.cache.invalidate();

        if let Some(split) = split {
            let child_bounds = split.child_bounds(&bounds, thickness)?;
            for (child, b) in children.into_iter().zip(child_bounds) {
                self.relayout_void(child, b)?;
            }
        }
        if let Some(sub) = sub {
            self.fit_sub_assembly(sub)?;
        }
        Ok(())
    }

    /// Re-derives the outer size and world origin of a nested assembly from
    /// the void that holds it, then lays out its own voids again.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::InvalidDimensions` if the void leaves no room
    /// for the sub-assembly.
    pub(crate) fn fit_sub_assembly(&mut self, id: AssemblyId) -> Result<()> {
        let node = self.assembly(id)?;
        let Some(parent_void) = node.parent_void else {
            return Ok(());
        };
        let clearance = node.clearance;
        let thickness = node.thickness();
        let void = self.void(parent_void)?;
        let parent_origin = self.assembly(void.assembly)?.origin;
        let bounds = void.bounds;

        let dims = [
            bounds.size(Axis::X) - 2.0 * clearance,
            bounds.size(Axis::Y) - 2.0 * clearance,
            bounds.size(Axis::Z) - 2.0 * clearance,
        ];
        check_dims(dims, thickness)?;
        let origin = parent_origin
            + (bounds.min - Point3::origin())
            + Vector3::new(clearance, clearance, clearance);

        let node = self.assembly_mut(id)?;
        node.dims = dims;
        node.origin = origin;
        let root = node.root_void;
        let interior = node.interior_bounds();
        debug!(?dims, "sub-assembly refitted to its void");
        self.relayout_void(root, interior)?;
        self.mark_assembly_dirty(id);
        Ok(())
    }

    /// Lays the assembly's void tree out again after its dimensions,
    /// material or lid insets changed.
    ///
    /// # Errors
    ///
    /// Propagates split and sub-assembly fitting failures.
    pub(crate) fn relayout_assembly(&mut self, id: AssemblyId) -> Result<()> {
        let node = self.assembly(id)?;
        check_dims(node.dims, node.thickness())?;
        let root = node.root_void;
        let interior = node.interior_bounds();
        if (0..3).any(|i| interior.max[i] - interior.min[i] < TOLERANCE) {
            return Err(SceneError::InvalidDimensions(
                "lid insets leave no interior".into(),
            )
            .into());
        }
        self.relayout_void(root, interior)?;
        self.mark_assembly_dirty(id);
        Ok(())
    }

    // --- Comparison ---

    /// Compares two assembly trees structurally: dimensions, configuration,
    /// panel ids, void bounds and splits, and stored overrides. Slotmap keys
    /// and caches are ignored.
    #[must_use]
    pub fn assemblies_eq(&self, a: AssemblyId, other: &SceneStore, b: AssemblyId) -> bool {
        let (Some(x), Some(y)) = (self.assemblies.get(a), other.assemblies.get(b)) else {
            return false;
        };
        x.dims == y.dims
            && x.material == y.material
            && x.solid == y.solid
            && x.axis == y.axis
            && x.lids == y.lids
            && x.feet == y.feet
            && x.origin == y.origin
            && x.clearance == y.clearance
            && x.face_ids == y.face_ids
            && x.overrides == y.overrides
            && self.voids_eq(x.root_void, other, y.root_void)
    }

    fn voids_eq(&self, a: VoidId, other: &SceneStore, b: VoidId) -> bool {
        let (Some(x), Some(y)) = (self.voids.get(a), other.voids.get(b)) else {
            return false;
        };
        if x.bounds != y.bounds
            || x.split != y.split
            || x.divider_ids != y.divider_ids
            || x.children.len() != y.children.len()
        {
            return false;
        }
        let subs_eq = match (x.sub_assembly, y.sub_assembly) {
            (None, None) => true,
            (Some(sa), Some(sb)) => self.assemblies_eq(sa, other, sb),
            _ => false,
        };
        subs_eq
            && x
                .children
                .iter()
                .zip(&y.children)
                .all(|(ca, cb)| self.voids_eq(*ca, other, *cb))
    }
}

/// Checks that outer dimensions are finite and leave an interior.
///
/// # Errors
///
/// Returns `SceneError::InvalidDimensions` otherwise.
pub(crate) fn check_dims(dims: [f64; 3], thickness: f64) -> Result<()> {
    for (axis, d) in Axis::ALL.into_iter().zip(dims) {
        if !d.is_finite() || d <= 2.0 * thickness + TOLERANCE {
            return Err(SceneError::InvalidDimensions(format!(
                "{axis} dimension {d} must exceed twice the thickness {thickness}"
            ))
            .into());
        }
    }
    Ok(())
}
