//! Scene graph: assemblies, voids and the derived panel list.
pub mod assembly;
pub mod cache;
pub mod ids;
pub mod store;
pub mod void;

pub use assembly::{AssemblyNode, FaceId, FeetConfig, LidConfig, Lids, TabDirection};
pub use cache::Cache;
pub use ids::{AssemblyId, CutoutId, PanelId, VoidId};
pub use store::SceneStore;
pub use void::{DividerKey, DividerLayout, GridCut, Split, VoidNode};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, SceneError};
use crate::finger::{FingerData, MaterialConfig};
use crate::geometry::Axis;
use crate::panel::{CornerInfo, Joint, Panel, PanelOverrides, SafeSpace};
use crate::validate::{validate_alignment, AlignmentError};

/// Scene-wide derivation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    /// Chords used to approximate each fillet arc.
    pub fillet_segments: usize,
    /// Maximum world-space deviation between mating anchors (mm).
    pub alignment_tolerance: f64,
    /// Corners whose largest fillet is below this radius are ineligible.
    pub min_fillet_radius: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            fillet_segments: 8,
            alignment_tolerance: 1e-6,
            min_fillet_radius: 0.1,
        }
    }
}

/// Everything derived from the scene as a whole.
#[derive(Debug, Clone, Default)]
pub struct SceneDerived {
    pub panels: Vec<Panel>,
    pub joints: Vec<Joint>,
    pub alignment_errors: Vec<AlignmentError>,
    index: HashMap<PanelId, usize>,
}

/// A complete enclosure design: the root assembly, its nested voids and
/// sub-assemblies, and lazily derived panels.
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) store: SceneStore,
    pub(crate) root: AssemblyId,
    pub(crate) settings: SceneSettings,
    pub(crate) cache: Cache<SceneDerived>,
}

impl Scene {
    /// Creates a scene holding one closed box.
    ///
    /// # Errors
    ///
    /// Returns an error if the material is invalid or a dimension does not
    /// exceed twice the thickness.
    pub fn new(width: f64, height: f64, depth: f64, material: MaterialConfig) -> Result<Self> {
        material.validate()?;
        store::check_dims([width, height, depth], material.thickness)?;
        let mut store = SceneStore::new();
        let root = store.add_assembly(AssemblyNode::new([width, height, depth], material));
        Ok(Self {
            store,
            root,
            settings: SceneSettings::default(),
            cache: Cache::new(),
        })
    }

    /// Replaces the derivation settings. All derived data is recomputed.
    pub fn set_settings(&mut self, settings: SceneSettings) {
        self.settings = settings;
        for node in self.store.assemblies.values_mut() {
            node.cache.invalidate();
        }
        self.cache.invalidate();
    }

    #[must_use]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Root assembly.
    #[must_use]
    pub fn root(&self) -> AssemblyId {
        self.root
    }

    #[must_use]
    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Mutable access to the store. Drops the scene-level cache; node
    /// caches are cleared by the store's dirty walk.
    pub(crate) fn store_mut(&mut self) -> &mut SceneStore {
        self.cache.invalidate();
        &mut self.store
    }

    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` for a stale key.
    pub fn assembly(&self, id: AssemblyId) -> Result<&AssemblyNode> {
        self.store.assembly(id)
    }

    /// # Errors
    ///
    /// Returns `SceneError::VoidNotFound` for a stale key.
    pub fn void(&self, id: VoidId) -> Result<&VoidNode> {
        self.store.void(id)
    }

    /// Root void of the root assembly.
    #[must_use]
    pub fn root_void(&self) -> VoidId {
        self.store
            .assemblies
            .get(self.root)
            .map(AssemblyNode::root_void)
            .unwrap_or_default()
    }

    fn derived(&self) -> &SceneDerived {
        self.cache.get_or_init(|| {
            let mut derived = SceneDerived::default();
            for id in self.store.assemblies_from(self.root) {
                if let Ok(a) = self.store.assembly_derived(id, &self.settings) {
                    derived.panels.extend(a.panels.iter().cloned());
                    derived.joints.extend(a.joints.iter().cloned());
                }
            }
            derived.index = derived
                .panels
                .iter()
                .enumerate()
                .map(|(i, p)| (p.id, i))
                .collect();
            derived.alignment_errors = validate_alignment(self, &derived.panels, &derived.joints);
            derived
        })
    }

    /// Every panel of the scene: the root assembly's faces and dividers
    /// followed by those of nested assemblies.
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.derived().panels
    }

    /// # Errors
    ///
    /// Returns `SceneError::PanelNotFound` if no current panel has the id.
    pub fn panel(&self, id: PanelId) -> Result<&Panel> {
        let derived = self.derived();
        derived
            .index
            .get(&id)
            .and_then(|&i| derived.panels.get(i))
            .ok_or_else(|| SceneError::PanelNotFound(id.to_string()).into())
    }

    /// Panel of an assembly face.
    ///
    /// # Errors
    ///
    /// Fails if the assembly is unknown or the face is disabled.
    pub fn face_panel(&self, assembly: AssemblyId, face: FaceId) -> Result<&Panel> {
        let id = self.assembly(assembly)?.face_panel_id(face);
        self.panel(id)
    }

    /// Divider produced by `void`'s split.
    ///
    /// # Errors
    ///
    /// Fails if the void is unknown or has no such divider.
    pub fn divider_panel(&self, void: VoidId, axis: Axis, index: usize) -> Result<&Panel> {
        let id = self
            .void(void)?
            .divider_id(axis, index)
            .ok_or_else(|| SceneError::PanelNotFound(format!("divider {axis}[{index}]")))?;
        self.panel(id)
    }

    /// Every joint between panels of the scene.
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.derived().joints
    }

    /// Alignment problems found by the last derivation.
    #[must_use]
    pub fn alignment_errors(&self) -> &[AlignmentError] {
        &self.derived().alignment_errors
    }

    /// Finger patterns of an assembly.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` for a stale key.
    pub fn finger_data(&self, assembly: AssemblyId) -> Result<&FingerData> {
        Ok(&self.store.assembly_derived(assembly, &self.settings)?.finger)
    }

    /// # Errors
    ///
    /// Returns `SceneError::PanelNotFound` if no current panel has the id.
    pub fn safe_space(&self, panel: PanelId) -> Result<&SafeSpace> {
        Ok(&self.panel(panel)?.safe_space)
    }

    /// Detected corners of a panel.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::PanelNotFound` if no current panel has the id.
    pub fn corners(&self, panel: PanelId) -> Result<&[CornerInfo]> {
        Ok(&self.panel(panel)?.corners)
    }

    /// Stored edits of a panel, if any.
    #[must_use]
    pub fn overrides(&self, panel: PanelId) -> Option<&PanelOverrides> {
        let owner = self.store.panel_owner(panel).ok()?;
        self.store.assemblies.get(owner)?.overrides(panel)
    }

    /// Compares structure, ids and stored edits with another scene.
    #[must_use]
    pub fn structurally_eq(&self, other: &Scene) -> bool {
        self.settings == other.settings
            && self.store.assemblies_eq(self.root, &other.store, other.root)
    }

    /// Returns `true` while derived panels are cached.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.cache.is_valid()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap()
    }

    #[test]
    fn new_scene_has_six_faces() {
        let s = scene();
        assert_eq!(s.panels().len(), 6);
        assert!(s.is_derived());
        assert!(s.face_panel(s.root(), FaceId::Front).is_ok());
    }

    #[test]
    fn rejects_box_thinner_than_material() {
        assert!(Scene::new(5.0, 80.0, 60.0, MaterialConfig::default()).is_err());
        assert!(Scene::new(100.0, 80.0, 60.0, MaterialConfig::new(0.0, 10.0, 1.5)).is_err());
    }

    #[test]
    fn reads_are_memoized_until_mutation() {
        let mut s = scene();
        let first = s.panels().as_ptr();
        assert_eq!(first, s.panels().as_ptr());
        let root = s.root();
        s.store_mut().mark_assembly_dirty(root);
        assert!(!s.is_derived());
        assert_eq!(s.panels().len(), 6);
    }

    #[test]
    fn new_settings_rederive() {
        let mut s = scene();
        let _ = s.panels();
        let settings = SceneSettings {
            fillet_segments: 16,
            ..SceneSettings::default()
        };
        s.set_settings(settings);
        assert!(!s.is_derived());
        assert_eq!(s.settings().fillet_segments, 16);
        assert_eq!(s.panels().len(), 6);
    }

    #[test]
    fn clone_is_structurally_equal() {
        let s = scene();
        let _ = s.panels();
        let c = s.clone();
        assert!(s.structurally_eq(&c));
        assert!(!s.structurally_eq(&scene()));
    }
}
