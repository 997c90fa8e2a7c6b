//! Read-only exports of a scene.
//!
//! A [`SceneSnapshot`] mirrors the scene tree with every derived field
//! filled in and can rebuild an equal scene. The panel bridge is a flat list
//! for consumers that only need placed outlines.
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::finger::{FingerData, MaterialConfig};
use crate::geometry::{Axis, Bounds3};
use crate::math::{Point2, Point3};
use crate::panel::{Joint, Panel, PanelOverrides, PanelSource};
use crate::scene::store::check_dims;
use crate::scene::{
    AssemblyId, AssemblyNode, Cache, DividerKey, FeetConfig, Lids, PanelId, Scene, SceneSettings,
    SceneStore, Split, VoidId, VoidNode,
};
use crate::validate::AlignmentError;

/// A void and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidSnapshot {
    pub bounds: Bounds3,
    pub split: Option<Split>,
    pub dividers: Vec<(DividerKey, PanelId)>,
    pub children: Vec<VoidSnapshot>,
    pub sub_assembly: Option<Box<AssemblySnapshot>>,
}

/// An assembly with its configuration, void tree and derived panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblySnapshot {
    pub dims: [f64; 3],
    pub material: MaterialConfig,
    pub solid: [bool; 6],
    pub axis: Axis,
    pub lids: Lids,
    pub feet: Option<FeetConfig>,
    pub origin: Point3,
    pub clearance: f64,
    pub face_ids: [PanelId; 6],
    pub overrides: Vec<(PanelId, PanelOverrides)>,
    pub root_void: VoidSnapshot,
    /// Derived; ignored when rebuilding.
    pub finger: FingerData,
    /// Derived faces and dividers of this assembly; ignored when rebuilding.
    pub panels: Vec<Panel>,
    /// Derived; ignored when rebuilding.
    pub joints: Vec<Joint>,
}

/// Whole-scene export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub settings: SceneSettings,
    pub root: AssemblySnapshot,
    /// Derived; ignored when rebuilding.
    pub alignment_errors: Vec<AlignmentError>,
}

/// A placed panel for renderers and exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgePanel {
    pub id: PanelId,
    pub source: PanelSource,
    pub thickness: f64,
    pub width: f64,
    pub height: f64,
    pub outline: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
    /// Column-major 4x4 local-to-world matrix.
    pub matrix: [f64; 16],
}

impl Scene {
    /// Exports the scene tree with derived data.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` or `VoidNotFound` if the store
    /// references a missing node.
    pub fn snapshot(&self) -> Result<SceneSnapshot> {
        Ok(SceneSnapshot {
            settings: self.settings,
            root: self.assembly_snapshot(self.root)?,
            alignment_errors: self.alignment_errors().to_vec(),
        })
    }

    fn assembly_snapshot(&self, id: AssemblyId) -> Result<AssemblySnapshot> {
        let node = self.store.assembly(id)?;
        let derived = self.store.assembly_derived(id, &self.settings)?;
        Ok(AssemblySnapshot {
            dims: node.dims,
            material: node.material,
            solid: node.solid,
            axis: node.axis,
            lids: node.lids,
            feet: node.feet,
            origin: node.origin,
            clearance: node.clearance,
            face_ids: node.face_ids,
            overrides: node
                .overrides
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            root_void: self.void_snapshot(node.root_void)?,
            finger: derived.finger.clone(),
            panels: derived.panels.clone(),
            joints: derived.joints.clone(),
        })
    }

    fn void_snapshot(&self, id: VoidId) -> Result<VoidSnapshot> {
        let node = self.store.void(id)?;
        Ok(VoidSnapshot {
            bounds: node.bounds,
            split: node.split.clone(),
            dividers: node.divider_ids.iter().map(|(k, v)| (*k, *v)).collect(),
            children: node
                .children
                .iter()
                .map(|c| self.void_snapshot(*c))
                .collect::<Result<_>>()?,
            sub_assembly: node
                .sub_assembly
                .map(|a| self.assembly_snapshot(a).map(Box::new))
                .transpose()?,
        })
    }

    /// Rebuilds a scene from a snapshot. Panel ids are kept; derived fields
    /// in the snapshot are ignored and recomputed on first read.
    ///
    /// # Errors
    ///
    /// Returns an error if a material or dimension in the snapshot is
    /// invalid.
    pub fn from_snapshot(snapshot: &SceneSnapshot) -> Result<Scene> {
        let mut store = SceneStore::new();
        let root = insert_assembly(&mut store, &snapshot.root, None)?;
        Ok(Scene {
            store,
            root,
            settings: snapshot.settings,
            cache: Cache::new(),
        })
    }

    /// Every panel with its world matrix.
    #[must_use]
    pub fn panel_bridge(&self) -> Vec<BridgePanel> {
        self.panels()
            .iter()
            .map(|p| {
                let mut matrix = [0.0; 16];
                matrix.copy_from_slice(p.transform.to_homogeneous().as_slice());
                BridgePanel {
                    id: p.id,
                    source: p.source,
                    thickness: p.thickness,
                    width: p.width,
                    height: p.height,
                    outline: p.outline.clone(),
                    holes: p.holes.iter().map(|h| h.points.clone()).collect(),
                    matrix,
                }
            })
            .collect()
    }
}

fn insert_assembly(
    store: &mut SceneStore,
    snap: &AssemblySnapshot,
    parent_void: Option<VoidId>,
) -> Result<AssemblyId> {
    snap.material.validate()?;
    check_dims(snap.dims, snap.material.thickness)?;
    let mut node = AssemblyNode::new(snap.dims, snap.material);
    node.solid = snap.solid;
    node.axis = snap.axis;
    node.lids = snap.lids;
    node.feet = snap.feet;
    node.origin = snap.origin;
    node.clearance = snap.clearance;
    node.face_ids = snap.face_ids;
    node.parent_void = parent_void;
    node.overrides = snap.overrides.iter().cloned().collect();
    let id = store.add_assembly(node);
    let root = store.assembly(id)?.root_void;
    fill_void(store, root, &snap.root_void, id)?;
    Ok(id)
}

fn fill_void(store: &mut SceneStore, id: VoidId, snap: &VoidSnapshot, assembly: AssemblyId) -> Result<()> {
    let mut children = Vec::with_capacity(snap.children.len());
    for child in &snap.children {
        let child_id = store
            .voids
            .insert(VoidNode::new(assembly, Some(id), child.bounds));
        fill_void(store, child_id, child, assembly)?;
        children.push(child_id);
    }
    let sub = snap
        .sub_assembly
        .as_deref()
        .map(|s| insert_assembly(store, s, Some(id)))
        .transpose()?;
    let node = store.void_mut(id)?;
    node.bounds = snap.bounds;
    node.split = snap.split.clone();
    node.children = children;
    node.divider_ids = snap.dividers.iter().copied().collect();
    node.sub_assembly = sub;
    Ok(())
}
