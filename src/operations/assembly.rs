use tracing::debug;

use super::check_finite;
use crate::error::{EditError, Result};
use crate::finger::MaterialConfig;
use crate::geometry::{Axis, Side};
use crate::scene::store::check_dims;
use crate::scene::{AssemblyId, FaceId, FeetConfig, LidConfig, Scene};

/// Resizes an assembly. Split positions scale proportionally and nested
/// assemblies are refitted.
pub struct SetDimensions {
    assembly: AssemblyId,
    dims: [f64; 3],
}

impl SetDimensions {
    #[must_use]
    pub fn new(assembly: AssemblyId, width: f64, height: f64, depth: f64) -> Self {
        Self {
            assembly,
            dims: [width, height, depth],
        }
    }

    /// # Errors
    ///
    /// Returns `SceneError::InvalidDimensions` if a dimension does not exceed
    /// twice the thickness, `EditError::InvalidValue` for a sub-assembly
    /// (its size follows its void) and `SceneError::InvalidSplit` if a child
    /// void would collapse.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| self.apply(s))
    }

    fn apply(&self, scene: &mut Scene) -> Result<()> {
        let node = scene.store.assembly(self.assembly)?;
        if node.parent_void().is_some() {
            return Err(EditError::InvalidValue(
                "a sub-assembly is sized by its void".into(),
            )
            .into());
        }
        check_dims(self.dims, node.thickness())?;
        let store = scene.store_mut();
        store.assembly_mut(self.assembly)?.dims = self.dims;
        store.relayout_assembly(self.assembly)?;
        debug!(dims = ?self.dims, "assembly resized");
        Ok(())
    }
}

/// Replaces an assembly's material. The finger width is clamped at
/// derivation, so the requested value is stored as given.
pub struct SetMaterial {
    assembly: AssemblyId,
    material: MaterialConfig,
}

impl SetMaterial {
    #[must_use]
    pub fn new(assembly: AssemblyId, material: MaterialConfig) -> Self {
        Self { assembly, material }
    }

    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` for a bad parameter and
    /// `SceneError::InvalidDimensions` if the thickness leaves no interior.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| self.apply(s))
    }

    fn apply(&self, scene: &mut Scene) -> Result<()> {
        self.material.validate()?;
        let dims = scene.store.assembly(self.assembly)?.dims();
        check_dims(dims, self.material.thickness)?;
        let store = scene.store_mut();
        store.assembly_mut(self.assembly)?.material = self.material;
        store.relayout_assembly(self.assembly)
    }
}

/// Enables or disables one face.
pub struct SetFaceSolid {
    assembly: AssemblyId,
    face: FaceId,
    solid: bool,
}

impl SetFaceSolid {
    #[must_use]
    pub fn new(assembly: AssemblyId, face: FaceId, solid: bool) -> Self {
        Self {
            assembly,
            face,
            solid,
        }
    }

    /// # Errors
    ///
    /// Returns `SceneError::AssemblyNotFound` for a stale key.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| self.apply(s))
    }

    fn apply(&self, scene: &mut Scene) -> Result<()> {
        let store = scene.store_mut();
        store.assembly_mut(self.assembly)?.solid[self.face.index()] = self.solid;
        store.mark_assembly_dirty(self.assembly);
        Ok(())
    }
}

/// Chooses which face pair are the lids.
pub struct SetAssemblyAxis {
    assembly: AssemblyId,
    axis: Axis,
}

impl SetAssemblyAxis {
    #[must_use]
    pub fn new(assembly: AssemblyId, axis: Axis) -> Self {
        Self { assembly, axis }
    }

    /// # Errors
    ///
    /// Fails if the lid insets leave no interior on the new axis.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| self.apply(s))
    }

    fn apply(&self, scene: &mut Scene) -> Result<()> {
        let store = scene.store_mut();
        store.assembly_mut(self.assembly)?.axis = self.axis;
        store.relayout_assembly(self.assembly)
    }
}

/// Sets tab direction and inset of one lid.
pub struct SetLidConfig {
    assembly: AssemblyId,
    side: Side,
    config: LidConfig,
}

impl SetLidConfig {
    #[must_use]
    pub fn new(assembly: AssemblyId, side: Side, config: LidConfig) -> Self {
        Self {
            assembly,
            side,
            config,
        }
    }

    /// # Errors
    ///
    /// Returns `EditError::InvalidValue` for a negative inset and
    /// `SceneError::InvalidDimensions` if the insets leave no interior.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| self.apply(s))
    }

    fn apply(&self, scene: &mut Scene) -> Result<()> {
        check_finite("inset", self.config.inset)?;
        if self.config.inset < 0.0 {
            return Err(EditError::InvalidValue(format!(
                "lid inset must not be negative, got {}",
                self.config.inset
            ))
            .into());
        }
        let store = scene.store_mut();
        *store.assembly_mut(self.assembly)?.lids.get_mut(self.side) = self.config;
        store.relayout_assembly(self.assembly)
    }
}

/// Adds, changes or removes feet.
pub struct SetFeet {
    assembly: AssemblyId,
    feet: Option<FeetConfig>,
}

impl SetFeet {
    #[must_use]
    pub fn new(assembly: AssemblyId, feet: Option<FeetConfig>) -> Self {
        Self { assembly, feet }
    }

    /// # Errors
    ///
    /// Returns `EditError::InvalidValue` unless `height` exceeds the
    /// thickness, `width` is positive and `inset` is not negative.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| self.apply(s))
    }

    fn apply(&self, scene: &mut Scene) -> Result<()> {
        if let Some(feet) = &self.feet {
            let t = scene.store.assembly(self.assembly)?.thickness();
            check_finite("feet height", feet.height)?;
            check_finite("feet width", feet.width)?;
            check_finite("feet inset", feet.inset)?;
            if feet.height <= t || feet.width <= 0.0 || feet.inset < 0.0 {
                return Err(EditError::InvalidValue(format!(
                    "feet need height > {t}, width > 0 and inset >= 0"
                ))
                .into());
            }
        }
        let store = scene.store_mut();
        store.assembly_mut(self.assembly)?.feet = self.feet;
        store.mark_assembly_dirty(self.assembly);
        Ok(())
    }
}
