use super::edit_overrides;
use crate::error::{EditError, GeometryError, Result, SceneError};
use crate::geometry::{boolean_2d, BooleanOp};
use crate::panel::{Cutout, CutoutMode, Panel};
use crate::scene::{CutoutId, PanelId, Scene};

/// Checks a cutout against the panel it goes on.
fn check_cutout(panel: &Panel, cutout: &Cutout) -> Result<()> {
    cutout.validate()?;
    let contour = cutout.contour();
    if let Some(region) = panel
        .forbidden
        .iter()
        .find(|r| r.rect.overlaps_polygon(&contour))
    {
        return Err(EditError::WouldInvalidateGeometry(format!(
            "cutout {} overlaps a {:?} region",
            cutout.id, region.kind
        ))
        .into());
    }
    if cutout.mode == CutoutMode::Subtract
        && boolean_2d(&panel.profile(), &[contour], BooleanOp::Difference).is_none()
    {
        return Err(GeometryError::EmptyBoolean.into());
    }
    Ok(())
}

/// Places a new cutout on a panel.
pub struct AddCutout {
    panel: PanelId,
    cutout: Cutout,
}

impl AddCutout {
    #[must_use]
    pub fn new(panel: PanelId, cutout: Cutout) -> Self {
        Self { panel, cutout }
    }

    /// # Errors
    ///
    /// Returns `EditError::InvalidValue` for a malformed shape,
    /// `EditError::WouldInvalidateGeometry` if it touches a joint region and
    /// `GeometryError::EmptyBoolean` if nothing of the panel would remain.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            check_cutout(s.panel(self.panel)?, &self.cutout)?;
            let cutout = self.cutout.clone();
            edit_overrides(s, self.panel, |o| {
                o.cutouts.retain(|c| c.id != cutout.id);
                o.cutouts.push(cutout);
            })
        })
    }
}

/// Replaces an existing cutout, matched by id.
pub struct UpdateCutout {
    panel: PanelId,
    cutout: Cutout,
}

impl UpdateCutout {
    #[must_use]
    pub fn new(panel: PanelId, cutout: Cutout) -> Self {
        Self { panel, cutout }
    }

    /// # Errors
    ///
    /// Returns `SceneError::CutoutNotFound` for an unknown id, otherwise the
    /// same errors as [`AddCutout::execute`].
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let known = s
                .overrides(self.panel)
                .is_some_and(|o| o.cutouts.iter().any(|c| c.id == self.cutout.id));
            if !known {
                return Err(SceneError::CutoutNotFound(self.cutout.id.to_string()).into());
            }
            check_cutout(s.panel(self.panel)?, &self.cutout)?;
            let cutout = self.cutout.clone();
            edit_overrides(s, self.panel, |o| {
                if let Some(slot) = o.cutouts.iter_mut().find(|c| c.id == cutout.id) {
                    *slot = cutout;
                }
            })
        })
    }
}

/// Removes a cutout.
pub struct DeleteCutout {
    panel: PanelId,
    cutout: CutoutId,
}

impl DeleteCutout {
    #[must_use]
    pub fn new(panel: PanelId, cutout: CutoutId) -> Self {
        Self { panel, cutout }
    }

    /// # Errors
    ///
    /// Returns `SceneError::CutoutNotFound` for an unknown id.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let removed = edit_overrides(s, self.panel, |o| {
                let before = o.cutouts.len();
                o.cutouts.retain(|c| c.id != self.cutout);
                o.cutouts.len() != before
            })?;
            if removed {
                Ok(())
            } else {
                Err(SceneError::CutoutNotFound(self.cutout.to_string()).into())
            }
        })
    }
}
