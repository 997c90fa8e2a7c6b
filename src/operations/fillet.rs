use std::fmt::Display;
use tracing::debug;

use super::{check_finite, edit_overrides};
use crate::error::{EditError, Result};
use crate::panel::{CornerKey, Panel, PanelCorner};
use crate::scene::{PanelId, Scene};

fn ineligible(panel: &Panel, corner: impl ToString) -> EditError {
    EditError::CornerIneligible {
        panel: panel.id.to_string(),
        corner: corner.to_string(),
    }
}

/// Clamps a requested radius to a corner's maximum.
fn clamp_radius(corner: &impl Display, radius: f64, max_radius: f64) -> f64 {
    if radius > max_radius {
        debug!(%corner, requested = radius, clamped = max_radius, "fillet radius clamped");
        max_radius
    } else {
        radius
    }
}

/// Resolves `(corner, (eligible, max radius), radius)` requests to stored
/// `(corner, radius)` pairs. A radius `<= 0` removes the fillet and is
/// accepted on any corner.
fn resolve<K: Copy + Display>(
    panel: &Panel,
    requests: impl IntoIterator<Item = (K, Option<(bool, f64)>, f64)>,
) -> Result<Vec<(K, f64)>> {
    let mut out = Vec::new();
    for (key, info, radius) in requests {
        check_finite("fillet radius", radius)?;
        if radius <= 0.0 {
            out.push((key, 0.0));
            continue;
        }
        let Some((eligible, max_radius)) = info else {
            return Err(EditError::InvalidValue(format!("no corner at {key}")).into());
        };
        if !eligible {
            return Err(ineligible(panel, key).into());
        }
        out.push((key, clamp_radius(&key, radius, max_radius)));
    }
    Ok(out)
}

/// Drops position-keyed fillets whose corner no longer exists, e.g. after a
/// resize or an extension moved it.
pub(crate) fn prune_stale_fillets(scene: &mut Scene) -> Result<()> {
    let stale: Vec<(PanelId, Vec<CornerKey>)> = scene
        .panels()
        .iter()
        .filter_map(|panel| {
            let keys: Vec<CornerKey> = scene
                .overrides(panel.id)?
                .fillets
                .iter()
                .map(|f| f.corner)
                .filter(|key| panel.corner(*key).is_none())
                .collect();
            (!keys.is_empty()).then_some((panel.id, keys))
        })
        .collect();
    for (panel, keys) in stale {
        debug!(%panel, dropped = keys.len(), "stale corner fillets dropped");
        edit_overrides(scene, panel, |o| o.fillets.retain(|f| !keys.contains(&f.corner)))?;
    }
    Ok(())
}

/// Rounds one of the four outer corners of a panel.
pub struct SetCornerFillet {
    panel: PanelId,
    corner: PanelCorner,
    radius: f64,
}

impl SetCornerFillet {
    #[must_use]
    pub fn new(panel: PanelId, corner: PanelCorner, radius: f64) -> Self {
        Self {
            panel,
            corner,
            radius,
        }
    }

    /// # Errors
    ///
    /// Returns `EditError::CornerIneligible` unless both edges at the corner
    /// are open or extended.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        SetCornerFillets::new(self.panel, vec![(self.corner, self.radius)]).execute(scene)
    }
}

/// Rounds several outer corners at once; either all apply or none do.
pub struct SetCornerFillets {
    panel: PanelId,
    fillets: Vec<(PanelCorner, f64)>,
}

impl SetCornerFillets {
    #[must_use]
    pub fn new(panel: PanelId, fillets: Vec<(PanelCorner, f64)>) -> Self {
        Self { panel, fillets }
    }

    /// # Errors
    ///
    /// Same as [`SetCornerFillet::execute`], for the first bad entry.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let panel = s.panel(self.panel)?;
            let mut requests = Vec::with_capacity(self.fillets.len());
            for (corner, radius) in &self.fillets {
                let named = panel.named_corner(*corner).ok_or_else(|| {
                    EditError::InvalidValue(format!("panel has no {corner} corner"))
                })?;
                requests.push((*corner, Some((named.eligible, named.max_radius)), *radius));
            }
            let fillets = resolve(panel, requests)?;
            edit_overrides(s, self.panel, |o| {
                for (corner, radius) in fillets {
                    o.set_corner_fillet(corner, radius);
                }
            })
        })
    }
}

/// Rounds any detected corner of a panel, outline or hole.
pub struct SetAllCornerFillet {
    panel: PanelId,
    corner: CornerKey,
    radius: f64,
}

impl SetAllCornerFillet {
    #[must_use]
    pub fn new(panel: PanelId, corner: CornerKey, radius: f64) -> Self {
        Self {
            panel,
            corner,
            radius,
        }
    }

    /// # Errors
    ///
    /// Returns `EditError::InvalidValue` if no corner sits at the key and
    /// `EditError::CornerIneligible` if the corner touches a joint region or
    /// cannot take the minimum radius.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        SetAllCornerFillets::new(self.panel, vec![(self.corner, self.radius)]).execute(scene)
    }
}

/// Rounds several detected corners at once; either all apply or none do.
pub struct SetAllCornerFillets {
    panel: PanelId,
    fillets: Vec<(CornerKey, f64)>,
}

impl SetAllCornerFillets {
    #[must_use]
    pub fn new(panel: PanelId, fillets: Vec<(CornerKey, f64)>) -> Self {
        Self { panel, fillets }
    }

    /// # Errors
    ///
    /// Same as [`SetAllCornerFillet::execute`], for the first bad entry.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let panel = s.panel(self.panel)?;
            let requests = self.fillets.iter().map(|(key, radius)| {
                (*key, panel.corner(*key).map(|c| (c.eligible, c.max_radius)), *radius)
            });
            let fillets = resolve(panel, requests)?;
            edit_overrides(s, self.panel, |o| {
                for (key, radius) in fillets {
                    o.set_fillet(key, radius);
                }
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FingerboxError;
    use crate::finger::MaterialConfig;
    use crate::operations::{SetEdgeExtension, SetFaceSolid};
    use crate::panel::PanelEdge;
    use crate::scene::FaceId;

    fn scene() -> Scene {
        Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap()
    }

    /// Front panel with top and left faces removed.
    fn open_corner() -> (Scene, PanelId) {
        let mut s = scene();
        let root = s.root();
        SetFaceSolid::new(root, FaceId::Top, false).execute(&mut s).unwrap();
        SetFaceSolid::new(root, FaceId::Left, false).execute(&mut s).unwrap();
        let front = s.face_panel(root, FaceId::Front).unwrap().id;
        (s, front)
    }

    #[test]
    fn closed_box_corners_are_ineligible() {
        let mut s = scene();
        let front = s.face_panel(s.root(), FaceId::Front).unwrap().id;
        let err = SetCornerFillet::new(front, PanelCorner::TopLeft, 3.0)
            .execute(&mut s)
            .unwrap_err();
        assert!(matches!(err, FingerboxError::Edit(EditError::CornerIneligible { .. })));
        assert!(s.overrides(front).is_none());
    }

    #[test]
    fn fillet_replaces_then_removes() {
        let (mut s, front) = open_corner();
        SetCornerFillet::new(front, PanelCorner::TopLeft, 10.0)
            .execute(&mut s)
            .unwrap();
        let key = s.panel(front).unwrap().named_corner(PanelCorner::TopLeft).unwrap().key;
        assert_eq!(s.overrides(front).unwrap().corner_fillet(PanelCorner::TopLeft), Some(10.0));

        SetCornerFillet::new(front, PanelCorner::TopLeft, 5.0)
            .execute(&mut s)
            .unwrap();
        assert_eq!(s.overrides(front).unwrap().corner_fillet(PanelCorner::TopLeft), Some(5.0));
        assert_eq!(
            s.panel(front).unwrap().named_corner(PanelCorner::TopLeft).unwrap().fillet,
            Some(5.0)
        );

        SetCornerFillet::new(front, PanelCorner::TopLeft, 0.0)
            .execute(&mut s)
            .unwrap();
        assert!(s.overrides(front).is_none());
        let corner = key.position();
        assert!(s
            .panel(front)
            .unwrap()
            .outline
            .iter()
            .any(|p| (p - corner).norm() < 1e-9));
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let (mut s, front) = open_corner();
        let max = s
            .panel(front)
            .unwrap()
            .named_corner(PanelCorner::TopLeft)
            .unwrap()
            .max_radius;
        SetCornerFillet::new(front, PanelCorner::TopLeft, max * 10.0)
            .execute(&mut s)
            .unwrap();
        let stored = s.overrides(front).unwrap().corner_fillet(PanelCorner::TopLeft).unwrap();
        assert!((stored - max).abs() < 1e-9);
    }

    #[test]
    fn named_fillet_follows_its_corner() {
        let (mut s, front) = open_corner();
        SetCornerFillet::new(front, PanelCorner::TopLeft, 10.0)
            .execute(&mut s)
            .unwrap();
        SetEdgeExtension::new(front, PanelEdge::Top, 15.0)
            .execute(&mut s)
            .unwrap();
        let named = s.panel(front).unwrap().named_corner(PanelCorner::TopLeft).unwrap();
        assert!((named.position.y - 55.0).abs() < 1e-9);
        assert_eq!(named.fillet, Some(10.0));
        assert_eq!(s.overrides(front).unwrap().corner_fillet(PanelCorner::TopLeft), Some(10.0));
    }

    #[test]
    fn moved_corner_drops_its_position_fillet() {
        let (mut s, front) = open_corner();
        SetEdgeExtension::new(front, PanelEdge::Top, 10.0)
            .execute(&mut s)
            .unwrap();
        let target = s
            .panel(front)
            .unwrap()
            .corners
            .iter()
            .find(|c| c.eligible && c.convex && c.position.y > 45.0)
            .unwrap()
            .key;
        SetAllCornerFillet::new(front, target, 2.0)
            .execute(&mut s)
            .unwrap();
        SetEdgeExtension::new(front, PanelEdge::Top, 20.0)
            .execute(&mut s)
            .unwrap();
        let overrides = s.overrides(front).unwrap();
        assert!(overrides.fillets.is_empty());
        assert!((overrides.extension(PanelEdge::Top) - 20.0).abs() < 1e-9);
        assert!(s.panel(front).unwrap().corners.iter().all(|c| c.fillet.is_none()));
    }

    #[test]
    fn all_corner_fillet_on_extension_step() {
        let (mut s, front) = open_corner();
        SetEdgeExtension::new(front, PanelEdge::Top, 10.0)
            .execute(&mut s)
            .unwrap();
        let panel = s.panel(front).unwrap();
        let target = panel
            .corners
            .iter()
            .find(|c| c.eligible && c.convex && c.position.y > 45.0)
            .unwrap()
            .key;
        SetAllCornerFillet::new(front, target, 2.0)
            .execute(&mut s)
            .unwrap();
        assert_eq!(s.overrides(front).unwrap().fillet(target), Some(2.0));
    }

    #[test]
    fn unknown_corner_is_rejected() {
        let (mut s, front) = open_corner();
        let nowhere = CornerKey::from_point(&crate::math::Point2::new(1.0, 1.0));
        assert!(SetAllCornerFillet::new(front, nowhere, 2.0)
            .execute(&mut s)
            .is_err());
    }

    #[test]
    fn batch_fails_atomically() {
        let (mut s, front) = open_corner();
        let result = SetCornerFillets::new(
            front,
            vec![(PanelCorner::TopLeft, 4.0), (PanelCorner::BottomRight, 4.0)],
        )
        .execute(&mut s);
        assert!(result.is_err());
        assert!(s.overrides(front).is_none());
    }
}
