use super::{check_finite, edit_overrides};
use crate::error::{EditError, Result};
use crate::panel::{EdgePathPoint, EdgeStatus, Panel, PanelEdge};
use crate::scene::{PanelId, Scene};

fn locked(panel: &Panel, edge: PanelEdge) -> EditError {
    EditError::EdgeLocked {
        panel: panel.id.to_string(),
        edge: edge.to_string(),
    }
}

/// Checks one extension request against the panel's current edge state.
fn check_extension(panel: &Panel, edge: PanelEdge, amount: f64) -> Result<()> {
    check_finite("extension", amount)?;
    let info = panel.edge(edge);
    if info.feet && amount != 0.0 {
        return Err(EditError::InvalidValue(format!("edge {edge} carries feet")).into());
    }
    if amount > 0.0 && !info.can_extend() {
        return Err(locked(panel, edge).into());
    }
    if amount < 0.0 && !info.can_inset() {
        if info.status == EdgeStatus::Locked {
            return Err(locked(panel, edge).into());
        }
        return Err(EditError::InvalidValue(format!(
            "edge {edge} joins another panel and can only move outward"
        ))
        .into());
    }
    Ok(())
}

/// Moves one edge outward (positive) or inward (negative).
pub struct SetEdgeExtension {
    panel: PanelId,
    edge: PanelEdge,
    amount: f64,
}

impl SetEdgeExtension {
    #[must_use]
    pub fn new(panel: PanelId, edge: PanelEdge, amount: f64) -> Self {
        Self {
            panel,
            edge,
            amount,
        }
    }

    /// # Errors
    ///
    /// Returns `EditError::EdgeLocked` for a locked edge,
    /// `EditError::InvalidValue` for an inward move on a joined edge or any
    /// move on an edge with feet, and `EditError::WouldInvalidateGeometry`
    /// if the outline would break.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        SetEdgeExtensions::new(self.panel, vec![(self.edge, self.amount)]).execute(scene)
    }
}

/// Sets several edge extensions of one panel together; either all apply or
/// none do.
pub struct SetEdgeExtensions {
    panel: PanelId,
    extensions: Vec<(PanelEdge, f64)>,
}

impl SetEdgeExtensions {
    #[must_use]
    pub fn new(panel: PanelId, extensions: Vec<(PanelEdge, f64)>) -> Self {
        Self { panel, extensions }
    }

    /// # Errors
    ///
    /// Same as [`SetEdgeExtension::execute`], for the first bad entry.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let panel = s.panel(self.panel)?;
            for (edge, amount) in &self.extensions {
                check_extension(panel, *edge, *amount)?;
            }
            edit_overrides(s, self.panel, |o| {
                for (edge, amount) in &self.extensions {
                    o.set_extension(*edge, *amount);
                }
            })
        })
    }
}

/// Replaces a straight edge with a path of `(t, offset)` samples.
pub struct SetCustomEdgePath {
    panel: PanelId,
    edge: PanelEdge,
    points: Vec<EdgePathPoint>,
}

impl SetCustomEdgePath {
    #[must_use]
    pub fn new(panel: PanelId, edge: PanelEdge, points: Vec<EdgePathPoint>) -> Self {
        Self {
            panel,
            edge,
            points,
        }
    }

    /// # Errors
    ///
    /// Returns `EditError::EdgeLocked` for a locked edge,
    /// `EditError::InvalidValue` for an empty path, a `t` outside (0, 1) or
    /// not strictly increasing, or a path entering a joint region, and
    /// `EditError::WouldInvalidateGeometry` for a self-intersecting result.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            let panel = s.panel(self.panel)?;
            self.check(panel)?;
            let points = self.points.clone();
            edit_overrides(s, self.panel, |o| {
                o.custom_paths.insert(self.edge, points);
            })
        })
    }

    fn check(&self, panel: &Panel) -> Result<()> {
        if self.points.is_empty() {
            return Err(EditError::InvalidValue("custom path has no points".into()).into());
        }
        let mut last = 0.0;
        for p in &self.points {
            check_finite("path t", p.t)?;
            check_finite("path offset", p.offset)?;
            if p.t <= last || p.t >= 1.0 {
                return Err(EditError::InvalidValue(format!(
                    "path t values must increase strictly inside (0, 1), got {}",
                    p.t
                ))
                .into());
            }
            last = p.t;
        }

        let info = panel.edge(self.edge);
        if !info.accepts_custom_path() {
            if info.status == EdgeStatus::Locked {
                return Err(locked(panel, self.edge).into());
            }
            return Err(EditError::InvalidValue(format!(
                "edge {} must be open or extended to take a custom path",
                self.edge
            ))
            .into());
        }

        let (lo_edge, hi_edge) = self.edge.neighbours();
        let (lo, hi) = (panel.edge(lo_edge).line, panel.edge(hi_edge).line);
        let local: Vec<_> = self
            .points
            .iter()
            .map(|p| {
                self.edge
                    .point(lo + (hi - lo) * p.t, info.line + self.edge.outward() * p.offset)
            })
            .collect();
        let enters = |a, b| panel.forbidden.iter().any(|r| r.rect.crossed_by_segment(a, b));
        if local.iter().any(|p| panel.forbidden.iter().any(|r| r.contains(p)))
            || local.windows(2).any(|w| enters(&w[0], &w[1]))
        {
            return Err(EditError::InvalidValue(format!(
                "custom path on edge {} enters a joint region",
                self.edge
            ))
            .into());
        }
        Ok(())
    }
}

/// Restores a straight edge.
pub struct ClearCustomEdgePath {
    panel: PanelId,
    edge: PanelEdge,
}

impl ClearCustomEdgePath {
    #[must_use]
    pub fn new(panel: PanelId, edge: PanelEdge) -> Self {
        Self { panel, edge }
    }

    /// # Errors
    ///
    /// Returns `SceneError::PanelNotFound` for an unknown panel.
    pub fn execute(&self, scene: &mut Scene) -> Result<()> {
        scene.transact(|s| {
            edit_overrides(s, self.panel, |o| {
                o.custom_paths.remove(&self.edge);
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
    use crate::operations::SetFaceSolid;
    use crate::scene::FaceId;

    fn scene() -> Scene {
        Scene::new(100.0, 80.0, 60.0, MaterialConfig::default()).unwrap()
    }

    fn open_top() -> (Scene, PanelId) {
        let mut s = scene();
        let root = s.root();
        SetFaceSolid::new(root, FaceId::Top, false).execute(&mut s).unwrap();
        let front = s.face_panel(root, FaceId::Front).unwrap().id;
        (s, front)
    }

    #[test]
    fn locked_edge_rejects_extension_and_keeps_state() {
        let mut s = scene();
        let front = s.face_panel(s.root(), FaceId::Front).unwrap().id;
        let err = SetEdgeExtension::new(front, PanelEdge::Left, 5.0)
            .execute(&mut s)
            .unwrap_err();
        assert!(matches!(err, FingerboxError::Edit(EditError::EdgeLocked { .. })));
        assert!(s.overrides(front).is_none());
    }

    #[test]
    fn open_edge_extends_and_insets() {
        let (mut s, front) = open_top();
        SetEdgeExtension::new(front, PanelEdge::Top, 12.0)
            .execute(&mut s)
            .unwrap();
        let top = s.panel(front).unwrap().edge(PanelEdge::Top);
        assert!((top.line - 52.0).abs() < 1e-9);

        SetEdgeExtension::new(front, PanelEdge::Top, -10.0)
            .execute(&mut s)
            .unwrap();
        let top = s.panel(front).unwrap().edge(PanelEdge::Top);
        assert!((top.line - 30.0).abs() < 1e-9);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let (mut s, front) = open_top();
        let err = SetEdgeExtensions::new(
            front,
            vec![(PanelEdge::Top, 10.0), (PanelEdge::Left, 10.0)],
        )
        .execute(&mut s);
        assert!(err.is_err());
        assert!(s.overrides(front).is_none());
    }

    #[test]
    fn extension_to_zero_clears_overrides() {
        let (mut s, front) = open_top();
        SetEdgeExtension::new(front, PanelEdge::Top, 4.0)
            .execute(&mut s)
            .unwrap();
        SetEdgeExtension::new(front, PanelEdge::Top, 0.0)
            .execute(&mut s)
            .unwrap();
        assert!(s.overrides(front).is_none());
    }

    #[test]
    fn custom_path_on_open_edge() {
        let (mut s, front) = open_top();
        let path = vec![EdgePathPoint::new(0.3, 0.0), EdgePathPoint::new(0.5, 8.0), EdgePathPoint::new(0.7, 0.0)];
        SetCustomEdgePath::new(front, PanelEdge::Top, path)
            .execute(&mut s)
            .unwrap();
        let panel = s.panel(front).unwrap();
        assert!(panel.edge(PanelEdge::Top).custom_path);
        assert!(panel
            .outline
            .iter()
            .any(|p| p.x.abs() < 1e-9 && (p.y - 48.0).abs() < 1e-9));

        ClearCustomEdgePath::new(front, PanelEdge::Top)
            .execute(&mut s)
            .unwrap();
        assert!(!s.panel(front).unwrap().edge(PanelEdge::Top).custom_path);
    }

    #[test]
    fn custom_path_rejects_bad_samples() {
        let (mut s, front) = open_top();
        for path in [
            vec![],
            vec![EdgePathPoint::new(0.0, 1.0)],
            vec![EdgePathPoint::new(0.5, 1.0), EdgePathPoint::new(0.4, 1.0)],
        ] {
            assert!(SetCustomEdgePath::new(front, PanelEdge::Top, path)
                .execute(&mut s)
                .is_err());
        }
        let locked = SetCustomEdgePath::new(front, PanelEdge::Left, vec![EdgePathPoint::new(0.5, 2.0)])
            .execute(&mut s)
            .unwrap_err();
        assert!(matches!(locked, FingerboxError::Edit(EditError::EdgeLocked { .. })));
    }

    #[test]
    fn custom_path_may_not_dip_into_joints() {
        let (mut s, front) = open_top();
        // Near the left end the path dives into the left finger zone.
        let path = vec![EdgePathPoint::new(0.02, -30.0), EdgePathPoint::new(0.5, 0.0)];
        assert!(SetCustomEdgePath::new(front, PanelEdge::Top, path)
            .execute(&mut s)
            .is_err());
        assert!(s.overrides(front).is_none());
    }
}
