use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Cutout, PanelCorner, PanelEdge};
use crate::math::Point2;

/// Grid used to key corners by position (0.1 µm).
const CORNER_KEY_SCALE: f64 = 1e4;

/// Position-derived key of a detected corner.
///
/// Corners are recomputed on every derivation, so fillets on arbitrary
/// corners are addressed by where the corner sits rather than by its index
/// in the outline. Fillets on the four outer corners use [`PanelCorner`]
/// instead and follow the corner when it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CornerKey {
    x: i64,
    y: i64,
}

impl CornerKey {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_point(p: &Point2) -> Self {
        Self {
            x: (p.x * CORNER_KEY_SCALE).round() as i64,
            y: (p.y * CORNER_KEY_SCALE).round() as i64,
        }
    }

    /// The snapped position this key stands for.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self) -> Point2 {
        Point2::new(
            self.x as f64 / CORNER_KEY_SCALE,
            self.y as f64 / CORNER_KEY_SCALE,
        )
    }
}

impl fmt::Display for CornerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position();
        write!(f, "({:.4}, {:.4})", p.x, p.y)
    }
}

/// One sample of a custom edge path.
///
/// `t` runs from 0 at the edge's low end to 1 at its high end; `offset` is
/// measured along the outward normal from the edge line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgePathPoint {
    pub t: f64,
    pub offset: f64,
}

impl EdgePathPoint {
    #[must_use]
    pub fn new(t: f64, offset: f64) -> Self {
        Self { t, offset }
    }
}

/// A stored fillet request on a detected corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerFillet {
    pub corner: CornerKey,
    pub radius: f64,
}

/// User edits attached to one panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelOverrides {
    /// Extension per edge, indexed by [`PanelEdge::index`].
    pub extensions: [f64; 4],
    /// Fillets on the four outer corners, resolved to a position on each
    /// derivation.
    pub corner_fillets: BTreeMap<PanelCorner, f64>,
    /// Fillets on detected corners, keyed by position.
    pub fillets: Vec<CornerFillet>,
    pub custom_paths: BTreeMap<PanelEdge, Vec<EdgePathPoint>>,
    pub cutouts: Vec<Cutout>,
}

impl PanelOverrides {
    #[must_use]
    pub fn extension(&self, edge: PanelEdge) -> f64 {
        self.extensions[edge.index()]
    }

    pub fn set_extension(&mut self, edge: PanelEdge, amount: f64) {
        self.extensions[edge.index()] = amount;
    }

    #[must_use]
    pub fn corner_fillet(&self, corner: PanelCorner) -> Option<f64> {
        self.corner_fillets.get(&corner).copied()
    }

    /// Stores a fillet on an outer corner. A radius `<= 0` removes it.
    pub fn set_corner_fillet(&mut self, corner: PanelCorner, radius: f64) {
        if radius > 0.0 {
            self.corner_fillets.insert(corner, radius);
        } else {
            self.corner_fillets.remove(&corner);
        }
    }

    #[must_use]
    pub fn fillet(&self, corner: CornerKey) -> Option<f64> {
        self.fillets
            .iter()
            .find(|f| f.corner == corner)
            .map(|f| f.radius)
    }

    /// Stores a fillet, replacing any previous radius. A radius `<= 0`
    /// removes the entry.
    pub fn set_fillet(&mut self, corner: CornerKey, radius: f64) {
        self.fillets.retain(|f| f.corner != corner);
        if radius > 0.0 {
            self.fillets.push(CornerFillet { corner, radius });
            self.fillets.sort_by_key(|f| f.corner);
        }
    }

    /// Fillets as a lookup map.
    #[must_use]
    pub fn fillet_map(&self) -> BTreeMap<CornerKey, f64> {
        self.fillets.iter().map(|f| (f.corner, f.radius)).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.iter().all(|e| *e == 0.0)
            && self.corner_fillets.is_empty()
            && self.fillets.is_empty()
            && self.custom_paths.is_empty()
            && self.cutouts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_key_snaps_float_noise() {
        let a = CornerKey::from_point(&Point2::new(-47.0, 37.0));
        let b = CornerKey::from_point(&Point2::new(-46.999_999_999_9, 37.000_000_000_1));
        assert_eq!(a, b);
        assert!((a.position().x + 47.0).abs() < 1e-9);
    }

    #[test]
    fn fillet_replace_and_remove() {
        let key = CornerKey::from_point(&Point2::new(1.0, 2.0));
        let mut overrides = PanelOverrides::default();
        overrides.set_fillet(key, 10.0);
        overrides.set_fillet(key, 5.0);
        assert_eq!(overrides.fillets.len(), 1);
        assert_eq!(overrides.fillet(key), Some(5.0));
        overrides.set_fillet(key, 0.0);
        assert_eq!(overrides.fillet(key), None);
        assert!(overrides.is_empty());
    }

    #[test]
    fn corner_fillets_are_kept_apart_from_position_fillets() {
        let mut overrides = PanelOverrides::default();
        overrides.set_corner_fillet(PanelCorner::TopLeft, 4.0);
        overrides.set_corner_fillet(PanelCorner::TopLeft, 6.0);
        assert_eq!(overrides.corner_fillet(PanelCorner::TopLeft), Some(6.0));
        assert!(overrides.fillets.is_empty());
        assert!(!overrides.is_empty());
        overrides.set_corner_fillet(PanelCorner::TopLeft, -1.0);
        assert!(overrides.is_empty());
    }
}
