use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cache::Cache;
use super::{AssemblyId, PanelId, VoidId};
use crate::error::{Result, SceneError};
use crate::geometry::{Axis, Bounds3};
use crate::math::TOLERANCE;

/// Positions along one axis of a grid split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCut {
    pub axis: Axis,
    pub positions: Vec<f64>,
}

/// How a void is divided into children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Split {
    /// One divider at `position` along `axis`; two children.
    Single { axis: Axis, position: f64 },
    /// Full-span dividers on up to two axes; children are the grid cells,
    /// first cut's axis outermost.
    Grid { cuts: Vec<GridCut> },
}

/// Identifies a divider within its void: axis and index along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DividerKey {
    pub axis: Axis,
    pub index: usize,
}

impl Split {
    /// `(key, position)` of every divider the split produces.
    #[must_use]
    pub fn dividers(&self) -> Vec<(DividerKey, f64)> {
        match self {
            Split::Single { axis, position } => vec![(
                DividerKey {
                    axis: *axis,
                    index: 0,
                },
                *position,
            )],
            Split::Grid { cuts } => cuts
                .iter()
                .flat_map(|cut| {
                    cut.positions.iter().enumerate().map(|(index, p)| {
                        (
                            DividerKey {
                                axis: cut.axis,
                                index,
                            },
                            *p,
                        )
                    })
                })
                .collect(),
        }
    }

    /// Axis of the first cut; grid dividers on this axis are notched from
    /// the top of the crossing line.
    #[must_use]
    pub fn primary_axis(&self) -> Axis {
        match self {
            Split::Single { axis, .. } => *axis,
            Split::Grid { cuts } => cuts.first().map_or(Axis::X, |c| c.axis),
        }
    }

    #[must_use]
    pub fn is_grid(&self) -> bool {
        matches!(self, Split::Grid { .. })
    }

    fn cuts(&self) -> Vec<(Axis, Vec<f64>)> {
        match self {
            Split::Single { axis, position } => vec![(*axis, vec![*position])],
            Split::Grid { cuts } => cuts
                .iter()
                .map(|c| (c.axis, c.positions.clone()))
                .collect(),
        }
    }

    /// Child void bounds for a parent void, in the order children are
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::InvalidSplit` if the split is malformed or a
    /// child would be thinner than one material thickness.
    pub fn child_bounds(&self, parent: &Bounds3, thickness: f64) -> Result<Vec<Bounds3>> {
        let cuts = self.cuts();
        if cuts.is_empty() || cuts.len() > 2 {
            return Err(SceneError::InvalidSplit(format!(
                "expected one or two split axes, got {}",
                cuts.len()
            ))
            .into());
        }
        if cuts.len() == 2 && cuts[0].0 == cuts[1].0 {
            return Err(SceneError::InvalidSplit("grid axes must differ".into()).into());
        }
        let mut per_axis = Vec::with_capacity(cuts.len());
        for (axis, positions) in &cuts {
            per_axis.push((*axis, intervals(parent, *axis, positions, thickness)?));
        }

        let mut out = vec![*parent];
        for (axis, ranges) in per_axis {
            out = out
                .iter()
                .flat_map(|b| ranges.iter().map(move |&(lo, hi)| b.with_range(axis, lo, hi)))
                .collect();
        }
        Ok(out)
    }

    /// Maps every position proportionally from `old` bounds onto `new`.
    pub fn rescale(&mut self, old: &Bounds3, new: &Bounds3) {
        let map = |axis: Axis, p: f64| {
            let old_len = old.size(axis);
            if old_len.abs() < TOLERANCE {
                return p;
            }
            new.lo(axis) + (p - old.lo(axis)) * new.size(axis) / old_len
        };
        match self {
            Split::Single { axis, position } => *position = map(*axis, *position),
            Split::Grid { cuts } => {
                for cut in cuts {
                    let axis = cut.axis;
                    for p in &mut cut.positions {
                        *p = map(axis, *p);
                    }
                }
            }
        }
    }
}

fn intervals(
    parent: &Bounds3,
    axis: Axis,
    positions: &[f64],
    thickness: f64,
) -> Result<Vec<(f64, f64)>> {
    if positions.is_empty() {
        return Err(SceneError::InvalidSplit(format!("no positions on axis {axis}")).into());
    }
    let half = thickness * 0.5;
    let mut ranges = Vec::with_capacity(positions.len() + 1);
    let mut lo = parent.lo(axis);
    for p in positions {
        if !p.is_finite() {
            return Err(SceneError::InvalidSplit(format!("position {p} is not finite")).into());
        }
        ranges.push((lo, p - half));
        lo = p + half;
    }
    ranges.push((lo, parent.hi(axis)));
    if let Some((lo, hi)) = ranges.iter().find(|(lo, hi)| hi - lo < thickness - TOLERANCE) {
        return Err(SceneError::InvalidSplit(format!(
            "child void [{lo}, {hi}] along {axis} is thinner than the material"
        ))
        .into());
    }
    Ok(ranges)
}

/// A divider produced by a void's split, laid out in assembly coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DividerLayout {
    pub key: DividerKey,
    pub id: PanelId,
    pub position: f64,
}

/// A region inside an assembly. Either a leaf (optionally holding a
/// sub-assembly) or split into children.
#[derive(Debug, Clone, PartialEq)]
pub struct VoidNode {
    pub(crate) assembly: AssemblyId,
    pub(crate) parent: Option<VoidId>,
    pub(crate) bounds: Bounds3,
    pub(crate) split: Option<Split>,
    pub(crate) children: Vec<VoidId>,
    pub(crate) sub_assembly: Option<AssemblyId>,
    pub(crate) divider_ids: BTreeMap<DividerKey, PanelId>,
    pub(crate) cache: Cache<Vec<DividerLayout>>,
}

impl VoidNode {
    pub(crate) fn new(assembly: AssemblyId, parent: Option<VoidId>, bounds: Bounds3) -> Self {
        Self {
            assembly,
            parent,
            bounds,
            split: None,
            children: Vec::new(),
            sub_assembly: None,
            divider_ids: BTreeMap::new(),
            cache: Cache::new(),
        }
    }

    /// Owning assembly.
    #[must_use]
    pub fn assembly(&self) -> AssemblyId {
        self.assembly
    }

    #[must_use]
    pub fn parent(&self) -> Option<VoidId> {
        self.parent
    }

    /// Bounds in the owning assembly's local frame.
    #[must_use]
    pub fn bounds(&self) -> &Bounds3 {
        &self.bounds
    }

    #[must_use]
    pub fn split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[VoidId] {
        &self.children
    }

    #[must_use]
    pub fn sub_assembly(&self) -> Option<AssemblyId> {
        self.sub_assembly
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    #[must_use]
    pub fn divider_id(&self, axis: Axis, index: usize) -> Option<PanelId> {
        self.divider_ids.get(&DividerKey { axis, index }).copied()
    }

    /// Dividers of this void's split, memoized until the void is next
    /// written.
    #[must_use]
    pub fn dividers(&self) -> &[DividerLayout] {
        self.cache.get_or_init(|| {
            self.split
                .as_ref()
                .map(|split| {
                    split
                        .dividers()
                        .into_iter()
                        .filter_map(|(key, position)| {
                            self.divider_ids.get(&key).map(|&id| DividerLayout {
                                key,
                                id,
                                position,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn interior() -> Bounds3 {
        Bounds3::new(Point3::new(3.0, 3.0, 3.0), Point3::new(97.0, 77.0, 57.0))
    }

    #[test]
    fn single_split_children() {
        let split = Split::Single {
            axis: Axis::X,
            position: 50.0,
        };
        let children = split.child_bounds(&interior(), 3.0).unwrap();
        assert_eq!(children.len(), 2);
        assert!((children[0].hi(Axis::X) - 48.5).abs() < TOLERANCE);
        assert!((children[1].lo(Axis::X) - 51.5).abs() < TOLERANCE);
        assert!((children[1].hi(Axis::Y) - 77.0).abs() < TOLERANCE);
    }

    #[test]
    fn grid_split_children_are_cells() {
        let split = Split::Grid {
            cuts: vec![
                GridCut {
                    axis: Axis::X,
                    positions: vec![35.0, 65.0],
                },
                GridCut {
                    axis: Axis::Z,
                    positions: vec![30.0],
                },
            ],
        };
        let children = split.child_bounds(&interior(), 3.0).unwrap();
        assert_eq!(children.len(), 6);
        assert_eq!(split.dividers().len(), 3);
        // first axis outermost
        assert!((children[0].hi(Axis::Z) - 28.5).abs() < TOLERANCE);
        assert!((children[1].lo(Axis::Z) - 31.5).abs() < TOLERANCE);
        assert!((children[1].hi(Axis::X) - 33.5).abs() < TOLERANCE);
    }

    #[test]
    fn too_thin_child_rejected() {
        let split = Split::Single {
            axis: Axis::X,
            position: 5.0,
        };
        assert!(split.child_bounds(&interior(), 3.0).is_err());
    }

    #[test]
    fn same_axis_grid_rejected() {
        let split = Split::Grid {
            cuts: vec![
                GridCut {
                    axis: Axis::X,
                    positions: vec![30.0],
                },
                GridCut {
                    axis: Axis::X,
                    positions: vec![60.0],
                },
            ],
        };
        assert!(split.child_bounds(&interior(), 3.0).is_err());
    }

    #[test]
    fn rescale_is_proportional() {
        let mut split = Split::Single {
            axis: Axis::X,
            position: 50.0,
        };
        let old = interior();
        let new = old.with_range(Axis::X, 3.0, 191.0);
        split.rescale(&old, &new);
        let Split::Single { position, .. } = split else {
            panic!("split kind changed");
        };
        assert!((position - 97.0).abs() < TOLERANCE);
    }
}
