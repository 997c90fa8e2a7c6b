use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

slotmap::new_key_type! {
    /// Key of an assembly in the scene arena.
    pub struct AssemblyId;
    /// Key of a void in the scene arena.
    pub struct VoidId;
}

/// Stable identity of a panel. Survives scene clones and re-derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelId(Uuid);

impl PanelId {
    /// Allocates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel-{}", self.0)
    }
}

/// Stable identity of a cutout within a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CutoutId(Uuid);

impl CutoutId {
    /// Allocates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CutoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cutout-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = PanelId::generate();
        let b = PanelId::generate();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), format!("panel-{}", a.as_uuid()));
        assert_ne!(CutoutId::generate(), CutoutId::generate());
    }
}
