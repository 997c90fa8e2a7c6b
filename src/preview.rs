use tracing::debug;

use crate::error::Result;
use crate::operations::Action;
use crate::scene::Scene;

/// Holds the committed scene and an optional preview clone.
///
/// While a preview is open, actions go to the clone and the committed scene
/// is left alone. Committing swaps the clone in; discarding drops it.
#[derive(Debug, Clone)]
pub struct Editor {
    committed: Scene,
    preview: Option<Scene>,
}

impl Editor {
    #[must_use]
    pub fn new(scene: Scene) -> Self {
        Self {
            committed: scene,
            preview: None,
        }
    }

    /// The committed scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.committed
    }

    /// The preview if one is open, else the committed scene.
    #[must_use]
    pub fn active(&self) -> &Scene {
        self.preview.as_ref().unwrap_or(&self.committed)
    }

    #[must_use]
    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Opens a preview cloned from the committed scene, replacing any open
    /// preview.
    pub fn begin_preview(&mut self) {
        debug!(replacing = self.preview.is_some(), "preview started");
        self.preview = Some(self.committed.clone());
    }

    /// Mutable access to the open preview.
    pub fn preview_mut(&mut self) -> Option<&mut Scene> {
        self.preview.as_mut()
    }

    /// Applies an action to the active scene.
    ///
    /// # Errors
    ///
    /// Returns the action's error; the active scene is unchanged.
    pub fn dispatch(&mut self, action: &Action) -> Result<()> {
        match self.preview.as_mut() {
            Some(preview) => preview.dispatch(action),
            None => self.committed.dispatch(action),
        }
    }

    /// Makes the preview the committed scene. Returns `false` if no preview
    /// was open.
    pub fn commit_preview(&mut self) -> bool {
        match self.preview.take() {
            Some(preview) => {
                self.committed = preview;
                debug!("preview committed");
                true
            }
            None => false,
        }
    }

    /// Drops the preview. Returns `false` if none was open.
    pub fn discard_preview(&mut self) -> bool {
        let had = self.preview.take().is_some();
        if had {
            debug!("preview discarded");
        }
        had
    }
}
