pub mod error;
pub mod finger;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod panel;
pub mod preview;
pub mod scene;
pub mod snapshot;
pub mod validate;

pub use error::{FingerboxError, Result};
pub use finger::MaterialConfig;
pub use operations::Action;
pub use preview::Editor;
pub use scene::{Scene, SceneSettings};
