use thiserror::Error;

/// Top-level error type for the fingerbox kernel.
#[derive(Debug, Error)]
pub enum FingerboxError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("boolean operation produced no polygon")]
    EmptyBoolean,
}

/// Errors related to the scene graph (assemblies, voids, panels).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("assembly not found: {0}")]
    AssemblyNotFound(String),

    #[error("void not found: {0}")]
    VoidNotFound(String),

    #[error("panel not found: {0}")]
    PanelNotFound(String),

    #[error("cutout not found: {0}")]
    CutoutNotFound(String),

    #[error("void {0} is already subdivided")]
    VoidNotLeaf(String),

    #[error("void {0} already holds a sub-assembly")]
    VoidHasSubAssembly(String),

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Errors raised when a panel-level edit is refused.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
    #[error("edge {edge} of panel {panel} is locked by finger joints")]
    EdgeLocked { panel: String, edge: String },

    #[error("corner {corner} of panel {panel} is not eligible for a fillet")]
    CornerIneligible { panel: String, corner: String },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("edit would invalidate panel geometry: {0}")]
    WouldInvalidateGeometry(String),
}

/// Convenience type alias for results using [`FingerboxError`].
pub type Result<T> = std::result::Result<T, FingerboxError>;
