//! Read-only validation of derived scenes.
//!
//! The alignment pass runs after every derivation and reports its findings
//! as data. The geometry checker is an on-demand diagnostic over the whole
//! scene.
pub mod alignment;
pub mod checker;

pub use alignment::{validate_alignment, AlignmentError, AlignmentErrorKind};
pub use checker::{CheckReport, GeometryChecker, RuleViolation};
