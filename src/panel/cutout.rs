use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::{EditError, Result};
use crate::geometry::Rect2;
use crate::math::polygon_2d::{check_non_degenerate, ensure_ccw, is_simple};
use crate::math::{Point2, TOLERANCE};
use crate::scene::CutoutId;

/// Outline of a cutout in panel-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CutoutShape {
    Rect {
        center: Point2,
        width: f64,
        height: f64,
    },
    Circle {
        center: Point2,
        radius: f64,
        segments: usize,
    },
    Polygon {
        points: Vec<Point2>,
    },
}

/// Whether a cutout removes or adds material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutoutMode {
    Subtract,
    Add,
}

/// A user-placed cutout on a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cutout {
    pub id: CutoutId,
    pub shape: CutoutShape,
    pub mode: CutoutMode,
}

impl Cutout {
    /// Creates a cutout with a fresh id.
    #[must_use]
    pub fn new(shape: CutoutShape, mode: CutoutMode) -> Self {
        Self {
            id: CutoutId::generate(),
            shape,
            mode,
        }
    }

    #[must_use]
    pub fn rect(center: Point2, width: f64, height: f64) -> Self {
        Self::new(
            CutoutShape::Rect {
                center,
                width,
                height,
            },
            CutoutMode::Subtract,
        )
    }

    #[must_use]
    pub fn circle(center: Point2, radius: f64) -> Self {
        Self::new(
            CutoutShape::Circle {
                center,
                radius,
                segments: 32,
            },
            CutoutMode::Subtract,
        )
    }

    #[must_use]
    pub fn with_mode(mut self, mode: CutoutMode) -> Self {
        self.mode = mode;
        self
    }

    /// Counter-clockwise contour of the shape.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contour(&self) -> Vec<Point2> {
        match &self.shape {
            CutoutShape::Rect {
                center,
                width,
                height,
            } => Rect2::from_center(*center, *width, *height).to_contour(),
            CutoutShape::Circle {
                center,
                radius,
                segments,
            } => {
                let n = (*segments).max(3);
                (0..n)
                    .map(|i| {
                        let a = TAU * i as f64 / n as f64;
                        Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
                    })
                    .collect()
            }
            CutoutShape::Polygon { points } => ensure_ccw(points),
        }
    }

    /// Checks the shape parameters.
    ///
    /// # Errors
    ///
    /// Returns `EditError::InvalidValue` for non-positive sizes, too few
    /// circle segments or a self-intersecting polygon, and
    /// `GeometryError::Degenerate` for a zero-area polygon.
    pub fn validate(&self) -> Result<()> {
        match &self.shape {
            CutoutShape::Rect { width, height, .. } => {
                if !(width.is_finite() && height.is_finite() && *width > TOLERANCE && *height > TOLERANCE) {
                    return Err(EditError::InvalidValue(format!(
                        "rectangle cutout must have positive size, got {width} x {height}"
                    ))
                    .into());
                }
            }
            CutoutShape::Circle {
                radius, segments, ..
            } => {
                if !(radius.is_finite() && *radius > TOLERANCE) {
                    return Err(EditError::InvalidValue(format!(
                        "circle cutout radius must be positive, got {radius}"
                    ))
                    .into());
                }
                if *segments < 8 {
                    return Err(EditError::InvalidValue(format!(
                        "circle cutout needs at least 8 segments, got {segments}"
                    ))
                    .into());
                }
            }
            CutoutShape::Polygon { points } => {
                check_non_degenerate(points)?;
                if !is_simple(points) {
                    return Err(EditError::InvalidValue(
                        "polygon cutout is self-intersecting".into(),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;

    #[test]
    fn rect_contour_is_ccw() {
        let c = Cutout::rect(Point2::new(1.0, 1.0), 4.0, 2.0);
        let contour = c.contour();
        assert_eq!(contour.len(), 4);
        assert!((signed_area_2d(&contour) - 8.0).abs() < TOLERANCE);
    }

    #[test]
    fn circle_contour_approximates_area() {
        let c = Cutout::circle(Point2::origin(), 5.0);
        let area = signed_area_2d(&c.contour());
        assert!(area > 0.0);
        assert!((area - std::f64::consts::PI * 25.0).abs() < 2.0);
    }

    #[test]
    fn polygon_winding_is_normalised() {
        let c = Cutout::new(
            CutoutShape::Polygon {
                points: vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(0.0, 2.0),
                    Point2::new(2.0, 0.0),
                ],
            },
            CutoutMode::Add,
        );
        assert!(signed_area_2d(&c.contour()) > 0.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn invalid_shapes_rejected() {
        assert!(Cutout::rect(Point2::origin(), 0.0, 2.0).validate().is_err());
        assert!(Cutout::circle(Point2::origin(), -1.0).validate().is_err());
        let bow_tie = Cutout::new(
            CutoutShape::Polygon {
                points: vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(1.0, 1.0),
                    Point2::new(1.0, 0.0),
                    Point2::new(0.0, 1.0),
                ],
            },
            CutoutMode::Subtract,
        );
        assert!(bow_tie.validate().is_err());
    }
}
