//! Finger-joint patterns.
//!
//! Each assembly axis carries one pattern shared by every joint running
//! along that axis, so mating edges cut from the same sections and always
//! line up.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::geometry::Axis;
use crate::math::{Point2, TOLERANCE};

/// Sheet material and finger sizing shared by an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Sheet thickness (mm).
    pub thickness: f64,
    /// Target finger width (mm).
    pub finger_width: f64,
    /// Corner gap as a multiple of the finger width.
    pub finger_gap: f64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            thickness: 3.0,
            finger_width: 10.0,
            finger_gap: 1.5,
        }
    }
}

impl MaterialConfig {
    #[must_use]
    pub fn new(thickness: f64, finger_width: f64, finger_gap: f64) -> Self {
        Self {
            thickness,
            finger_width,
            finger_gap,
        }
    }

    /// Plain corner gap in millimetres.
    #[must_use]
    pub fn corner_gap(&self) -> f64 {
        self.finger_gap * self.finger_width
    }

    /// Checks that all parameters are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ParameterOutOfRange` for the first bad value.
    pub fn validate(&self) -> Result<()> {
        check_range("thickness", self.thickness, TOLERANCE, f64::MAX)?;
        check_range("finger_width", self.finger_width, TOLERANCE, f64::MAX)?;
        check_range("finger_gap", self.finger_gap, 0.0, f64::MAX)?;
        Ok(())
    }

    /// Returns the config with the finger width reduced so that the shortest
    /// interior dimension still fits three sections plus both corner gaps.
    ///
    /// The flag reports whether anything changed.
    #[must_use]
    pub fn clamped_to(&self, dims: [f64; 3]) -> (Self, bool) {
        let shortest = dims
            .iter()
            .map(|d| d - 2.0 * self.thickness)
            .fold(f64::INFINITY, f64::min);
        let max_width = shortest / (3.0 + 2.0 * self.finger_gap);
        if shortest > 0.0 && self.finger_width > max_width {
            debug!(
                requested = self.finger_width,
                clamped = max_width,
                "finger width clamped to fit shortest interior"
            );
            (
                Self {
                    finger_width: max_width,
                    ..*self
                },
                true,
            )
        } else {
            (*self, false)
        }
    }
}

fn check_range(parameter: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(GeometryError::ParameterOutOfRange {
            parameter,
            value,
            min,
            max,
        }
        .into())
    }
}

/// One section of a finger pattern, in assembly coordinates along its axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FingerSection {
    pub start: f64,
    pub end: f64,
}

impl FingerSection {
    #[must_use]
    pub fn center(&self) -> f64 {
        (self.start + self.end) * 0.5
    }

    /// Returns `true` if the section's interior overlaps `[lo, hi]`.
    #[must_use]
    pub fn overlaps(&self, lo: f64, hi: f64) -> bool {
        self.start < hi - TOLERANCE && lo < self.end - TOLERANCE
    }
}

/// Alternating sections along one axis. Even-indexed sections are finger
/// features (tabs on the male side, slots on the female side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerPattern {
    pub axis: Axis,
    pub start: f64,
    pub end: f64,
    pub section_width: f64,
    pub sections: Vec<FingerSection>,
}

impl FingerPattern {
    /// Lays out an odd number of equal sections over `[start, end]`, keeping
    /// a plain corner gap at both ends.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn compute(axis: Axis, start: f64, end: f64, material: &MaterialConfig) -> Self {
        let length = end - start;
        let mut gap = material.corner_gap();
        let mut usable = length - 2.0 * gap;
        if usable <= TOLERANCE {
            gap = 0.0;
            usable = length.max(0.0);
        }
        let mut count = ((usable / material.finger_width).round() as usize).max(1);
        if count % 2 == 0 {
            count += 1;
        }
        let width = usable / count as f64;
        let sections = (0..count)
            .map(|i| FingerSection {
                start: start + gap + i as f64 * width,
                end: start + gap + (i + 1) as f64 * width,
            })
            .collect();
        Self {
            axis,
            start,
            end,
            section_width: width,
            sections,
        }
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Feature sections (even indices).
    pub fn features(&self) -> impl Iterator<Item = &FingerSection> + '_ {
        self.sections.iter().step_by(2)
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.sections.len().div_ceil(2)
    }

    /// Span from the first feature's start to the last feature's end.
    #[must_use]
    pub fn zone(&self) -> Option<(f64, f64)> {
        let first = self.sections.first()?;
        let last = self.sections.last()?;
        Some((first.start, last.end))
    }

    /// Features lying entirely within `[lo, hi]`.
    #[must_use]
    pub fn features_within(&self, lo: f64, hi: f64) -> Vec<FingerSection> {
        self.features()
            .filter(|s| s.start >= lo - TOLERANCE && s.end <= hi + TOLERANCE)
            .copied()
            .collect()
    }
}

/// The three per-axis patterns of an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerData {
    pub x: FingerPattern,
    pub y: FingerPattern,
    pub z: FingerPattern,
}

impl FingerData {
    /// Patterns over each axis's interior `[t, dim - t]`.
    #[must_use]
    pub fn compute(dims: [f64; 3], material: &MaterialConfig) -> Self {
        let t = material.thickness;
        let pattern = |axis: Axis| FingerPattern::compute(axis, t, dims[axis.index()] - t, material);
        Self {
            x: pattern(Axis::X),
            y: pattern(Axis::Y),
            z: pattern(Axis::Z),
        }
    }

    #[must_use]
    pub fn get(&self, axis: Axis) -> &FingerPattern {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

/// What an edge feature physically is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Finger protruding from a male edge.
    Tab,
    /// Notch cut into a female edge.
    Slot,
    /// Cross-lap notch where two grid dividers intersect.
    Notch,
    /// Foot leg hanging below a wall.
    Leg,
}

impl FeatureKind {
    /// Joint features are removed from the tooth-free outline used for
    /// corner detection.
    #[must_use]
    pub fn is_joint(self) -> bool {
        !matches!(self, FeatureKind::Leg)
    }
}

/// A rectangular step along an edge: `[start, end]` along the edge, pushed
/// `offset` outward (negative offsets cut inward) from the edge's base line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeFeature {
    pub start: f64,
    pub end: f64,
    pub offset: f64,
    pub kind: FeatureKind,
}

impl EdgeFeature {
    #[must_use]
    pub fn center(&self) -> f64 {
        (self.start + self.end) * 0.5
    }
}

/// Traces a toothed edge as `(along, across)` pairs.
///
/// `base` is the across coordinate of the straight line between features
/// and `outward` is `+1` or `-1`. Features are visited in ascending or
/// descending order of `along`; the start and end corners are not included.
#[must_use]
pub fn trace_features(
    base: f64,
    outward: f64,
    features: &[EdgeFeature],
    ascending: bool,
) -> Vec<(f64, f64)> {
    let mut ordered: Vec<&EdgeFeature> = features.iter().collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));
    if !ascending {
        ordered.reverse();
    }
    let mut out = Vec::with_capacity(ordered.len() * 4);
    for f in ordered {
        let (first, second) = if ascending {
            (f.start, f.end)
        } else {
            (f.end, f.start)
        };
        let raised = base + outward * f.offset;
        out.push((first, base));
        out.push((first, raised));
        out.push((second, raised));
        out.push((second, base));
    }
    out
}

/// Builds the zig-zag for a single mating edge of the given length, lying
/// along +x from the origin.
///
/// With `tabs_out` the fingers protrude to `+thickness`; otherwise slots are
/// cut to `-thickness`.
pub struct FingerEdge {
    length: f64,
    material: MaterialConfig,
    tabs_out: bool,
}

impl FingerEdge {
    /// Creates a new `FingerEdge` generator.
    #[must_use]
    pub fn new(length: f64, material: MaterialConfig, tabs_out: bool) -> Self {
        Self {
            length,
            material,
            tabs_out,
        }
    }

    /// Produces the edge points, start and end included.
    ///
    /// # Errors
    ///
    /// Returns an error if the material is invalid or the length is not
    /// positive.
    pub fn execute(&self) -> Result<Vec<Point2>> {
        self.material.validate()?;
        check_range("length", self.length, TOLERANCE, f64::MAX)?;
        let pattern = FingerPattern::compute(Axis::X, 0.0, self.length, &self.material);
        let (offset, kind) = if self.tabs_out {
            (self.material.thickness, FeatureKind::Tab)
        } else {
            (-self.material.thickness, FeatureKind::Slot)
        };
        let features: Vec<EdgeFeature> = pattern
            .features()
            .map(|s| EdgeFeature {
                start: s.start,
                end: s.end,
                offset,
                kind,
            })
            .collect();
        let mut points = vec![Point2::new(0.0, 0.0)];
        points.extend(
            trace_features(0.0, 1.0, &features, true)
                .into_iter()
                .map(|(x, y)| Point2::new(x, y)),
        );
        points.push(Point2::new(self.length, 0.0));
        Ok(points)
    }
}
