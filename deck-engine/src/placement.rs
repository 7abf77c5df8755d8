//! Declarative placement and sizing, resolved to physical slide coordinates.
//!
//! Callers describe where an element goes in one of four schemes
//! (percentage, absolute, anchor-relative, grid-cell) and how big it is
//! (fraction of the slide, inches, or `auto`). Both are closed sum types
//! validated once at the deserialization boundary; resolution against a
//! slide size is pure arithmetic with no silent clamping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default grid partition used when a grid placement leaves `grid_size`
/// unspecified.
pub const DEFAULT_GRID_SIZE: u32 = 12;

/// Errors produced while parsing or resolving placements and dimensions.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// A percentage value was not a number or an `NN%` string.
    #[error("Malformed percentage value: {0:?}")]
    MalformedPercentage(String),

    /// A dimension value was not a number, an `NN%` string, or `auto`.
    #[error("Malformed dimension value: {0:?}")]
    MalformedDimension(String),

    /// A grid coordinate fell outside `[1, grid_size]`.
    #[error("Grid cell ({row}, {col}) outside 1..={grid_size}")]
    GridOutOfRange {
        /// Requested 1-based row.
        row: u32,
        /// Requested 1-based column.
        col: u32,
        /// The grid partition size.
        grid_size: u32,
    },

    /// A grid placement used a zero partition size.
    #[error("Grid size must be at least 1")]
    GridSizeZero,

    /// Both width and height were `auto`.
    #[error("Width and height cannot both be auto")]
    BothAuto,

    /// One dimension was `auto` but no source aspect ratio was available.
    #[error("Auto dimension requires a known source aspect ratio")]
    AutoWithoutAspectRatio,

    /// A supplied aspect ratio was zero, negative, or not finite.
    #[error("Invalid source aspect ratio: {0}")]
    InvalidAspectRatio(f32),
}

/// A fraction of a slide dimension.
///
/// Deserializes from either a numeric fraction (`0.25`) or a percent string
/// (`"25%"`); both normalize to the same internal fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FracRepr", into = "f32")]
pub struct Frac(f32);

impl Frac {
    /// Create a fraction directly.
    #[must_use]
    pub const fn new(fraction: f32) -> Self {
        Self(fraction)
    }

    /// The fraction value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl From<Frac> for f32 {
    fn from(frac: Frac) -> Self {
        frac.0
    }
}

/// Boundary representation for [`Frac`]: a bare number or a percent string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FracRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<FracRepr> for Frac {
    type Error = PlacementError;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(repr: FracRepr) -> Result<Self, Self::Error> {
        match repr {
            FracRepr::Number(n) if n.is_finite() => Ok(Self(n as f32)),
            FracRepr::Number(n) => Err(PlacementError::MalformedPercentage(n.to_string())),
            FracRepr::Text(s) => parse_percent(&s),
        }
    }
}

/// Parse an `NN%` string into a fraction.
fn parse_percent(s: &str) -> Result<Frac, PlacementError> {
    let trimmed = s.trim();
    let number = trimmed
        .strip_suffix('%')
        .ok_or_else(|| PlacementError::MalformedPercentage(s.to_string()))?;
    let value: f32 = number
        .trim()
        .parse()
        .map_err(|_| PlacementError::MalformedPercentage(s.to_string()))?;
    if value.is_finite() {
        Ok(Frac(value / 100.0))
    } else {
        Err(PlacementError::MalformedPercentage(s.to_string()))
    }
}

/// The nine named anchor points of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPoint {
    /// Top-left corner.
    TopLeft,
    /// Middle of the top edge.
    TopCenter,
    /// Top-right corner.
    TopRight,
    /// Middle of the left edge.
    CenterLeft,
    /// Slide center.
    Center,
    /// Middle of the right edge.
    CenterRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Middle of the bottom edge.
    BottomCenter,
    /// Bottom-right corner.
    BottomRight,
}

impl AnchorPoint {
    /// The fixed `(fraction_x, fraction_y)` of the slide this anchor maps to.
    #[must_use]
    pub const fn fractions(self) -> (f32, f32) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::CenterLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }
}

/// A declarative description of where an element goes on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    /// Fractions of the slide dimensions.
    Percentage {
        /// Fraction of the slide width.
        left: Frac,
        /// Fraction of the slide height.
        top: Frac,
    },

    /// Physical position in inches.
    Absolute {
        /// Distance from the left edge.
        left: f32,
        /// Distance from the top edge.
        top: f32,
    },

    /// A named anchor point plus physical offsets.
    Anchor {
        /// The anchor point.
        point: AnchorPoint,
        /// Horizontal offset in inches, applied after anchor resolution.
        #[serde(default)]
        offset_x: f32,
        /// Vertical offset in inches, applied after anchor resolution.
        #[serde(default)]
        offset_y: f32,
    },

    /// A cell in a uniform grid partition of the slide.
    Grid {
        /// 1-based row.
        row: u32,
        /// 1-based column.
        col: u32,
        /// Grid partition size; defaults to [`DEFAULT_GRID_SIZE`].
        #[serde(default = "default_grid_size")]
        grid_size: u32,
    },
}

const fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

impl Placement {
    /// Resolve this placement to a `(left, top)` position in inches.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::GridOutOfRange`] or
    /// [`PlacementError::GridSizeZero`] for invalid grid coordinates.
    #[allow(clippy::cast_precision_loss)] // grid indices are small
    pub fn resolve_position(
        &self,
        slide_width: f32,
        slide_height: f32,
    ) -> Result<(f32, f32), PlacementError> {
        match *self {
            Self::Percentage { left, top } => {
                Ok((left.value() * slide_width, top.value() * slide_height))
            }
            Self::Absolute { left, top } => Ok((left, top)),
            Self::Anchor {
                point,
                offset_x,
                offset_y,
            } => {
                let (fx, fy) = point.fractions();
                Ok((fx * slide_width + offset_x, fy * slide_height + offset_y))
            }
            Self::Grid {
                row,
                col,
                grid_size,
            } => {
                if grid_size == 0 {
                    return Err(PlacementError::GridSizeZero);
                }
                if row < 1 || row > grid_size || col < 1 || col > grid_size {
                    return Err(PlacementError::GridOutOfRange {
                        row,
                        col,
                        grid_size,
                    });
                }
                let cell_width = slide_width / grid_size as f32;
                let cell_height = slide_height / grid_size as f32;
                Ok(((col - 1) as f32 * cell_width, (row - 1) as f32 * cell_height))
            }
        }
    }
}

/// A declarative description of one extent of an element.
///
/// Deserializes from a bare number (inches), an `NN%` string (fraction of
/// the slide), or the string `"auto"` (derive from the source aspect ratio).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    /// Fraction of the corresponding slide dimension.
    Fraction(Frac),
    /// Physical length in inches.
    Inches(f32),
    /// Derive from the other dimension and the source aspect ratio.
    Auto,
}

/// Boundary representation for [`Dimension`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = PlacementError;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Number(n) if n.is_finite() => Ok(Self::Inches(n as f32)),
            DimensionRepr::Number(n) => Err(PlacementError::MalformedDimension(n.to_string())),
            DimensionRepr::Text(s) if s.trim().eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            DimensionRepr::Text(s) => parse_percent(&s)
                .map(Self::Fraction)
                .map_err(|_| PlacementError::MalformedDimension(s)),
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(dim: Dimension) -> Self {
        match dim {
            Dimension::Fraction(frac) => Self::Text(format!("{}%", frac.value() * 100.0)),
            Dimension::Inches(inches) => Self::Number(f64::from(inches)),
            Dimension::Auto => Self::Text("auto".to_string()),
        }
    }
}

impl Dimension {
    /// Resolve against a slide dimension, `None` when `auto`.
    fn resolve_concrete(self, slide_dimension: f32) -> Option<f32> {
        match self {
            Self::Fraction(frac) => Some(frac.value() * slide_dimension),
            Self::Inches(inches) => Some(inches),
            Self::Auto => None,
        }
    }
}

/// Resolve a width/height pair to physical inches.
///
/// At most one of the two dimensions may be [`Dimension::Auto`]; the auto
/// extent is derived from the other one and `source_aspect_ratio`
/// (width divided by height).
///
/// # Errors
///
/// Returns [`PlacementError::BothAuto`] when both dimensions are auto,
/// [`PlacementError::AutoWithoutAspectRatio`] when auto is requested with no
/// ratio available, or [`PlacementError::InvalidAspectRatio`] for a
/// non-positive or non-finite ratio.
pub fn resolve_size(
    width: Dimension,
    height: Dimension,
    slide_width: f32,
    slide_height: f32,
    source_aspect_ratio: Option<f32>,
) -> Result<(f32, f32), PlacementError> {
    let resolved_width = width.resolve_concrete(slide_width);
    let resolved_height = height.resolve_concrete(slide_height);

    match (resolved_width, resolved_height) {
        (Some(w), Some(h)) => Ok((w, h)),
        (None, None) => Err(PlacementError::BothAuto),
        (Some(w), None) => {
            let ratio = usable_ratio(source_aspect_ratio)?;
            Ok((w, w / ratio))
        }
        (None, Some(h)) => {
            let ratio = usable_ratio(source_aspect_ratio)?;
            Ok((h * ratio, h))
        }
    }
}

/// Validate the aspect ratio supplied for an `auto` resolution.
fn usable_ratio(source_aspect_ratio: Option<f32>) -> Result<f32, PlacementError> {
    let ratio = source_aspect_ratio.ok_or(PlacementError::AutoWithoutAspectRatio)?;
    if ratio.is_finite() && ratio > 0.0 {
        Ok(ratio)
    } else {
        Err(PlacementError::InvalidAspectRatio(ratio))
    }
}
