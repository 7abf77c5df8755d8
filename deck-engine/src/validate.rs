//! Structural, accessibility, and asset-quality checks over a document.
//!
//! All checks are read-only and independent of each other; they produce
//! fresh categorized issues on every run and persist nothing. Aggregating
//! issues to a pass/fail decision is the policy layer's job (see
//! [`crate::policy`]).

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use deck_core::{Presentation, ShapeContent};

/// Minimum foreground/background contrast ratio for body text (WCAG AA).
pub const MIN_CONTRAST_RATIO: f32 = 4.5;

/// Minimum explicit font size in points before a readability warning.
pub const MIN_FONT_SIZE_PT: f32 = 12.0;

/// Embedded image size above which an informational issue is raised.
pub const MAX_IMAGE_BYTES: u64 = 1_048_576; // 1MB

/// Document file size above which a warning is raised.
pub const MAX_DOCUMENT_BYTES: u64 = 10_485_760; // 10MB

/// Background color assumed for contrast checks when none is modeled.
const DEFAULT_BACKGROUND: (u8, u8, u8) = (0xFF, 0xFF, 0xFF);

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed; the deck is broken or unusable for some audience.
    Critical,
    /// Should be fixed; degrades quality or accessibility.
    Warning,
    /// Worth knowing; no action required.
    Info,
}

/// The check family an issue came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    /// Slide/shape structure checks.
    Structure,
    /// Accessibility checks.
    Accessibility,
    /// Embedded asset and package size checks.
    Asset,
}

/// One categorized finding from a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// The check family.
    pub category: IssueCategory,
    /// How serious the finding is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// The slide the finding applies to, if slide-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,
    /// The shape the finding applies to, if shape-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_index: Option<usize>,
}

impl ValidationIssue {
    fn slide(category: IssueCategory, severity: Severity, slide: usize, message: String) -> Self {
        Self {
            category,
            severity,
            message,
            slide_index: Some(slide),
            shape_index: None,
        }
    }

    fn shape(
        category: IssueCategory,
        severity: Severity,
        slide: usize,
        shape: usize,
        message: String,
    ) -> Self {
        Self {
            category,
            severity,
            message,
            slide_index: Some(slide),
            shape_index: Some(shape),
        }
    }
}

/// Result of the structural pass: issues plus the font census collected for
/// downstream policy checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureReport {
    /// Structural findings.
    pub issues: Vec<ValidationIssue>,
    /// Distinct font family names used by any text run, sorted.
    pub fonts_in_use: Vec<String>,
}

/// Run the structural checks.
///
/// A slide with zero shapes is critical; a slide without any title-role
/// shape (either title placeholder variant) is a warning.
#[must_use]
pub fn check_structure(presentation: &Presentation) -> StructureReport {
    let mut issues = Vec::new();
    let mut fonts = BTreeSet::new();

    for (slide_index, slide) in presentation.slides().iter().enumerate() {
        if slide.shapes().is_empty() {
            issues.push(ValidationIssue::slide(
                IssueCategory::Structure,
                Severity::Critical,
                slide_index,
                format!("Slide {} has no elements", slide_index + 1),
            ));
        }
        if slide.title_shape().is_none() && !slide.shapes().is_empty() {
            issues.push(ValidationIssue::slide(
                IssueCategory::Structure,
                Severity::Warning,
                slide_index,
                format!("Slide {} has no title", slide_index + 1),
            ));
        }

        for shape in slide.shapes() {
            if let ShapeContent::Text { frame } = &shape.content {
                for run in frame.paragraphs.iter().flat_map(|p| p.runs.iter()) {
                    if let Some(font) = &run.font {
                        fonts.insert(font.clone());
                    }
                }
            }
        }
    }

    StructureReport {
        issues,
        fonts_in_use: fonts.into_iter().collect(),
    }
}

/// Run the accessibility checks.
///
/// An image without alternate text is critical; text below the WCAG AA
/// contrast ratio or the minimum point size is a warning. Contrast is
/// evaluated against a white background, the default of every standard
/// layout.
#[must_use]
pub fn check_accessibility(presentation: &Presentation) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (slide_index, slide) in presentation.slides().iter().enumerate() {
        for (shape_index, shape) in slide.shapes().iter().enumerate() {
            match &shape.content {
                ShapeContent::Picture { alt_text, .. } => {
                    if alt_text.as_deref().map_or(true, |alt| alt.trim().is_empty()) {
                        issues.push(ValidationIssue::shape(
                            IssueCategory::Accessibility,
                            Severity::Critical,
                            slide_index,
                            shape_index,
                            format!(
                                "Image on slide {} has no alternate text",
                                slide_index + 1
                            ),
                        ));
                    }
                }
                ShapeContent::Text { frame } => {
                    for run in frame.paragraphs.iter().flat_map(|p| p.runs.iter()) {
                        if let Some(rgb) = run.color.as_deref().and_then(parse_hex_color) {
                            let ratio = contrast_ratio(
                                relative_luminance(rgb),
                                relative_luminance(DEFAULT_BACKGROUND),
                            );
                            if ratio < MIN_CONTRAST_RATIO {
                                issues.push(ValidationIssue::shape(
                                    IssueCategory::Accessibility,
                                    Severity::Warning,
                                    slide_index,
                                    shape_index,
                                    format!(
                                        "Text contrast {ratio:.2}:1 is below {MIN_CONTRAST_RATIO}:1 on slide {}",
                                        slide_index + 1
                                    ),
                                ));
                            }
                        }
                        if let Some(size) = run.size_pt {
                            if size < MIN_FONT_SIZE_PT {
                                issues.push(ValidationIssue::shape(
                                    IssueCategory::Accessibility,
                                    Severity::Warning,
                                    slide_index,
                                    shape_index,
                                    format!(
                                        "Text at {size}pt is below the {MIN_FONT_SIZE_PT}pt minimum on slide {}",
                                        slide_index + 1
                                    ),
                                ));
                            }
                        }
                    }
                }
            }
        }
    }

    issues
}

/// Run the asset checks against the document graph and its on-disk file.
///
/// Oversized embedded images are informational; an oversized document file
/// is a warning. A missing document file contributes no size finding.
#[must_use]
pub fn check_assets(presentation: &Presentation, path: &Path) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (slide_index, slide) in presentation.slides().iter().enumerate() {
        for (shape_index, shape) in slide.shapes().iter().enumerate() {
            if let ShapeContent::Picture {
                byte_len: Some(len),
                ..
            } = &shape.content
            {
                if *len > MAX_IMAGE_BYTES {
                    issues.push(ValidationIssue::shape(
                        IssueCategory::Asset,
                        Severity::Info,
                        slide_index,
                        shape_index,
                        format!(
                            "Embedded image is {len} bytes (threshold {MAX_IMAGE_BYTES})"
                        ),
                    ));
                }
            }
        }
    }

    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_DOCUMENT_BYTES => {
            issues.push(ValidationIssue {
                category: IssueCategory::Asset,
                severity: Severity::Warning,
                message: format!(
                    "Document is {} bytes (threshold {MAX_DOCUMENT_BYTES})",
                    meta.len()
                ),
                slide_index: None,
                shape_index: None,
            });
        }
        Ok(_) => {}
        Err(e) => {
            tracing::debug!("Skipping document size check for {}: {e}", path.display());
        }
    }

    issues
}

/// Parse a `#RRGGBB` color string.
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// WCAG relative luminance of an sRGB color.
fn relative_luminance((r, g, b): (u8, u8, u8)) -> f32 {
    fn channel(v: u8) -> f32 {
        let c = f32::from(v) / 255.0;
        if c <= 0.039_28 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// WCAG contrast ratio between two relative luminances.
fn contrast_ratio(l1: f32, l2: f32) -> f32 {
    let (lighter, darker) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}
