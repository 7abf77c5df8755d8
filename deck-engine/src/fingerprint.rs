//! Deterministic content-and-geometry fingerprints for change detection.
//!
//! The digest folds in slide count, the layout sequence, every shape's
//! geometry, and all run-level text, in document traversal order. Volatile
//! metadata (element ids, the mutation generation, file timestamps) is
//! deliberately excluded: a no-op save never changes the digest, while any
//! structural, geometric, or textual change must.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use deck_core::{Presentation, ShapeContent, TextFrame};

/// Number of hex characters shown by the short display form.
pub const SHORT_DIGEST_LEN: usize = 12;

/// A deterministic digest of a document's structural and textual state,
/// together with the ordered inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationFingerprint {
    /// Full hex SHA-256 digest; use this for equality checks.
    digest: String,
    /// Number of slides at capture time.
    pub slide_count: usize,
    /// Per-slide layout identifiers in document order.
    pub layouts: Vec<String>,
    /// Sub-digest of the concatenated shape geometry sequence.
    pub geometry_digest: String,
    /// Sub-digest of the concatenated run text sequence.
    pub text_digest: String,
}

impl PresentationFingerprint {
    /// The full hex digest.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// A fixed-length prefix of the digest for display.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.digest[..SHORT_DIGEST_LEN.min(self.digest.len())]
    }
}

impl std::fmt::Display for PresentationFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Compute the fingerprint of a document.
///
/// Traversal order is deterministic: slides in document order, shapes within
/// a slide in z-order, paragraphs and runs in document order. Geometry is
/// captured in EMU so the digest never depends on float formatting.
#[must_use]
pub fn compute(presentation: &Presentation) -> PresentationFingerprint {
    let mut geometry = Sha256::new();
    let mut text = Sha256::new();
    let mut layouts = Vec::with_capacity(presentation.slide_count());

    for slide in presentation.slides() {
        layouts.push(slide.layout.clone());
        for shape in slide.shapes() {
            let (left, top, width, height) = shape.frame.to_emu();
            geometry.update(format!("{left}:{top}:{width}:{height};"));
            match &shape.content {
                ShapeContent::Text { frame } => {
                    text.update(shape_text(frame));
                    text.update(";");
                }
                ShapeContent::Picture {
                    source, alt_text, ..
                } => {
                    text.update(source);
                    text.update(alt_text.as_deref().unwrap_or(""));
                    text.update(";");
                }
            }
        }
    }

    let geometry_digest = hex::encode(geometry.finalize());
    let text_digest = hex::encode(text.finalize());

    let mut combined = Sha256::new();
    combined.update(format!("slides:{}\n", presentation.slide_count()));
    for layout in &layouts {
        combined.update(format!("layout:{layout}\n"));
    }
    combined.update(format!("geometry:{geometry_digest}\n"));
    combined.update(format!("text:{text_digest}\n"));

    PresentationFingerprint {
        digest: hex::encode(combined.finalize()),
        slide_count: presentation.slide_count(),
        layouts,
        geometry_digest,
        text_digest,
    }
}

/// All run text of a shape in paragraph/run order.
fn shape_text(frame: &TextFrame) -> String {
    frame
        .paragraphs
        .iter()
        .flat_map(|p| p.runs.iter())
        .map(|r| r.text.as_str())
        .collect()
}
