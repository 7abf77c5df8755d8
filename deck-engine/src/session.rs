//! Mutation sessions: the load → mutate → fingerprint → persist unit of work.
//!
//! A [`MutationSession`] holds the exclusive document lock from open to
//! close. Every mutating operation consumes the session, so exactly one
//! mutation is applied per session by construction; the document is
//! persisted only after the mutation and the post-state fingerprint both
//! succeed, and the lock is released on every exit path (including drop).
//!
//! Read-only entry points ([`fingerprint_document`], [`describe_document`],
//! [`validate_document`]) bypass the lock entirely.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use deck_core::{
    Frame, PlaceholderRole, Presentation, Shape, ShapeContent, TextFrame,
};

use crate::approval::{ApprovalGate, ApprovalToken, SCOPE_DELETE_SLIDE, SCOPE_REMOVE_SHAPE};
use crate::error::{EngineError, EngineResult};
use crate::fingerprint::{self, PresentationFingerprint};
use crate::lock::{self, LockHandle};
use crate::placement::{resolve_size, Dimension, Placement};
use crate::policy::{PolicyVerdict, ValidationPolicy};
use crate::report::MutationReport;
use crate::strategy::StrategyOutcome;
use crate::validate::{self, ValidationIssue};

/// Fraction of the slide width/height used as the margin of a created
/// title box.
const TITLE_MARGIN_FRAC: f32 = 0.05;

/// Fraction of the slide height a created title box occupies.
const TITLE_BAND_FRAC: f32 = 0.15;

/// Engine configuration, injected at session construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Shared key used to verify approval-token signatures.
    pub verification_key: Vec<u8>,
    /// How long lock acquisition may wait before timing out.
    pub lock_timeout: Duration,
    /// How often lock acquisition re-attempts while contended.
    pub lock_poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verification_key: Vec::new(),
            lock_timeout: Duration::from_secs(10),
            lock_poll_interval: Duration::from_millis(100),
        }
    }
}

/// A new or replacement image, described at the operation boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImage {
    /// Image source reference (path or URI).
    pub source: String,
    /// Alternate text for assistive technology.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    /// Source width/height ratio, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    /// Encoded size in bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_len: Option<u64>,
}

/// An exclusive mutation session over one document file.
///
/// Obtained from [`MutationSession::open`]; apply exactly one operation,
/// which consumes the session and persists the document.
#[derive(Debug)]
pub struct MutationSession {
    path: PathBuf,
    config: EngineConfig,
    lock: LockHandle,
    deck: Presentation,
    fingerprint_before: PresentationFingerprint,
}

impl MutationSession {
    /// Acquire the document lock and load the document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Lock`] if the lock cannot be acquired within
    /// the configured timeout, or [`EngineError::Document`] if the document
    /// cannot be loaded.
    pub fn open(path: impl Into<PathBuf>, config: EngineConfig) -> EngineResult<Self> {
        let path = path.into();
        let lock = lock::acquire(&path, config.lock_timeout, config.lock_poll_interval)?;
        let deck = deck_core::load(&path)?;
        let fingerprint_before = fingerprint::compute(&deck);
        tracing::debug!(
            "Opened session on {} at fingerprint {}",
            path.display(),
            fingerprint_before.short()
        );
        Ok(Self {
            path,
            config,
            lock,
            deck,
            fingerprint_before,
        })
    }

    /// The loaded document.
    #[must_use]
    pub fn document(&self) -> &Presentation {
        &self.deck
    }

    /// The fingerprint captured at load time.
    #[must_use]
    pub fn fingerprint_before(&self) -> &PresentationFingerprint {
        &self.fingerprint_before
    }

    /// Close the session without mutating, releasing the lock.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Lock`] if the lock marker cannot be removed.
    pub fn close(mut self) -> EngineResult<()> {
        self.lock.release()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Content and geometry edits (index-preserving)
    // -----------------------------------------------------------------------

    /// Replace the text of an existing text shape.
    ///
    /// # Errors
    ///
    /// Fails with the element-not-found taxonomy for stale indices and with
    /// [`EngineError::InvalidOperation`] if the shape is not a text shape.
    pub fn edit_text(
        mut self,
        slide_index: usize,
        shape_index: usize,
        text: &str,
    ) -> EngineResult<MutationReport> {
        let shape = self.deck.slide_mut(slide_index)?.shape_mut(shape_index)?;
        let frame = shape.text_frame_mut().ok_or_else(|| {
            EngineError::InvalidOperation(format!(
                "shape {shape_index} on slide {slide_index} is not a text shape"
            ))
        })?;
        frame.set_text(text);
        self.finish("edit_text", false, None)
    }

    /// Set the slide title, creating a title box if the slide has none.
    ///
    /// Updating an existing title is a pure content edit; creating a title
    /// box is an insert and therefore invalidates indices.
    ///
    /// # Errors
    ///
    /// Fails with the element-not-found taxonomy for a stale slide index.
    pub fn set_slide_title(
        mut self,
        slide_index: usize,
        text: &str,
    ) -> EngineResult<MutationReport> {
        let (slide_width, slide_height) = (self.deck.slide_width, self.deck.slide_height);
        let slide = self.deck.slide_mut(slide_index)?;

        if let Some((title_index, _)) = slide.title_shape() {
            let frame = slide
                .shape_mut(title_index)?
                .text_frame_mut()
                .ok_or_else(|| {
                    EngineError::InvalidOperation(format!(
                        "title shape {title_index} on slide {slide_index} has no text body"
                    ))
                })?;
            frame.set_text(text);
            let detail = serde_json::json!({ "created": false, "shape_index": title_index });
            return self.finish("set_slide_title", false, Some(detail));
        }

        let title_frame = Frame::new(
            TITLE_MARGIN_FRAC * slide_width,
            TITLE_MARGIN_FRAC * slide_height,
            (1.0 - 2.0 * TITLE_MARGIN_FRAC) * slide_width,
            TITLE_BAND_FRAC * slide_height,
        );
        let shape_index = slide.add_shape(
            Shape::new(ShapeContent::Text {
                frame: TextFrame::from_text(text),
            })
            .with_role(PlaceholderRole::Title)
            .with_frame(title_frame),
        );
        let detail = serde_json::json!({ "created": true, "shape_index": shape_index });
        self.finish("set_slide_title", true, Some(detail))
    }

    /// Move an existing shape to a new resolved position.
    ///
    /// # Errors
    ///
    /// Fails with the element-not-found taxonomy for stale indices or the
    /// placement taxonomy for unresolvable placements.
    pub fn move_shape(
        mut self,
        slide_index: usize,
        shape_index: usize,
        placement: &Placement,
    ) -> EngineResult<MutationReport> {
        let (left, top) =
            placement.resolve_position(self.deck.slide_width, self.deck.slide_height)?;
        let shape = self.deck.slide_mut(slide_index)?.shape_mut(shape_index)?;
        shape.frame.left = left;
        shape.frame.top = top;
        self.finish("move_shape", false, None)
    }

    /// Resize an existing shape.
    ///
    /// For picture shapes with a known source aspect ratio, one dimension
    /// may be [`Dimension::Auto`].
    ///
    /// # Errors
    ///
    /// Fails with the element-not-found taxonomy for stale indices or the
    /// placement taxonomy for unresolvable dimensions.
    pub fn resize_shape(
        mut self,
        slide_index: usize,
        shape_index: usize,
        width: Dimension,
        height: Dimension,
    ) -> EngineResult<MutationReport> {
        let (slide_width, slide_height) = (self.deck.slide_width, self.deck.slide_height);
        let shape = self.deck.slide_mut(slide_index)?.shape_mut(shape_index)?;
        let aspect = match &shape.content {
            ShapeContent::Picture { aspect_ratio, .. } => *aspect_ratio,
            ShapeContent::Text { .. } => None,
        };
        let (w, h) = resolve_size(width, height, slide_width, slide_height, aspect)?;
        shape.frame.width = w;
        shape.frame.height = h;
        self.finish("resize_shape", false, None)
    }

    /// Replace an image using the ordered strategy chain.
    ///
    /// A picture shape is updated in place (`swap_source`); any other shape
    /// is torn down and recreated as a picture with the same frame and role
    /// (`recreate`). The report's detail names the strategy that applied.
    ///
    /// # Errors
    ///
    /// Fails with the element-not-found taxonomy for stale indices.
    pub fn replace_image(
        mut self,
        slide_index: usize,
        shape_index: usize,
        image: NewImage,
    ) -> EngineResult<MutationReport> {
        let slide = self.deck.slide_mut(slide_index)?;
        let mut attempts = Vec::new();

        let is_picture = matches!(
            slide.shape(shape_index)?.content,
            ShapeContent::Picture { .. }
        );

        let invalidates = if is_picture {
            let shape = slide.shape_mut(shape_index)?;
            shape.content = ShapeContent::Picture {
                source: image.source,
                alt_text: image.alt_text,
                byte_len: image.byte_len,
                aspect_ratio: image.aspect_ratio,
            };
            attempts.push(StrategyOutcome::applied("swap_source"));
            false
        } else {
            attempts.push(StrategyOutcome::unsupported(
                "swap_source",
                "shape is not a picture",
            ));
            let removed = slide.remove_shape(shape_index)?;
            let replacement = Shape::new(ShapeContent::Picture {
                source: image.source,
                alt_text: image.alt_text,
                byte_len: image.byte_len,
                aspect_ratio: image.aspect_ratio,
            })
            .with_frame(removed.frame)
            .with_role(removed.role);
            slide.insert_shape(shape_index, replacement)?;
            attempts.push(StrategyOutcome::applied("recreate"));
            true
        };

        let applied = attempts
            .iter()
            .find(|a| a.is_applied())
            .cloned()
            .ok_or_else(|| EngineError::Internal("no replacement strategy applied".to_string()))?;
        let detail = serde_json::json!({ "attempts": attempts, "applied": applied });
        self.finish("replace_image", invalidates, Some(detail))
    }

    // -----------------------------------------------------------------------
    // Structural edits (index-invalidating)
    // -----------------------------------------------------------------------

    /// Add a text box at a resolved placement.
    ///
    /// # Errors
    ///
    /// Fails with the placement taxonomy for unresolvable placements or
    /// dimensions, or the element-not-found taxonomy for a stale slide index.
    pub fn add_text_box(
        mut self,
        slide_index: usize,
        placement: &Placement,
        width: Dimension,
        height: Dimension,
        text: &str,
    ) -> EngineResult<MutationReport> {
        let frame = self.resolve_frame(placement, width, height, None)?;
        let slide = self.deck.slide_mut(slide_index)?;
        let shape_index = slide.add_shape(
            Shape::new(ShapeContent::Text {
                frame: TextFrame::from_text(text),
            })
            .with_frame(frame),
        );
        let detail = serde_json::json!({ "shape_index": shape_index });
        self.finish("add_text_box", true, Some(detail))
    }

    /// Add an image at a resolved placement.
    ///
    /// One of `width`/`height` may be [`Dimension::Auto`] when the image's
    /// aspect ratio is known.
    ///
    /// # Errors
    ///
    /// Fails with the placement taxonomy for unresolvable placements or
    /// dimensions, or the element-not-found taxonomy for a stale slide index.
    pub fn add_image(
        mut self,
        slide_index: usize,
        placement: &Placement,
        width: Dimension,
        height: Dimension,
        image: NewImage,
    ) -> EngineResult<MutationReport> {
        let frame = self.resolve_frame(placement, width, height, image.aspect_ratio)?;
        let slide = self.deck.slide_mut(slide_index)?;
        let shape_index = slide.add_shape(
            Shape::new(ShapeContent::Picture {
                source: image.source,
                alt_text: image.alt_text,
                byte_len: image.byte_len,
                aspect_ratio: image.aspect_ratio,
            })
            .with_frame(frame),
        );
        let detail = serde_json::json!({ "shape_index": shape_index });
        self.finish("add_image", true, Some(detail))
    }

    /// Append an empty slide created from the given layout name.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::Document`] if the document cannot be
    /// persisted.
    pub fn add_slide(mut self, layout: &str) -> EngineResult<MutationReport> {
        let slide_index = self.deck.add_slide(deck_core::Slide::new(layout));
        let detail = serde_json::json!({ "slide_index": slide_index });
        self.finish("add_slide", true, Some(detail))
    }

    /// Duplicate a slide, inserting the copy directly after the original.
    ///
    /// The copy receives fresh slide and shape identities.
    ///
    /// # Errors
    ///
    /// Fails with the element-not-found taxonomy for a stale slide index.
    pub fn duplicate_slide(mut self, slide_index: usize) -> EngineResult<MutationReport> {
        let copy = self.deck.slide(slide_index)?.duplicated();
        self.deck.insert_slide(slide_index + 1, copy)?;
        let detail = serde_json::json!({ "slide_index": slide_index + 1 });
        self.finish("duplicate_slide", true, Some(detail))
    }

    /// Move a slide from one position to another.
    ///
    /// # Errors
    ///
    /// Fails with the element-not-found taxonomy if either index is out of
    /// range.
    pub fn move_slide(mut self, from: usize, to: usize) -> EngineResult<MutationReport> {
        self.deck.move_slide(from, to)?;
        self.finish("move_slide", true, None)
    }

    // -----------------------------------------------------------------------
    // Destructive edits (approval-gated)
    // -----------------------------------------------------------------------

    /// Delete a shape. Requires a token scoped to `remove:shape`.
    ///
    /// # Errors
    ///
    /// Fails with the approval taxonomy before any mutation if the token is
    /// invalid, and with the element-not-found taxonomy for stale indices.
    pub fn delete_shape(
        mut self,
        slide_index: usize,
        shape_index: usize,
        token: &ApprovalToken,
    ) -> EngineResult<MutationReport> {
        self.approve(token, SCOPE_REMOVE_SHAPE)?;
        let removed = self
            .deck
            .slide_mut(slide_index)?
            .remove_shape(shape_index)?;
        tracing::info!(
            "Deleted shape {shape_index} ({}) from slide {slide_index}",
            removed.id
        );
        self.finish("delete_shape", true, None)
    }

    /// Delete a slide. Requires a token scoped to `delete:slide`.
    ///
    /// # Errors
    ///
    /// Fails with the approval taxonomy before any mutation if the token is
    /// invalid, and with the element-not-found taxonomy for a stale index.
    pub fn delete_slide(
        mut self,
        slide_index: usize,
        token: &ApprovalToken,
    ) -> EngineResult<MutationReport> {
        self.approve(token, SCOPE_DELETE_SLIDE)?;
        let removed = self.deck.remove_slide(slide_index)?;
        tracing::info!("Deleted slide {slide_index} ({})", removed.id);
        self.finish("delete_slide", true, None)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Resolve a placement plus dimensions into a concrete frame.
    fn resolve_frame(
        &self,
        placement: &Placement,
        width: Dimension,
        height: Dimension,
        aspect_ratio: Option<f32>,
    ) -> EngineResult<Frame> {
        let (slide_width, slide_height) = (self.deck.slide_width, self.deck.slide_height);
        let (left, top) = placement.resolve_position(slide_width, slide_height)?;
        let (w, h) = resolve_size(width, height, slide_width, slide_height, aspect_ratio)?;
        Ok(Frame::new(left, top, w, h))
    }

    /// Validate an approval token against the configured verification key.
    fn approve(&self, token: &ApprovalToken, scope: &str) -> EngineResult<()> {
        let gate = ApprovalGate::new(self.config.verification_key.clone());
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        gate.validate(token, scope, now)?;
        Ok(())
    }

    /// Recompute the fingerprint, persist, release the lock, and build the
    /// report. The document file is untouched unless every prior step of
    /// the operation succeeded.
    fn finish(
        mut self,
        operation: &'static str,
        invalidates_indices: bool,
        detail: Option<serde_json::Value>,
    ) -> EngineResult<MutationReport> {
        if invalidates_indices {
            self.deck.bump_generation();
        }
        let fingerprint_after = fingerprint::compute(&self.deck);
        deck_core::save(&self.deck, &self.path)?;
        self.lock.release()?;
        tracing::info!(
            "Applied {operation} on {}: {} -> {}",
            self.path.display(),
            self.fingerprint_before.short(),
            fingerprint_after.short()
        );
        Ok(MutationReport {
            operation: operation.to_string(),
            fingerprint_before: self.fingerprint_before.digest().to_string(),
            fingerprint_after: fingerprint_after.digest().to_string(),
            invalidates_indices,
            generation: self.deck.generation(),
            detail,
        })
    }
}

// ---------------------------------------------------------------------------
// Read-only entry points (no exclusive lock)
// ---------------------------------------------------------------------------

/// Summary of one shape for structural reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeSummary {
    /// Current index within the slide (ephemeral).
    pub index: usize,
    /// Stable shape identifier, valid across structural mutations.
    pub id: String,
    /// Placeholder role.
    pub role: PlaceholderRole,
    /// Content kind (`"text"` or `"picture"`).
    pub kind: String,
    /// Position and size in inches.
    pub frame: Frame,
    /// Plain text for text shapes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Summary of one slide for structural reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideSummary {
    /// Current index within the document (ephemeral).
    pub index: usize,
    /// Stable slide identifier, valid across structural mutations.
    pub id: String,
    /// Layout name.
    pub layout: String,
    /// Title text, if the slide has a title shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Shapes in z-order.
    pub shapes: Vec<ShapeSummary>,
}

/// A structural description of the document, from which callers re-derive
/// element indices after any index-invalidating mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Number of slides.
    pub slide_count: usize,
    /// Mutation generation at read time.
    pub generation: u64,
    /// Full content fingerprint at read time.
    pub fingerprint: String,
    /// Per-slide summaries.
    pub slides: Vec<SlideSummary>,
}

/// Outcome of a full validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRun {
    /// All issues from the structural, accessibility, and asset passes.
    pub issues: Vec<ValidationIssue>,
    /// Distinct font family names in use, sorted.
    pub fonts_in_use: Vec<String>,
    /// Aggregated pass/fail under the requested policy.
    pub verdict: PolicyVerdict,
}

/// Compute the document's content fingerprint without taking the lock.
///
/// # Errors
///
/// Returns [`EngineError::Document`] if the document cannot be loaded.
pub fn fingerprint_document(path: &Path) -> EngineResult<PresentationFingerprint> {
    let deck = deck_core::load(path)?;
    Ok(fingerprint::compute(&deck))
}

/// Describe the document's structure without taking the lock.
///
/// # Errors
///
/// Returns [`EngineError::Document`] if the document cannot be loaded.
pub fn describe_document(path: &Path) -> EngineResult<DocumentSnapshot> {
    let deck = deck_core::load(path)?;
    let fingerprint = fingerprint::compute(&deck);

    let slides = deck
        .slides()
        .iter()
        .enumerate()
        .map(|(index, slide)| SlideSummary {
            index,
            id: slide.id.to_string(),
            layout: slide.layout.clone(),
            title: slide.title_text(),
            shapes: slide
                .shapes()
                .iter()
                .enumerate()
                .map(|(shape_index, shape)| ShapeSummary {
                    index: shape_index,
                    id: shape.id.to_string(),
                    role: shape.role,
                    kind: match shape.content {
                        ShapeContent::Text { .. } => "text".to_string(),
                        ShapeContent::Picture { .. } => "picture".to_string(),
                    },
                    frame: shape.frame,
                    text: shape.text_frame().map(TextFrame::plain_text),
                })
                .collect(),
        })
        .collect();

    Ok(DocumentSnapshot {
        slide_count: deck.slide_count(),
        generation: deck.generation(),
        fingerprint: fingerprint.digest().to_string(),
        slides,
    })
}

/// Run all validation passes and aggregate them under `policy`, without
/// taking the lock.
///
/// # Errors
///
/// Returns [`EngineError::Document`] if the document cannot be loaded.
pub fn validate_document(path: &Path, policy: ValidationPolicy) -> EngineResult<ValidationRun> {
    let deck = deck_core::load(path)?;

    let structure = validate::check_structure(&deck);
    let mut issues = structure.issues;
    issues.extend(validate::check_accessibility(&deck));
    issues.extend(validate::check_assets(&deck, path));

    let verdict = policy.evaluate(&issues);
    Ok(ValidationRun {
        issues,
        fonts_in_use: structure.fonts_in_use,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{AnchorPoint, Frac};
    use deck_core::Slide;

    const KEY: &[u8] = b"test-verification-key";

    fn config() -> EngineConfig {
        EngineConfig {
            verification_key: KEY.to_vec(),
            lock_timeout: Duration::from_secs(1),
            lock_poll_interval: Duration::from_millis(10),
        }
    }

    fn seed_document(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("deck.json");
        let mut deck = Presentation::default();
        let mut slide = Slide::new("title_and_content");
        slide.add_shape(
            Shape::new(ShapeContent::Text {
                frame: TextFrame::from_text("Agenda"),
            })
            .with_role(PlaceholderRole::Title)
            .with_frame(Frame::new(0.5, 0.4, 9.0, 1.1)),
        );
        deck.add_slide(slide);
        deck_core::save(&deck, &path).expect("seed save");
        path
    }

    fn valid_token(scope: &str) -> ApprovalToken {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_secs();
        ApprovalToken::signed(KEY, scope, "deck.json", now - 10, now + 600, false)
    }

    #[test]
    fn test_add_text_box_resolves_anchor_placement() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let session = MutationSession::open(&path, config()).expect("open");
        let placement = Placement::Anchor {
            point: AnchorPoint::BottomRight,
            offset_x: -0.5,
            offset_y: -0.3,
        };
        let report = session
            .add_text_box(
                0,
                &placement,
                Dimension::Inches(2.5),
                Dimension::Inches(0.3),
                "Confidential",
            )
            .expect("add");

        assert!(report.invalidates_indices);
        assert_ne!(report.fingerprint_before, report.fingerprint_after);

        let deck = deck_core::load(&path).expect("reload");
        let shape = deck.slide(0).expect("slide").shape(1).expect("shape");
        assert!((shape.frame.left - 9.5).abs() < 1e-4);
        assert!((shape.frame.top - 7.2).abs() < 1e-4);
    }

    #[test]
    fn test_set_slide_title_updates_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .set_slide_title(0, "New Agenda")
            .expect("set title");

        assert!(!report.invalidates_indices);
        let detail = report.detail.expect("detail");
        assert_eq!(detail["created"], false);

        let deck = deck_core::load(&path).expect("reload");
        assert_eq!(
            deck.slide(0).expect("slide").title_text().expect("title"),
            "New Agenda"
        );
    }

    #[test]
    fn test_set_slide_title_creates_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deck.json");
        let mut deck = Presentation::default();
        deck.add_slide(Slide::new("blank"));
        deck_core::save(&deck, &path).expect("seed");

        let report = MutationSession::open(&path, config())
            .expect("open")
            .set_slide_title(0, "Created")
            .expect("set title");

        assert!(report.invalidates_indices);
        assert_eq!(report.detail.expect("detail")["created"], true);

        let deck = deck_core::load(&path).expect("reload");
        let (_, title) = deck.slide(0).expect("slide").title_shape().expect("title");
        assert!((title.frame.top - 0.375).abs() < 1e-4);
        assert!((title.frame.height - 1.125).abs() < 1e-4);
    }

    #[test]
    fn test_edit_text_on_picture_is_invalid_operation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deck.json");
        let mut deck = Presentation::default();
        let mut slide = Slide::new("blank");
        slide.add_shape(Shape::new(ShapeContent::Picture {
            source: "logo.png".to_string(),
            alt_text: Some("logo".to_string()),
            byte_len: None,
            aspect_ratio: None,
        }));
        deck.add_slide(slide);
        deck_core::save(&deck, &path).expect("seed");

        let err = MutationSession::open(&path, config())
            .expect("open")
            .edit_text(0, 0, "nope")
            .expect_err("picture has no text");
        assert_eq!(err.kind(), "invalid_operation");

        // Failed mutation leaves the document untouched.
        let reloaded = deck_core::load(&path).expect("reload");
        assert_eq!(reloaded, deck);
    }

    #[test]
    fn test_stale_shape_index_is_element_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let err = MutationSession::open(&path, config())
            .expect("open")
            .edit_text(0, 7, "stale")
            .expect_err("out of bounds");
        assert!(matches!(
            err,
            EngineError::ShapeNotFound {
                requested: 7,
                available: 1
            }
        ));
    }

    #[test]
    fn test_replace_image_swaps_picture_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deck.json");
        let mut deck = Presentation::default();
        let mut slide = Slide::new("blank");
        slide.add_shape(
            Shape::new(ShapeContent::Picture {
                source: "old.png".to_string(),
                alt_text: Some("old".to_string()),
                byte_len: None,
                aspect_ratio: Some(1.0),
            })
            .with_frame(Frame::new(2.0, 2.0, 3.0, 3.0)),
        );
        deck.add_slide(slide);
        deck_core::save(&deck, &path).expect("seed");

        let report = MutationSession::open(&path, config())
            .expect("open")
            .replace_image(
                0,
                0,
                NewImage {
                    source: "new.png".to_string(),
                    alt_text: Some("new".to_string()),
                    aspect_ratio: Some(1.0),
                    byte_len: None,
                },
            )
            .expect("replace");

        assert!(!report.invalidates_indices);
        let detail = report.detail.expect("detail");
        assert_eq!(detail["applied"]["strategy"], "swap_source");
    }

    #[test]
    fn test_replace_image_recreates_non_picture() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .replace_image(
                0,
                0,
                NewImage {
                    source: "diagram.png".to_string(),
                    alt_text: Some("diagram".to_string()),
                    aspect_ratio: Some(1.5),
                    byte_len: None,
                },
            )
            .expect("replace");

        assert!(report.invalidates_indices);
        let detail = report.detail.expect("detail");
        assert_eq!(detail["applied"]["strategy"], "recreate");
        assert_eq!(detail["attempts"].as_array().expect("attempts").len(), 2);

        // Frame and role survive the recreation.
        let deck = deck_core::load(&path).expect("reload");
        let shape = deck.slide(0).expect("slide").shape(0).expect("shape");
        assert!(matches!(shape.content, ShapeContent::Picture { .. }));
        assert!((shape.frame.left - 0.5).abs() < 1e-4);
        assert_eq!(shape.role, PlaceholderRole::Title);
    }

    #[test]
    fn test_delete_shape_requires_matching_scope() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);
        let before = deck_core::load(&path).expect("load");

        let wrong_scope = valid_token(SCOPE_DELETE_SLIDE);
        let err = MutationSession::open(&path, config())
            .expect("open")
            .delete_shape(0, 0, &wrong_scope)
            .expect_err("scope mismatch");
        assert_eq!(err.kind(), "approval_token");

        // Gate rejection happens before any mutation.
        assert_eq!(deck_core::load(&path).expect("reload"), before);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .delete_shape(0, 0, &valid_token(SCOPE_REMOVE_SHAPE))
            .expect("delete");
        assert!(report.invalidates_indices);
        assert_eq!(
            deck_core::load(&path)
                .expect("reload")
                .slide(0)
                .expect("slide")
                .shape_count(),
            0
        );
    }

    #[test]
    fn test_delete_slide_with_valid_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .delete_slide(0, &valid_token(SCOPE_DELETE_SLIDE))
            .expect("delete");

        assert!(report.invalidates_indices);
        assert_eq!(deck_core::load(&path).expect("reload").slide_count(), 0);
    }

    #[test]
    fn test_generation_advances_only_on_structural_ops() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .edit_text(0, 0, "content edit")
            .expect("edit");
        assert_eq!(report.generation, 0);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .add_slide("blank")
            .expect("add");
        assert_eq!(report.generation, 1);
    }

    #[test]
    fn test_lock_released_after_operation_and_on_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);
        let lock_path = crate::lock::lock_path_for(&path);

        MutationSession::open(&path, config())
            .expect("open")
            .add_slide("blank")
            .expect("add");
        assert!(!lock_path.exists());

        MutationSession::open(&path, config())
            .expect("open")
            .edit_text(0, 99, "stale")
            .expect_err("out of bounds");
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_describe_document_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let snapshot = describe_document(&path).expect("describe");
        assert_eq!(snapshot.slide_count, 1);
        assert_eq!(snapshot.slides[0].title.as_deref(), Some("Agenda"));
        assert_eq!(snapshot.slides[0].shapes[0].kind, "text");

        let fp = fingerprint_document(&path).expect("fingerprint");
        assert_eq!(snapshot.fingerprint, fp.digest());
    }

    #[test]
    fn test_validate_document_runs_all_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deck.json");
        let mut deck = Presentation::default();
        deck.add_slide(Slide::new("blank")); // empty slide: critical
        let mut slide = Slide::new("blank");
        slide.add_shape(Shape::new(ShapeContent::Picture {
            source: "img.png".to_string(),
            alt_text: None, // critical
            byte_len: None,
            aspect_ratio: None,
        }));
        deck.add_slide(slide);
        deck_core::save(&deck, &path).expect("seed");

        let run = validate_document(&path, ValidationPolicy::Lenient).expect("validate");
        assert!(!run.verdict.passed);
        assert_eq!(run.verdict.critical_count, 2);
    }

    #[test]
    fn test_move_and_resize_preserve_indices() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .move_shape(
                0,
                0,
                &Placement::Percentage {
                    left: Frac::new(0.1),
                    top: Frac::new(0.2),
                },
            )
            .expect("move");
        assert!(!report.invalidates_indices);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .resize_shape(0, 0, Dimension::Inches(4.0), Dimension::Inches(2.0))
            .expect("resize");
        assert!(!report.invalidates_indices);

        let deck = deck_core::load(&path).expect("reload");
        let frame = deck.slide(0).expect("slide").shape(0).expect("shape").frame;
        assert!((frame.left - 1.0).abs() < 1e-4);
        assert!((frame.top - 1.5).abs() < 1e-4);
        assert!((frame.width - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_duplicate_slide_inserts_after_original() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seed_document(&dir);

        let report = MutationSession::open(&path, config())
            .expect("open")
            .duplicate_slide(0)
            .expect("duplicate");
        assert_eq!(report.detail.expect("detail")["slide_index"], 1);

        let deck = deck_core::load(&path).expect("reload");
        assert_eq!(deck.slide_count(), 2);
        assert_ne!(
            deck.slide(0).expect("a").id,
            deck.slide(1).expect("b").id
        );
        assert_eq!(
            deck.slide(0).expect("a").title_text(),
            deck.slide(1).expect("b").title_text()
        );
    }
}
