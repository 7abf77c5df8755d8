//! The document graph - presentations, slides, shapes, and text runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// English Metric Units per inch, the integral unit used by presentation
/// packages for geometry.
pub const EMU_PER_INCH: i64 = 914_400;

/// Unique identifier for a slide, assigned at creation and stable across
/// reorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlideId(Uuid);

impl SlideId {
    /// Create a new unique slide ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlideId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SlideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a shape, assigned at creation and stable across
/// edits to sibling shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(Uuid);

impl ShapeId {
    /// Create a new unique shape ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder role classification for a shape.
///
/// Mirrors the role a shape plays on its slide layout. `CenteredTitle` is the
/// variant used by title-only layouts; both it and `Title` count as the
/// slide's title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderRole {
    /// The slide title placeholder.
    Title,
    /// The centered title variant used on section/title layouts.
    CenteredTitle,
    /// A subtitle placeholder.
    Subtitle,
    /// A body text placeholder.
    Body,
    /// A picture placeholder.
    Picture,
    /// Not a placeholder.
    Free,
}

impl PlaceholderRole {
    /// Whether this role carries the slide title.
    #[must_use]
    pub const fn is_title(self) -> bool {
        matches!(self, Self::Title | Self::CenteredTitle)
    }
}

/// Position and size of a shape on its slide, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Distance from the slide's left edge.
    pub left: f32,
    /// Distance from the slide's top edge.
    pub top: f32,
    /// Shape width.
    pub width: f32,
    /// Shape height.
    pub height: f32,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Frame {
    /// Create a frame from position and size.
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The frame geometry in English Metric Units.
    ///
    /// EMU values are integral, which keeps geometry comparisons and digests
    /// independent of float formatting.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // slide geometry is far below i64 EMU range
    pub fn to_emu(self) -> (i64, i64, i64, i64) {
        let emu = |v: f32| (f64::from(v) * EMU_PER_INCH as f64).round() as i64;
        (
            emu(self.left),
            emu(self.top),
            emu(self.width),
            emu(self.height),
        )
    }
}

/// A single run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The run's text content.
    pub text: String,
    /// Font family name, if set explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Font size in points, if set explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_pt: Option<f32>,
    /// Text color as `#RRGGBB`, if set explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Bold flag.
    #[serde(default)]
    pub bold: bool,
}

impl TextRun {
    /// Create a plain run with no explicit formatting.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: None,
            size_pt: None,
            color: None,
            bold: false,
        }
    }

    /// Set the font family.
    #[must_use]
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    /// Set the font size in points.
    #[must_use]
    pub fn with_size(mut self, size_pt: f32) -> Self {
        self.size_pt = Some(size_pt);
        self
    }

    /// Set the text color as `#RRGGBB`.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A paragraph: an ordered sequence of text runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Runs in document order.
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    /// Create a paragraph holding a single plain run.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::new(text)],
        }
    }
}

/// The text body of a shape: ordered paragraphs of ordered runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFrame {
    /// Paragraphs in document order.
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    /// Create a text frame holding a single paragraph of plain text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            paragraphs: vec![Paragraph::from_text(text)],
        }
    }

    /// All run text concatenated in paragraph/run order, paragraphs joined
    /// with newlines.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.runs.iter().map(|r| r.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the entire body with a single paragraph of plain text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.paragraphs = vec![Paragraph::from_text(text)];
    }
}

/// The content a shape carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShapeContent {
    /// A text box.
    Text {
        /// The text body.
        frame: TextFrame,
    },

    /// An embedded image.
    Picture {
        /// Image source reference (path or URI).
        source: String,
        /// Alternate text for assistive technology.
        #[serde(skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
        /// Encoded size of the embedded image in bytes, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        byte_len: Option<u64>,
        /// Source width/height ratio, when known at embed time.
        #[serde(skip_serializing_if = "Option::is_none")]
        aspect_ratio: Option<f32>,
    },
}

/// A shape on a slide: stable identity, placeholder role, geometry, content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier.
    pub id: ShapeId,
    /// Placeholder role classification.
    pub role: PlaceholderRole,
    /// Position and size in inches.
    pub frame: Frame,
    /// Shape content.
    pub content: ShapeContent,
}

impl Shape {
    /// Create a free shape with the given content and a default frame.
    #[must_use]
    pub fn new(content: ShapeContent) -> Self {
        Self {
            id: ShapeId::new(),
            role: PlaceholderRole::Free,
            frame: Frame::default(),
            content,
        }
    }

    /// Set the frame.
    #[must_use]
    pub const fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Set the placeholder role.
    #[must_use]
    pub const fn with_role(mut self, role: PlaceholderRole) -> Self {
        self.role = role;
        self
    }

    /// The shape's text body, if it is a text shape.
    #[must_use]
    pub fn text_frame(&self) -> Option<&TextFrame> {
        match &self.content {
            ShapeContent::Text { frame } => Some(frame),
            ShapeContent::Picture { .. } => None,
        }
    }

    /// Mutable access to the shape's text body, if it is a text shape.
    pub fn text_frame_mut(&mut self) -> Option<&mut TextFrame> {
        match &mut self.content {
            ShapeContent::Text { frame } => Some(frame),
            ShapeContent::Picture { .. } => None,
        }
    }
}

/// A slide: a layout name and an ordered shape collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Unique identifier.
    pub id: SlideId,
    /// Layout name this slide was created from.
    pub layout: String,
    /// Shapes in z-order (first is bottom-most).
    shapes: Vec<Shape>,
}

impl Slide {
    /// Create an empty slide from the given layout name.
    #[must_use]
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            id: SlideId::new(),
            layout: layout.into(),
            shapes: Vec::new(),
        }
    }

    /// Shapes in z-order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// The number of shapes on this slide.
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Get a shape by index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeNotFound`] if the index is out of range.
    pub fn shape(&self, index: usize) -> CoreResult<&Shape> {
        self.shapes.get(index).ok_or(CoreError::ShapeNotFound {
            requested: index,
            available: self.shapes.len(),
        })
    }

    /// Get a mutable shape by index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeNotFound`] if the index is out of range.
    pub fn shape_mut(&mut self, index: usize) -> CoreResult<&mut Shape> {
        let available = self.shapes.len();
        self.shapes.get_mut(index).ok_or(CoreError::ShapeNotFound {
            requested: index,
            available,
        })
    }

    /// Append a shape, returning its index.
    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    /// Insert a shape at `index`, shifting later shapes up.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeNotFound`] if `index` is past the end of
    /// the collection.
    pub fn insert_shape(&mut self, index: usize, shape: Shape) -> CoreResult<()> {
        if index > self.shapes.len() {
            return Err(CoreError::ShapeNotFound {
                requested: index,
                available: self.shapes.len(),
            });
        }
        self.shapes.insert(index, shape);
        Ok(())
    }

    /// Remove and return the shape at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeNotFound`] if the index is out of range.
    pub fn remove_shape(&mut self, index: usize) -> CoreResult<Shape> {
        if index >= self.shapes.len() {
            return Err(CoreError::ShapeNotFound {
                requested: index,
                available: self.shapes.len(),
            });
        }
        Ok(self.shapes.remove(index))
    }

    /// The current position of the shape with the given stable id.
    ///
    /// Returns `None` when the shape is no longer on this slide; positions
    /// shift on insert, remove, and reorder, so resolve again after any
    /// structural mutation.
    #[must_use]
    pub fn position_of(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    /// The slide's title shape and its index, if one exists.
    ///
    /// Both the regular and the centered title placeholder variants count.
    #[must_use]
    pub fn title_shape(&self) -> Option<(usize, &Shape)> {
        self.shapes
            .iter()
            .enumerate()
            .find(|(_, s)| s.role.is_title())
    }

    /// The slide's title text, if a title shape with text exists.
    #[must_use]
    pub fn title_text(&self) -> Option<String> {
        self.title_shape()
            .and_then(|(_, s)| s.text_frame())
            .map(TextFrame::plain_text)
    }

    /// A deep copy of this slide with fresh slide and shape identities.
    #[must_use]
    pub fn duplicated(&self) -> Self {
        let mut copy = self.clone();
        copy.id = SlideId::new();
        for shape in &mut copy.shapes {
            shape.id = ShapeId::new();
        }
        copy
    }
}

/// A presentation document: slide size, ordered slides, and a mutation
/// generation counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Slide width in inches.
    pub slide_width: f32,
    /// Slide height in inches.
    pub slide_height: f32,
    /// Bumped by every structural mutation (insert, remove, reorder).
    /// Shape and slide indices reported before the bump are no longer valid.
    generation: u64,
    /// Slides in document order.
    slides: Vec<Slide>,
}

impl Presentation {
    /// Standard 4:3 slide width in inches.
    pub const DEFAULT_WIDTH: f32 = 10.0;
    /// Standard 4:3 slide height in inches.
    pub const DEFAULT_HEIGHT: f32 = 7.5;

    /// Create an empty presentation with the given slide size in inches.
    #[must_use]
    pub fn new(slide_width: f32, slide_height: f32) -> Self {
        Self {
            slide_width,
            slide_height,
            generation: 0,
            slides: Vec::new(),
        }
    }

    /// Slides in document order.
    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// The number of slides in the document.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// The current mutation generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance the mutation generation.
    ///
    /// Called by the mutation layer after any insert, remove, or reorder;
    /// indices reported under earlier generations must be re-derived.
    pub fn bump_generation(&mut self) {
        self.generation += 1;
    }

    /// Get a slide by index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlideNotFound`] if the index is out of range.
    pub fn slide(&self, index: usize) -> CoreResult<&Slide> {
        self.slides.get(index).ok_or(CoreError::SlideNotFound {
            requested: index,
            available: self.slides.len(),
        })
    }

    /// Get a mutable slide by index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlideNotFound`] if the index is out of range.
    pub fn slide_mut(&mut self, index: usize) -> CoreResult<&mut Slide> {
        let available = self.slides.len();
        self.slides.get_mut(index).ok_or(CoreError::SlideNotFound {
            requested: index,
            available,
        })
    }

    /// Append a slide, returning its index.
    pub fn add_slide(&mut self, slide: Slide) -> usize {
        self.slides.push(slide);
        self.slides.len() - 1
    }

    /// Insert a slide at `index`, shifting later slides back.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlideNotFound`] if `index` is past the end of
    /// the collection.
    pub fn insert_slide(&mut self, index: usize, slide: Slide) -> CoreResult<()> {
        if index > self.slides.len() {
            return Err(CoreError::SlideNotFound {
                requested: index,
                available: self.slides.len(),
            });
        }
        self.slides.insert(index, slide);
        Ok(())
    }

    /// Remove and return the slide at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlideNotFound`] if the index is out of range.
    pub fn remove_slide(&mut self, index: usize) -> CoreResult<Slide> {
        if index >= self.slides.len() {
            return Err(CoreError::SlideNotFound {
                requested: index,
                available: self.slides.len(),
            });
        }
        Ok(self.slides.remove(index))
    }

    /// The current position of the slide with the given stable id.
    ///
    /// Returns `None` when the slide is no longer in the document; positions
    /// shift on insert, remove, and reorder, so resolve again after any
    /// structural mutation.
    #[must_use]
    pub fn position_of(&self, id: SlideId) -> Option<usize> {
        self.slides.iter().position(|s| s.id == id)
    }

    /// Move the slide at `from` to position `to`, shifting slides between.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlideNotFound`] if either index is out of range.
    pub fn move_slide(&mut self, from: usize, to: usize) -> CoreResult<()> {
        let available = self.slides.len();
        if from >= available {
            return Err(CoreError::SlideNotFound {
                requested: from,
                available,
            });
        }
        if to >= available {
            return Err(CoreError::SlideNotFound {
                requested: to,
                available,
            });
        }
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        Ok(())
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}
