//! # Deck Core
//!
//! The editable object graph behind a slide deck document: an ordered slide
//! collection, per-slide ordered shapes, placeholder role classification,
//! shape geometry in physical units, and run-level text access.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  deck-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Document Graph  │  Persistence             │
//! │  - Presentation  │  - JSON document file    │
//! │  - Slides        │  - Atomic replace        │
//! │  - Shapes/runs   │  - Format versioning     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The packaged wire format of real presentation files is deliberately not
//! handled here; this crate is the editable-graph collaborator that the
//! mutation engine loads, edits, and persists.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod error;
pub mod store;

pub use document::{
    Frame, Paragraph, PlaceholderRole, Presentation, Shape, ShapeContent, ShapeId, Slide, SlideId,
    TextFrame, TextRun, EMU_PER_INCH,
};
pub use error::{CoreError, CoreResult};
pub use store::{load, save, StoreError, FORMAT_VERSION};

/// Deck core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
