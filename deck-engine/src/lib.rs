//! # Deck Engine
//!
//! Atomic, stateless mutations for slide deck documents. Each operation
//! opens a document, applies one semantic change, and persists the result
//! with enough safety and auditability that autonomous callers can chain
//! operations without corrupting the document or losing track of its
//! structural state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 deck-engine                 │
//! ├─────────────────────────────────────────────┤
//! │  Placement       │  Fingerprint             │
//! │  - 4 schemes     │  - geometry + text       │
//! │  - auto sizing   │  - change detection      │
//! ├─────────────────────────────────────────────┤
//! │  Lock            │  Approval    │ Validate  │
//! │  - marker file   │  - scoped    │ - struct. │
//! │  - bounded wait  │  - signed    │ - a11y    │
//! ├─────────────────────────────────────────────┤
//! │              Mutation Session               │
//! │  lock → load → mutate → digest → persist    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Slide and shape indices returned by reads are **ephemeral**: any insert,
//! remove, or reorder invalidates them (the report says so via
//! `invalidates_indices`), and a stale index fails loudly instead of
//! silently targeting the wrong element.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod approval;
pub mod error;
pub mod fingerprint;
pub mod lock;
pub mod placement;
pub mod policy;
pub mod report;
pub mod session;
pub mod strategy;
pub mod validate;

pub use approval::{ApprovalError, ApprovalGate, ApprovalToken, SCOPE_DELETE_SLIDE, SCOPE_REMOVE_SHAPE};
pub use error::{EngineError, EngineResult};
pub use fingerprint::{compute as compute_fingerprint, PresentationFingerprint};
pub use lock::{acquire as acquire_lock, lock_path_for, LockError, LockHandle};
pub use placement::{AnchorPoint, Dimension, Frac, Placement, PlacementError, DEFAULT_GRID_SIZE};
pub use policy::{PolicyVerdict, ValidationPolicy};
pub use report::MutationReport;
pub use session::{
    describe_document, fingerprint_document, validate_document, DocumentSnapshot, EngineConfig,
    MutationSession, NewImage, ShapeSummary, SlideSummary, ValidationRun,
};
pub use strategy::StrategyOutcome;
pub use validate::{IssueCategory, Severity, StructureReport, ValidationIssue};

/// Deck engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
