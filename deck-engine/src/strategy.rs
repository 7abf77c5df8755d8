//! Typed outcomes for best-effort edit strategies.
//!
//! Some edits have more than one way to apply (swap an image's source in
//! place, or tear the shape down and recreate it). Rather than hiding which
//! path ran, each strategy in an ordered chain reports a typed outcome and
//! the caller-visible result names the one that applied.

use serde::{Deserialize, Serialize};

/// The result of attempting one strategy from an ordered chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum StrategyOutcome {
    /// The strategy applied the edit.
    Applied {
        /// Name of the strategy that ran.
        strategy: String,
    },
    /// The strategy does not apply to this element.
    Unsupported {
        /// Name of the strategy that was skipped.
        strategy: String,
        /// Why it does not apply.
        reason: String,
    },
    /// The strategy applied but failed.
    Failed {
        /// Name of the strategy that failed.
        strategy: String,
        /// What went wrong.
        reason: String,
    },
}

impl StrategyOutcome {
    /// Build an applied outcome.
    #[must_use]
    pub fn applied(strategy: impl Into<String>) -> Self {
        Self::Applied {
            strategy: strategy.into(),
        }
    }

    /// Build an unsupported outcome.
    #[must_use]
    pub fn unsupported(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }

    /// Whether this outcome applied the edit.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
