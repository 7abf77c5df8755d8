//! Pass/fail aggregation of validation issues.
//!
//! A thin layer over [`crate::validate`]: the checks produce categorized
//! issues, and a policy tier decides whether the deck passes.

use serde::{Deserialize, Serialize};

use crate::validate::{Severity, ValidationIssue};

/// Warnings tolerated by the standard tier before it fails.
pub const STANDARD_WARNING_LIMIT: usize = 5;

/// How strictly validation issues gate a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Fail only on critical issues.
    Lenient,
    /// Fail on criticals, or on more than [`STANDARD_WARNING_LIMIT`] warnings.
    #[default]
    Standard,
    /// Fail on any critical or warning.
    Strict,
}

/// The aggregated outcome of a validation run under a policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyVerdict {
    /// The policy that was applied.
    pub policy: ValidationPolicy,
    /// Whether the document passes under the policy.
    pub passed: bool,
    /// Number of critical issues.
    pub critical_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Number of informational issues.
    pub info_count: usize,
}

impl ValidationPolicy {
    /// Aggregate `issues` into a verdict under this policy.
    #[must_use]
    pub fn evaluate(self, issues: &[ValidationIssue]) -> PolicyVerdict {
        let critical_count = count(issues, Severity::Critical);
        let warning_count = count(issues, Severity::Warning);
        let info_count = count(issues, Severity::Info);

        let passed = match self {
            Self::Lenient => critical_count == 0,
            Self::Standard => critical_count == 0 && warning_count <= STANDARD_WARNING_LIMIT,
            Self::Strict => critical_count == 0 && warning_count == 0,
        };

        PolicyVerdict {
            policy: self,
            passed,
            critical_count,
            warning_count,
            info_count,
        }
    }
}

fn count(issues: &[ValidationIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}
