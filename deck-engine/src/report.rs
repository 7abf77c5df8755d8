//! Structured results returned by mutating operations.

use serde::{Deserialize, Serialize};

/// The result of one successfully applied mutation.
///
/// `fingerprint_before` and `fingerprint_after` let an orchestrator detect
/// concurrent external edits between its own calls; `invalidates_indices`
/// tells it whether any slide or shape indices it recorded earlier must be
/// re-derived from a fresh read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationReport {
    /// Name of the operation that was applied.
    pub operation: String,
    /// Full content fingerprint before the mutation.
    pub fingerprint_before: String,
    /// Full content fingerprint after the mutation.
    pub fingerprint_after: String,
    /// Whether the operation inserted, removed, or reordered elements,
    /// invalidating previously reported indices into the touched collections.
    pub invalidates_indices: bool,
    /// The document's mutation generation after the operation.
    pub generation: u64,
    /// Operation-specific details (created indices, strategy outcomes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization_omits_empty_detail() {
        let report = MutationReport {
            operation: "edit_text".to_string(),
            fingerprint_before: "aa".repeat(32),
            fingerprint_after: "bb".repeat(32),
            invalidates_indices: false,
            generation: 3,
            detail: None,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert!(json.get("detail").is_none());
        assert_eq!(json["invalidates_indices"], false);
        assert_eq!(json["generation"], 3);
    }
}
