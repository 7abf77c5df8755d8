//! Capability-token gating for destructive operations.
//!
//! Tokens are issued by an external trusted process and verified here
//! against a shared key injected at engine construction. The signature is a
//! keyed SHA-256 over a canonical payload; verification compares in constant
//! time, requires an exact scope match, and checks the validity window.
//!
//! `single_use` is part of the signed payload and is surfaced to the caller,
//! but the engine keeps no persistent used-token ledger - enforcing single
//! use across invocations is the issuer's (or an external ledger's) job.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Scope required to delete a slide.
pub const SCOPE_DELETE_SLIDE: &str = "delete:slide";

/// Scope required to remove a shape.
pub const SCOPE_REMOVE_SHAPE: &str = "remove:shape";

/// Errors produced while validating an approval token.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The token signature did not verify against the shared key.
    #[error("Token signature is invalid")]
    BadSignature,

    /// The token scope does not exactly match the operation's scope.
    #[error("Token scope {found:?} does not match required scope {required:?}")]
    ScopeMismatch {
        /// The scope the operation requires.
        required: String,
        /// The scope the token carries.
        found: String,
    },

    /// The token is not yet within its validity window.
    #[error("Token not valid until {issued_at} (now {now})")]
    NotYetValid {
        /// Token validity start, seconds since the Unix epoch.
        issued_at: u64,
        /// Verification time, seconds since the Unix epoch.
        now: u64,
    },

    /// The token validity window has passed.
    #[error("Token expired at {expires_at} (now {now})")]
    Expired {
        /// Token validity end, seconds since the Unix epoch.
        expires_at: u64,
        /// Verification time, seconds since the Unix epoch.
        now: u64,
    },
}

/// A signed, scoped, time-bounded capability credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalToken {
    /// The operation scope this token authorizes, matched exactly.
    pub scope: String,
    /// The subject (document or principal) the token was issued for.
    pub subject: String,
    /// Validity window start, seconds since the Unix epoch.
    pub issued_at: u64,
    /// Validity window end, seconds since the Unix epoch.
    pub expires_at: u64,
    /// Whether the issuer intends this token for a single operation.
    #[serde(default)]
    pub single_use: bool,
    /// Hex keyed digest over the canonical payload.
    pub signature: String,
}

impl ApprovalToken {
    /// Build a correctly signed token.
    ///
    /// The engine itself only verifies; this constructor exists for issuer
    /// processes and tests that need well-formed tokens against the same
    /// canonical payload.
    #[must_use]
    pub fn signed(
        key: &[u8],
        scope: impl Into<String>,
        subject: impl Into<String>,
        issued_at: u64,
        expires_at: u64,
        single_use: bool,
    ) -> Self {
        let scope = scope.into();
        let subject = subject.into();
        let signature = hex::encode(signature_bytes(
            key,
            &canonical_payload(&scope, &subject, issued_at, expires_at, single_use),
        ));
        Self {
            scope,
            subject,
            issued_at,
            expires_at,
            single_use,
            signature,
        }
    }

    /// The canonical payload this token signs.
    #[must_use]
    fn payload(&self) -> String {
        canonical_payload(
            &self.scope,
            &self.subject,
            self.issued_at,
            self.expires_at,
            self.single_use,
        )
    }
}

/// Validates approval tokens against a shared verification key.
#[derive(Debug, Clone)]
pub struct ApprovalGate {
    key: Vec<u8>,
}

impl ApprovalGate {
    /// Create a gate with the given verification key.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Validate `token` for an operation requiring `required_scope` at time
    /// `now` (seconds since the Unix epoch).
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::BadSignature`] for a forged or tampered
    /// token, [`ApprovalError::ScopeMismatch`] unless the scope matches
    /// exactly, and [`ApprovalError::NotYetValid`] / [`ApprovalError::Expired`]
    /// outside the validity window.
    pub fn validate(
        &self,
        token: &ApprovalToken,
        required_scope: &str,
        now: u64,
    ) -> Result<(), ApprovalError> {
        let expected = signature_bytes(&self.key, &token.payload());
        let provided = hex::decode(&token.signature).map_err(|_| ApprovalError::BadSignature)?;
        if !constant_time_eq(&expected, &provided) {
            return Err(ApprovalError::BadSignature);
        }

        if token.scope != required_scope {
            return Err(ApprovalError::ScopeMismatch {
                required: required_scope.to_string(),
                found: token.scope.clone(),
            });
        }

        if now < token.issued_at {
            return Err(ApprovalError::NotYetValid {
                issued_at: token.issued_at,
                now,
            });
        }
        if now > token.expires_at {
            return Err(ApprovalError::Expired {
                expires_at: token.expires_at,
                now,
            });
        }

        Ok(())
    }
}

/// Canonical signed payload. Versioned so a future payload change cannot be
/// confused with the current one.
fn canonical_payload(
    scope: &str,
    subject: &str,
    issued_at: u64,
    expires_at: u64,
    single_use: bool,
) -> String {
    format!("v1|{scope}|{subject}|{issued_at}|{expires_at}|{single_use}")
}

/// Keyed digest over the canonical payload.
fn signature_bytes(key: &[u8], payload: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(b"\x00");
    hasher.update(payload.as_bytes());
    hasher.finalize().to_vec()
}

/// Compare two byte slices without early exit on mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
