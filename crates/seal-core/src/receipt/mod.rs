//! Receipt and session records for the governed-decision audit trail.
//!
//! A [`Receipt`] is the immutable record of one governed decision outcome,
//! hash-chained to its predecessor within a session. Receipts are minted
//! once by the governance kernel and never mutated afterwards; the
//! verification engine only computes derived values (recomputed hashes,
//! chain and signature validity) for comparison.
//!
//! # Boundary strictness
//!
//! `status` and `reason_code` arrive over the wire as strings but are mapped
//! to closed, exhaustively-matched enums at the deserialization boundary.
//! An unrecognized value is an explicit error, never a silently-accepted
//! string. All record types reject unknown fields for the same reason.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod generator;

pub use generator::{DecisionDraft, GeneratorError, ReceiptGenerator};

/// Sentinel `prev_hash` value carried by the first receipt in a session.
pub const GENESIS_PREV_HASH: &str = "genesis";

/// Lamport clock value of the first receipt in a session.
pub const SESSION_START_CLOCK: u64 = 0;

/// Outcome of a governed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    /// The effect was authorized and executed.
    Approved,
    /// The effect was refused.
    Denied,
    /// The kernel failed while deciding or executing.
    Error,
}

impl ReceiptStatus {
    /// Returns the wire representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Denied => "DENIED",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic reason code explaining a decision outcome.
///
/// This is the kernel's closed enumeration; `Allow` is the only
/// non-denial, non-error code. The verification engine reports its own
/// locally-detected failures with the same vocabulary (for example
/// [`ReasonCode::DenyTrustKeyRevoked`] for a revoked signing key) so that
/// kernel-reported and locally-detected denials read uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Allow,
    DenyToolNotFound,
    DenySchemaMismatch,
    DenyOutputDrift,
    DenyBudgetExceeded,
    DenyApprovalRequired,
    DenyApprovalTimeout,
    DenySandboxTrap,
    DenyGasExhaustion,
    DenyTimeLimit,
    DenyMemoryLimit,
    DenyPolicyViolation,
    DenyTrustKeyRevoked,
    DenyIdempotencyDuplicate,
    ErrorInternal,
}

impl ReasonCode {
    /// Returns the wire representation of this reason code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::DenyToolNotFound => "DENY_TOOL_NOT_FOUND",
            Self::DenySchemaMismatch => "DENY_SCHEMA_MISMATCH",
            Self::DenyOutputDrift => "DENY_OUTPUT_DRIFT",
            Self::DenyBudgetExceeded => "DENY_BUDGET_EXCEEDED",
            Self::DenyApprovalRequired => "DENY_APPROVAL_REQUIRED",
            Self::DenyApprovalTimeout => "DENY_APPROVAL_TIMEOUT",
            Self::DenySandboxTrap => "DENY_SANDBOX_TRAP",
            Self::DenyGasExhaustion => "DENY_GAS_EXHAUSTION",
            Self::DenyTimeLimit => "DENY_TIME_LIMIT",
            Self::DenyMemoryLimit => "DENY_MEMORY_LIMIT",
            Self::DenyPolicyViolation => "DENY_POLICY_VIOLATION",
            Self::DenyTrustKeyRevoked => "DENY_TRUST_KEY_REVOKED",
            Self::DenyIdempotencyDuplicate => "DENY_IDEMPOTENCY_DUPLICATE",
            Self::ErrorInternal => "ERROR_INTERNAL",
        }
    }

    /// Returns true for the single allow code.
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one governed decision outcome.
///
/// Every field is a *claim* made by the issuing kernel. The verifier
/// recomputes `blob_hash` from the canonical payload and re-validates
/// `prev_hash`, `lamport_clock`, and `signature` rather than trusting the
/// stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Receipt {
    /// Opaque unique identifier for this receipt.
    pub receipt_id: String,

    /// Identifier of the originating decision.
    pub decision_id: String,

    /// Identifier of the effect (tool call) the decision governs.
    pub effect_id: String,

    /// Decision outcome.
    pub status: ReceiptStatus,

    /// Reason code explaining the outcome.
    pub reason_code: ReasonCode,

    /// Content hash of the effect's output, independent of receipt hashing.
    pub output_hash: String,

    /// Tagged content hash (`"sha256:<hex>"`) of this receipt's canonical
    /// payload. Excludes `blob_hash`, `prev_hash`, and `signature`.
    pub blob_hash: String,

    /// `blob_hash` of the preceding receipt in the session chain, or
    /// [`GENESIS_PREV_HASH`] for the first receipt.
    pub prev_hash: String,

    /// Per-session logical counter, strictly increasing by one per receipt.
    pub lamport_clock: u64,

    /// Hex-encoded Ed25519 signature over the signed payload.
    pub signature: String,

    /// Identity that produced the signature.
    pub principal: String,

    /// Advisory wall-clock time. Never used for ordering or integrity.
    pub timestamp: DateTime<Utc>,
}

impl Receipt {
    /// Returns true if this receipt claims to start its session's chain.
    #[must_use]
    pub fn is_genesis(&self) -> bool {
        self.prev_hash == GENESIS_PREV_HASH
    }
}

/// Summary of one session as declared by the kernel.
///
/// Invariant: `receipt_count` and `last_lamport_clock` must match the
/// actual chain length and final clock value observed in the session's
/// receipt sequence. The completeness check enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Session {
    /// Session identifier.
    pub session_id: String,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Number of receipts the session claims to contain.
    pub receipt_count: u64,

    /// Lamport clock of the session's final receipt.
    pub last_lamport_clock: u64,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_receipt() -> Receipt {
        Receipt {
            receipt_id: "rcpt-d1".to_string(),
            decision_id: "d1".to_string(),
            effect_id: "e1".to_string(),
            status: ReceiptStatus::Approved,
            reason_code: ReasonCode::Allow,
            output_hash: "sha256:aa".to_string(),
            blob_hash: "sha256:bb".to_string(),
            prev_hash: GENESIS_PREV_HASH.to_string(),
            lamport_clock: 0,
            signature: "00".repeat(64),
            principal: "kernel-1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn receipt_serde_round_trip() {
        let receipt = sample_receipt();
        let json = serde_json::to_string(&receipt).unwrap();
        let back: Receipt = serde_json::from_str(&json).unwrap();
        assert_eq!(receipt, back);
    }

    #[test]
    fn status_and_reason_use_wire_strings() {
        let json = serde_json::to_value(&sample_receipt()).unwrap();
        assert_eq!(json["status"], "APPROVED");
        assert_eq!(json["reason_code"], "ALLOW");
    }

    #[test]
    fn unknown_reason_code_is_rejected() {
        let mut value = serde_json::to_value(&sample_receipt()).unwrap();
        value["reason_code"] = "DENY_UNHEARD_OF".into();
        let result: Result<Receipt, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut value = serde_json::to_value(&sample_receipt()).unwrap();
        value["extra"] = "surprise".into();
        let result: Result<Receipt, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }

    #[test]
    fn genesis_detection_uses_sentinel() {
        let mut receipt = sample_receipt();
        assert!(receipt.is_genesis());
        receipt.prev_hash = "sha256:cc".to_string();
        assert!(!receipt.is_genesis());
    }

    #[test]
    fn reason_code_wire_names_are_closed() {
        // The enumeration is the kernel's exact 15-entry list.
        let all = [
            ReasonCode::Allow,
            ReasonCode::DenyToolNotFound,
            ReasonCode::DenySchemaMismatch,
            ReasonCode::DenyOutputDrift,
            ReasonCode::DenyBudgetExceeded,
            ReasonCode::DenyApprovalRequired,
            ReasonCode::DenyApprovalTimeout,
            ReasonCode::DenySandboxTrap,
            ReasonCode::DenyGasExhaustion,
            ReasonCode::DenyTimeLimit,
            ReasonCode::DenyMemoryLimit,
            ReasonCode::DenyPolicyViolation,
            ReasonCode::DenyTrustKeyRevoked,
            ReasonCode::DenyIdempotencyDuplicate,
            ReasonCode::ErrorInternal,
        ];
        assert_eq!(all.len(), 15);
        for code in all {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            assert_eq!(code.is_allow(), code.as_str() == "ALLOW");
        }
    }
}
