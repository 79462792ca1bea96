//! Canonical payload serialization for receipt hashing and signing.
//!
//! Canonicalization follows RFC 8785 (JCS — JSON Canonicalization Scheme)
//! via `serde_jcs`: object keys sorted lexicographically, no insignificant
//! whitespace, minimal string escaping. The payload structs below fix the
//! exact field sets, so the same logical content always yields identical
//! bytes regardless of how the source encoding ordered or formatted its
//! fields.
//!
//! Determinism here is the security-critical property: two semantically
//! equal receipts MUST canonicalize identically, and any single-bit change
//! to a hashed field MUST canonicalize differently.
//!
//! # Field sets
//!
//! The **hashed payload** (input to `blob_hash`) covers `receipt_id`,
//! `decision_id`, `effect_id`, `status`, `reason_code`, `output_hash`,
//! `principal`, and `lamport_clock`. `blob_hash` and `signature` are
//! excluded because they derive from it; `prev_hash` is excluded because
//! it is chained on after hashing; `timestamp` is advisory and carries no
//! integrity weight.
//!
//! The **signed payload** is the hashed payload extended with `prev_hash`,
//! so a signature attests to chain position as well as content. This
//! matches the issuing kernel, whose receipt signatures cover the chain
//! linking fields.

use serde::Serialize;
use thiserror::Error;

use crate::receipt::{ReasonCode, Receipt, ReceiptStatus};

/// Errors that can occur during canonical serialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CanonicalError {
    /// The payload could not be serialized to canonical JSON.
    #[error("canonical serialization failed: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

#[derive(Serialize)]
struct HashedPayload<'a> {
    receipt_id: &'a str,
    decision_id: &'a str,
    effect_id: &'a str,
    status: ReceiptStatus,
    reason_code: ReasonCode,
    output_hash: &'a str,
    principal: &'a str,
    lamport_clock: u64,
}

#[derive(Serialize)]
struct SignedPayload<'a> {
    receipt_id: &'a str,
    decision_id: &'a str,
    effect_id: &'a str,
    status: ReceiptStatus,
    reason_code: ReasonCode,
    output_hash: &'a str,
    principal: &'a str,
    lamport_clock: u64,
    prev_hash: &'a str,
}

/// Produces the canonical bytes of a receipt's hashed payload.
///
/// # Errors
///
/// Returns [`CanonicalError::Serialization`] if JCS serialization fails.
pub fn hashed_payload(receipt: &Receipt) -> Result<Vec<u8>, CanonicalError> {
    to_canonical(&HashedPayload {
        receipt_id: &receipt.receipt_id,
        decision_id: &receipt.decision_id,
        effect_id: &receipt.effect_id,
        status: receipt.status,
        reason_code: receipt.reason_code,
        output_hash: &receipt.output_hash,
        principal: &receipt.principal,
        lamport_clock: receipt.lamport_clock,
    })
}

/// Produces the canonical bytes a receipt's signature covers.
///
/// This is the hashed payload extended with `prev_hash`; see the module
/// docs for why the chain link is part of the signed span.
///
/// # Errors
///
/// Returns [`CanonicalError::Serialization`] if JCS serialization fails.
pub fn signed_payload(receipt: &Receipt) -> Result<Vec<u8>, CanonicalError> {
    to_canonical(&SignedPayload {
        receipt_id: &receipt.receipt_id,
        decision_id: &receipt.decision_id,
        effect_id: &receipt.effect_id,
        status: receipt.status,
        reason_code: receipt.reason_code,
        output_hash: &receipt.output_hash,
        principal: &receipt.principal,
        lamport_clock: receipt.lamport_clock,
        prev_hash: &receipt.prev_hash,
    })
}

fn to_canonical<T: Serialize>(payload: &T) -> Result<Vec<u8>, CanonicalError> {
    serde_jcs::to_vec(payload).map_err(|e| CanonicalError::Serialization {
        message: e.to_string(),
    })
}
