//! Per-receipt signature verification against the principal key registry.
//!
//! Each receipt's `signature` is validated against the registered key of
//! the principal it claims. The outcomes are deliberately distinct: a
//! cryptographically invalid signature indicates tamper (or forgery),
//! while an unknown or revoked principal indicates a trust problem, and
//! the two must not be conflated in a report.

use crate::canonical;
use crate::crypto::{parse_signature_hex, verify_signature};
use crate::receipt::{ReasonCode, Receipt};
use crate::registry::KeyRegistry;

/// Outcome of verifying one receipt's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureOutcome {
    /// The signature verifies under the principal's registered key.
    Valid,

    /// The signature is well-formed but does not verify; the payload or
    /// the signature was altered after signing.
    Invalid,

    /// The signature (or payload) could not be decoded at all.
    Malformed {
        /// The reason decoding failed.
        reason: String,
    },

    /// The receipt's principal has no registered key.
    UnknownPrincipal,

    /// Trust in the principal's key has been withdrawn.
    RevokedKey,
}

impl SignatureOutcome {
    /// Returns true only for a verified signature.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Maps the outcome onto the kernel's reason-code vocabulary, where
    /// one applies.
    #[must_use]
    pub const fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            Self::RevokedKey => Some(ReasonCode::DenyTrustKeyRevoked),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignatureOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "signature valid"),
            Self::Invalid => write!(f, "signature invalid"),
            Self::Malformed { reason } => write!(f, "signature malformed: {reason}"),
            Self::UnknownPrincipal => write!(f, "principal has no registered key"),
            Self::RevokedKey => {
                write!(f, "principal key revoked ({})", ReasonCode::DenyTrustKeyRevoked)
            },
        }
    }
}

/// One receipt's signature verdict, with enough context for a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFinding {
    /// Index of the receipt within its session sequence.
    pub index: usize,

    /// The receipt's id.
    pub receipt_id: String,

    /// The principal the receipt claims.
    pub principal: String,

    /// The verification outcome.
    pub outcome: SignatureOutcome,
}

/// Validates receipt signatures against a key registry.
#[derive(Debug, Clone, Copy)]
pub struct SignatureVerifier<'a> {
    registry: &'a KeyRegistry,
}

impl<'a> SignatureVerifier<'a> {
    /// Creates a verifier over the given registry.
    #[must_use]
    pub const fn new(registry: &'a KeyRegistry) -> Self {
        Self { registry }
    }

    /// Verifies a single receipt's signature.
    #[must_use]
    pub fn verify_receipt(&self, receipt: &Receipt) -> SignatureOutcome {
        let Some(record) = self.registry.record(&receipt.principal) else {
            return SignatureOutcome::UnknownPrincipal;
        };
        // Revocation wins over cryptographic validity: a revoked key must
        // not vouch for anything, even a correct signature.
        if record.is_revoked() {
            return SignatureOutcome::RevokedKey;
        }

        let signature = match parse_signature_hex(&receipt.signature) {
            Ok(signature) => signature,
            Err(e) => {
                return SignatureOutcome::Malformed {
                    reason: e.to_string(),
                };
            },
        };
        let payload = match canonical::signed_payload(receipt) {
            Ok(payload) => payload,
            Err(e) => {
                return SignatureOutcome::Malformed {
                    reason: e.to_string(),
                };
            },
        };

        match verify_signature(record.verifying_key(), &payload, &signature) {
            Ok(()) => SignatureOutcome::Valid,
            Err(_) => SignatureOutcome::Invalid,
        }
    }

    /// Verifies every receipt in a session sequence, returning a finding
    /// per receipt in order.
    #[must_use]
    pub fn verify_sequence(&self, receipts: &[Receipt]) -> Vec<SignatureFinding> {
        receipts
            .iter()
            .enumerate()
            .map(|(index, receipt)| SignatureFinding {
                index,
                receipt_id: receipt.receipt_id.clone(),
                principal: receipt.principal.clone(),
                outcome: self.verify_receipt(receipt),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::crypto::Signer;
    use crate::receipt::{GENESIS_PREV_HASH, ReceiptStatus};

    fn signed_receipt(signer: &Signer, principal: &str) -> Receipt {
        let mut receipt = Receipt {
            receipt_id: "rcpt-d1".to_string(),
            decision_id: "d1".to_string(),
            effect_id: "e1".to_string(),
            status: ReceiptStatus::Approved,
            reason_code: ReasonCode::Allow,
            output_hash: "sha256:aa".to_string(),
            blob_hash: "sha256:bb".to_string(),
            prev_hash: GENESIS_PREV_HASH.to_string(),
            lamport_clock: 0,
            signature: String::new(),
            principal: principal.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let payload = canonical::signed_payload(&receipt).unwrap();
        receipt.signature = hex::encode(signer.sign(&payload).to_bytes());
        receipt
    }

    fn registry_with(principal: &str, signer: &Signer) -> KeyRegistry {
        let mut registry = KeyRegistry::new();
        registry.register(principal, signer.verifying_key());
        registry
    }

    #[test]
    fn valid_signature_passes() {
        let signer = Signer::generate();
        let receipt = signed_receipt(&signer, "kernel-1");
        let registry = registry_with("kernel-1", &signer);

        let outcome = SignatureVerifier::new(&registry).verify_receipt(&receipt);
        assert!(outcome.is_valid());
    }

    #[test]
    fn tampered_payload_is_invalid() {
        let signer = Signer::generate();
        let mut receipt = signed_receipt(&signer, "kernel-1");
        receipt.status = ReceiptStatus::Denied;
        let registry = registry_with("kernel-1", &signer);

        let outcome = SignatureVerifier::new(&registry).verify_receipt(&receipt);
        assert_eq!(outcome, SignatureOutcome::Invalid);
    }

    #[test]
    fn relinked_receipt_is_invalid() {
        // prev_hash is inside the signed span, so splicing a receipt into a
        // different chain position invalidates its signature.
        let signer = Signer::generate();
        let mut receipt = signed_receipt(&signer, "kernel-1");
        receipt.prev_hash = "sha256:ff".to_string();
        let registry = registry_with("kernel-1", &signer);

        let outcome = SignatureVerifier::new(&registry).verify_receipt(&receipt);
        assert_eq!(outcome, SignatureOutcome::Invalid);
    }

    #[test]
    fn unknown_principal_is_distinct_from_invalid() {
        let signer = Signer::generate();
        let receipt = signed_receipt(&signer, "kernel-1");
        let registry = KeyRegistry::new();

        let outcome = SignatureVerifier::new(&registry).verify_receipt(&receipt);
        assert_eq!(outcome, SignatureOutcome::UnknownPrincipal);
    }

    #[test]
    fn revoked_key_fails_even_with_correct_signature() {
        let signer = Signer::generate();
        let receipt = signed_receipt(&signer, "kernel-1");
        let mut registry = registry_with("kernel-1", &signer);
        registry.revoke("kernel-1");

        let outcome = SignatureVerifier::new(&registry).verify_receipt(&receipt);
        assert_eq!(outcome, SignatureOutcome::RevokedKey);
        assert_eq!(
            outcome.reason_code(),
            Some(ReasonCode::DenyTrustKeyRevoked)
        );
    }

    #[test]
    fn garbage_signature_is_malformed() {
        let signer = Signer::generate();
        let mut receipt = signed_receipt(&signer, "kernel-1");
        receipt.signature = "not-hex".to_string();
        let registry = registry_with("kernel-1", &signer);

        let outcome = SignatureVerifier::new(&registry).verify_receipt(&receipt);
        assert!(matches!(outcome, SignatureOutcome::Malformed { .. }));
    }

    #[test]
    fn verify_sequence_reports_each_receipt() {
        let signer = Signer::generate();
        let good = signed_receipt(&signer, "kernel-1");
        let mut bad = signed_receipt(&signer, "kernel-1");
        bad.receipt_id = "rcpt-d2".to_string();
        let registry = registry_with("kernel-1", &signer);

        let findings =
            SignatureVerifier::new(&registry).verify_sequence(&[good, bad]);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].outcome.is_valid());
        // receipt_id is in the signed span; renaming breaks the signature.
        assert_eq!(findings[1].outcome, SignatureOutcome::Invalid);
        assert_eq!(findings[1].index, 1);
    }
}
