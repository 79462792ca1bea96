//! Reference producer of chained, signed receipts.
//!
//! The generator mints receipts the way the issuing kernel does: each new
//! receipt takes the session head as its `prev_hash` (the genesis sentinel
//! for the first), the next Lamport clock value, a freshly computed
//! `blob_hash`, and an Ed25519 signature over the signed payload. It
//! exists so a complete trail can be produced, exported, and verified
//! end-to-end without a running kernel; the verification engine itself
//! never mutates receipts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{GENESIS_PREV_HASH, ReasonCode, Receipt, ReceiptStatus, SESSION_START_CLOCK, Session};
use crate::canonical::{self, CanonicalError};
use crate::crypto::{Signer, VerifyingKey, recompute_blob_hash};
use crate::pack::{EvidencePack, PACK_FORMAT_VERSION, PackError, PackManifest, write_pack_bytes};

/// The decision fields a caller supplies for one receipt.
#[derive(Debug, Clone)]
pub struct DecisionDraft {
    /// Identifier of the originating decision.
    pub decision_id: String,

    /// Identifier of the governed effect.
    pub effect_id: String,

    /// Decision outcome.
    pub status: ReceiptStatus,

    /// Reason code explaining the outcome.
    pub reason_code: ReasonCode,

    /// Content hash of the effect's output.
    pub output_hash: String,
}

/// Errors that can occur while minting receipts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    /// The receipt payload could not be canonicalized.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}

struct SessionChain {
    created_at: DateTime<Utc>,
    receipts: Vec<Receipt>,
    head_hash: String,
    next_clock: u64,
}

/// Mints chained, signed receipts grouped by session.
pub struct ReceiptGenerator {
    signer: Signer,
    principal: String,
    now: fn() -> DateTime<Utc>,
    sessions: BTreeMap<String, SessionChain>,
}

impl ReceiptGenerator {
    /// Creates a generator signing as the given principal.
    #[must_use]
    pub fn new(signer: Signer, principal: impl Into<String>) -> Self {
        Self {
            signer,
            principal: principal.into(),
            now: Utc::now,
            sessions: BTreeMap::new(),
        }
    }

    /// Overrides the clock for deterministic timestamps in tests.
    #[must_use]
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Returns the principal this generator signs as.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the verifying key matching this generator's signatures.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signer.verifying_key()
    }

    /// Mints the next receipt in a session's chain.
    ///
    /// The session chain is created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Canonical`] if the payload cannot be
    /// canonicalized for hashing or signing.
    pub fn record(
        &mut self,
        session_id: &str,
        draft: DecisionDraft,
    ) -> Result<Receipt, GeneratorError> {
        let now = self.now;
        let chain = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionChain {
                created_at: now(),
                receipts: Vec::new(),
                head_hash: GENESIS_PREV_HASH.to_string(),
                next_clock: SESSION_START_CLOCK,
            });

        let mut receipt = Receipt {
            receipt_id: format!("rcpt-{}", draft.decision_id),
            decision_id: draft.decision_id,
            effect_id: draft.effect_id,
            status: draft.status,
            reason_code: draft.reason_code,
            output_hash: draft.output_hash,
            blob_hash: String::new(),
            prev_hash: chain.head_hash.clone(),
            lamport_clock: chain.next_clock,
            signature: String::new(),
            principal: self.principal.clone(),
            timestamp: now(),
        };

        // blob_hash and signature are derived last; neither is part of the
        // hashed payload, so the placeholder values above are harmless.
        receipt.blob_hash = recompute_blob_hash(&receipt)?;
        let payload = canonical::signed_payload(&receipt)?;
        receipt.signature = hex::encode(self.signer.sign(&payload).to_bytes());

        chain.head_hash = receipt.blob_hash.clone();
        chain.next_clock += 1;
        chain.receipts.push(receipt.clone());
        Ok(receipt)
    }

    /// Returns a session's receipts, if the session exists.
    #[must_use]
    pub fn session_receipts(&self, session_id: &str) -> Option<&[Receipt]> {
        self.sessions
            .get(session_id)
            .map(|chain| chain.receipts.as_slice())
    }

    /// Returns the session summaries for every recorded session.
    #[must_use]
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions
            .iter()
            .map(|(session_id, chain)| Session {
                session_id: session_id.clone(),
                created_at: chain.created_at,
                receipt_count: chain.receipts.len() as u64,
                last_lamport_clock: chain.next_clock.saturating_sub(1),
            })
            .collect()
    }

    /// Assembles the recorded trail into an in-memory evidence pack.
    #[must_use]
    pub fn to_pack(&self) -> EvidencePack {
        EvidencePack {
            manifest: PackManifest {
                format_version: PACK_FORMAT_VERSION.to_string(),
                exported_at: (self.now)(),
                sessions: self.sessions(),
            },
            sessions: self
                .sessions
                .iter()
                .map(|(id, chain)| (id.clone(), chain.receipts.clone()))
                .collect(),
        }
    }

    /// Exports the recorded trail as a gzip-compressed tarball.
    ///
    /// # Errors
    ///
    /// Returns [`PackError`] if serialization or archiving fails.
    pub fn export(&self) -> Result<Vec<u8>, PackError> {
        write_pack_bytes(&self.to_pack())
    }
}

impl std::fmt::Debug for ReceiptGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptGenerator")
            .field("principal", &self.principal)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::chain::verify_chain;
    use crate::signature::{SignatureOutcome, SignatureVerifier};

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn draft(n: u32) -> DecisionDraft {
        DecisionDraft {
            decision_id: format!("d{n}"),
            effect_id: format!("e{n}"),
            status: ReceiptStatus::Approved,
            reason_code: ReasonCode::Allow,
            output_hash: format!("sha256:out{n}"),
        }
    }

    #[test]
    fn first_receipt_starts_the_chain() {
        let mut generator =
            ReceiptGenerator::new(Signer::generate(), "kernel-1").with_clock(fixed_clock);
        let receipt = generator.record("s1", draft(0)).unwrap();

        assert_eq!(receipt.prev_hash, GENESIS_PREV_HASH);
        assert_eq!(receipt.lamport_clock, SESSION_START_CLOCK);
        assert_eq!(receipt.receipt_id, "rcpt-d0");
        assert_eq!(receipt.blob_hash, recompute_blob_hash(&receipt).unwrap());
    }

    #[test]
    fn minted_chains_verify_clean() {
        let mut generator =
            ReceiptGenerator::new(Signer::generate(), "kernel-1").with_clock(fixed_clock);
        for n in 0..5 {
            generator.record("s1", draft(n)).unwrap();
        }

        let receipts = generator.session_receipts("s1").unwrap();
        assert!(verify_chain(receipts).is_intact());
    }

    #[test]
    fn minted_signatures_verify_under_registry() {
        let mut generator =
            ReceiptGenerator::new(Signer::generate(), "kernel-1").with_clock(fixed_clock);
        generator.record("s1", draft(0)).unwrap();

        let mut registry = crate::registry::KeyRegistry::new();
        registry.register("kernel-1", generator.verifying_key());

        let receipts = generator.session_receipts("s1").unwrap();
        let findings = SignatureVerifier::new(&registry).verify_sequence(receipts);
        assert!(findings.iter().all(|f| f.outcome == SignatureOutcome::Valid));
    }

    #[test]
    fn sessions_are_independent_chains() {
        let mut generator =
            ReceiptGenerator::new(Signer::generate(), "kernel-1").with_clock(fixed_clock);
        generator.record("s1", draft(0)).unwrap();
        generator.record("s2", draft(1)).unwrap();
        let second_in_s1 = generator.record("s1", draft(2)).unwrap();

        // s2's chain starts fresh even though s1 already advanced.
        let s2 = generator.session_receipts("s2").unwrap();
        assert_eq!(s2[0].lamport_clock, SESSION_START_CLOCK);
        assert!(s2[0].is_genesis());
        assert_eq!(second_in_s1.lamport_clock, 1);
    }

    #[test]
    fn session_summaries_match_chains() {
        let mut generator =
            ReceiptGenerator::new(Signer::generate(), "kernel-1").with_clock(fixed_clock);
        for n in 0..3 {
            generator.record("s1", draft(n)).unwrap();
        }

        let sessions = generator.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].receipt_count, 3);
        assert_eq!(sessions[0].last_lamport_clock, 2);
    }
}
