//! Verification aggregation across an evidence pack.
//!
//! The aggregator runs the chain, signature, and completeness checks over
//! every session in a pack and folds the outcomes into one
//! [`VerificationReport`]. The verdict is `PASS` if and only if every
//! check across every session passes; a single failing receipt anywhere
//! fails the whole pack, but the report still enumerates every failure
//! found, never just the first.
//!
//! Sessions never share receipts or chain state, so each session is an
//! independent unit of work: all sessions verify concurrently on scoped
//! threads and the report is composed by concatenating per-session partial
//! results in session-id order, giving deterministic output regardless of
//! scheduling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chain::verify_chain;
use crate::pack::EvidencePack;
use crate::receipt::{Receipt, Session};
use crate::registry::KeyRegistry;
use crate::signature::SignatureVerifier;

/// Name of the signature check in the report.
pub const CHECK_SIGNATURES: &str = "signatures";

/// Name of the chain-continuity check in the report.
pub const CHECK_CAUSAL_CHAIN: &str = "causal_chain";

/// Name of the completeness check in the report.
pub const CHECK_COMPLETENESS: &str = "completeness";

/// Overall verdict of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Every check over every session passed.
    #[serde(rename = "PASS")]
    Pass,
    /// At least one check failed somewhere in the pack.
    #[serde(rename = "FAIL")]
    Fail,
}

impl Verdict {
    /// Returns the wire representation of this verdict.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail status of one named check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    /// The check passed for every session.
    #[serde(rename = "PASS")]
    Pass,
    /// The check failed for at least one receipt or session.
    #[serde(rename = "FAIL")]
    Fail,
}

impl CheckStatus {
    /// Returns the wire representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured output of a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Overall verdict.
    pub verdict: Verdict,

    /// Named checks and their statuses.
    pub checks: BTreeMap<String, CheckStatus>,

    /// Total receipts examined across all sessions.
    pub receipts_examined: usize,

    /// Human-readable error descriptions, ordered by session id and, within
    /// a session, by check (completeness, causal chain, signatures). Every
    /// entry is prefixed with the failing check's name.
    pub errors: Vec<String>,
}

impl VerificationReport {
    /// Returns true if the verdict is `PASS`.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Per-session partial result, merged into the report afterwards.
struct SessionOutcome {
    receipts_examined: usize,
    completeness_errors: Vec<String>,
    chain_errors: Vec<String>,
    signature_errors: Vec<String>,
}

/// Runs every check over every session in a pack.
///
/// Pure, read-only computation: the pack and registry are borrowed
/// immutably and nothing is retried or aborted — every failure becomes
/// data in the report.
#[must_use]
pub fn verify_pack(pack: &EvidencePack, registry: &KeyRegistry) -> VerificationReport {
    // Sorted declared sessions give the merge its deterministic order.
    let mut declared: BTreeMap<&str, &Session> = BTreeMap::new();
    let mut manifest_duplicates: Vec<String> = Vec::new();
    for session in &pack.manifest.sessions {
        if declared.insert(&session.session_id, session).is_some() {
            manifest_duplicates.push(format!(
                "{CHECK_COMPLETENESS}: session '{}' declared twice in the manifest",
                session.session_id
            ));
        }
    }

    debug!(sessions = declared.len(), "verifying evidence pack");

    let outcomes: Vec<(String, SessionOutcome)> = std::thread::scope(|scope| {
        let handles: Vec<_> = declared
            .values()
            .map(|&session| {
                let receipts = pack
                    .sessions
                    .get(&session.session_id)
                    .map_or(&[][..], Vec::as_slice);
                (
                    session.session_id.clone(),
                    scope.spawn(move || verify_session(session, receipts, registry)),
                )
            })
            .collect();
        handles
            .into_iter()
            .map(|(session_id, handle)| {
                let outcome = handle.join().unwrap_or_else(|_| SessionOutcome {
                    receipts_examined: 0,
                    completeness_errors: Vec::new(),
                    chain_errors: vec![format!(
                        "{CHECK_CAUSAL_CHAIN}: session '{session_id}': verification worker panicked"
                    )],
                    signature_errors: Vec::new(),
                });
                (session_id, outcome)
            })
            .collect()
    });

    let mut errors: Vec<String> = Vec::new();
    let mut completeness_failed = !manifest_duplicates.is_empty();
    let mut chain_failed = false;
    let mut signatures_failed = false;
    let mut receipts_examined = 0;

    if pack.manifest.sessions.is_empty() {
        completeness_failed = true;
        errors.push(format!(
            "{CHECK_COMPLETENESS}: evidence pack declares no sessions"
        ));
    }
    errors.extend(manifest_duplicates);

    // The reader rejects orphan sessions in archives; packs assembled in
    // memory can still carry them.
    for session_id in pack.sessions.keys() {
        if !declared.contains_key(session_id.as_str()) {
            completeness_failed = true;
            errors.push(format!(
                "{CHECK_COMPLETENESS}: session '{session_id}' has receipts but is not declared in the manifest"
            ));
        }
    }

    for (_, outcome) in &outcomes {
        receipts_examined += outcome.receipts_examined;
        completeness_failed |= !outcome.completeness_errors.is_empty();
        chain_failed |= !outcome.chain_errors.is_empty();
        signatures_failed |= !outcome.signature_errors.is_empty();
        errors.extend(outcome.completeness_errors.iter().cloned());
        errors.extend(outcome.chain_errors.iter().cloned());
        errors.extend(outcome.signature_errors.iter().cloned());
    }

    let status = |failed: bool| {
        if failed {
            CheckStatus::Fail
        } else {
            CheckStatus::Pass
        }
    };
    let checks = BTreeMap::from([
        (CHECK_CAUSAL_CHAIN.to_string(), status(chain_failed)),
        (CHECK_COMPLETENESS.to_string(), status(completeness_failed)),
        (CHECK_SIGNATURES.to_string(), status(signatures_failed)),
    ]);

    let verdict = if errors.is_empty() {
        Verdict::Pass
    } else {
        warn!(errors = errors.len(), "evidence pack failed verification");
        Verdict::Fail
    };

    VerificationReport {
        verdict,
        checks,
        receipts_examined,
        errors,
    }
}

fn verify_session(
    declared: &Session,
    receipts: &[Receipt],
    registry: &KeyRegistry,
) -> SessionOutcome {
    let session_id = &declared.session_id;
    let mut completeness_errors = Vec::new();

    // Input errors are completeness findings, distinct from tampering.
    if receipts.is_empty() {
        completeness_errors.push(format!(
            "{CHECK_COMPLETENESS}: session '{session_id}' has no receipts"
        ));
    }
    let actual_count = receipts.len() as u64;
    if declared.receipt_count != actual_count {
        completeness_errors.push(format!(
            "{CHECK_COMPLETENESS}: session '{session_id}' manifest declares {} receipts, pack contains {actual_count}",
            declared.receipt_count
        ));
    }
    if let Some(last) = receipts.last() {
        if declared.last_lamport_clock != last.lamport_clock {
            completeness_errors.push(format!(
                "{CHECK_COMPLETENESS}: session '{session_id}' manifest declares last lamport_clock {}, chain ends at {}",
                declared.last_lamport_clock, last.lamport_clock
            ));
        }
    }

    let chain_errors: Vec<String> = verify_chain(receipts)
        .issues
        .iter()
        .map(|issue| format!("{CHECK_CAUSAL_CHAIN}: session '{session_id}': {issue}"))
        .collect();

    let signature_errors: Vec<String> = SignatureVerifier::new(registry)
        .verify_sequence(receipts)
        .into_iter()
        .filter(|finding| !finding.outcome.is_valid())
        .map(|finding| {
            format!(
                "{CHECK_SIGNATURES}: session '{session_id}' receipt {} ('{}', principal '{}'): {}",
                finding.index, finding.receipt_id, finding.principal, finding.outcome
            )
        })
        .collect();

    SessionOutcome {
        receipts_examined: receipts.len(),
        completeness_errors,
        chain_errors,
        signature_errors,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::crypto::Signer;
    use crate::pack::{PACK_FORMAT_VERSION, PackManifest};
    use crate::receipt::{DecisionDraft, ReasonCode, ReceiptGenerator, ReceiptStatus};

    fn fixed_clock() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn allow_draft(n: u32) -> DecisionDraft {
        DecisionDraft {
            decision_id: format!("d{n}"),
            effect_id: format!("e{n}"),
            status: ReceiptStatus::Approved,
            reason_code: ReasonCode::Allow,
            output_hash: format!("sha256:out{n}"),
        }
    }

    fn generator_with_session(count: u32) -> (ReceiptGenerator, KeyRegistry) {
        let signer = Signer::generate();
        let mut registry = KeyRegistry::new();
        registry.register("kernel-1", signer.verifying_key());
        let mut generator = ReceiptGenerator::new(signer, "kernel-1").with_clock(fixed_clock);
        for n in 0..count {
            generator.record("s1", allow_draft(n)).unwrap();
        }
        (generator, registry)
    }

    #[test]
    fn clean_pack_passes_every_check() {
        let (generator, registry) = generator_with_session(3);
        let pack = generator.to_pack();

        let report = verify_pack(&pack, &registry);
        assert!(report.passed());
        assert!(report.errors.is_empty());
        assert_eq!(report.receipts_examined, 3);
        assert!(report.checks.values().all(|s| *s == CheckStatus::Pass));
    }

    #[test]
    fn empty_pack_fails_completeness() {
        let registry = KeyRegistry::new();
        let pack = EvidencePack {
            manifest: PackManifest {
                format_version: PACK_FORMAT_VERSION.to_string(),
                exported_at: fixed_clock(),
                sessions: Vec::new(),
            },
            sessions: std::collections::BTreeMap::new(),
        };

        let report = verify_pack(&pack, &registry);
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(
            report.checks.get(CHECK_COMPLETENESS),
            Some(&CheckStatus::Fail)
        );
        assert_eq!(report.checks.get(CHECK_CAUSAL_CHAIN), Some(&CheckStatus::Pass));
    }

    #[test]
    fn count_mismatch_names_the_session() {
        let (generator, registry) = generator_with_session(3);
        let mut pack = generator.to_pack();
        pack.manifest.sessions[0].receipt_count = 4;

        let report = verify_pack(&pack, &registry);
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(
            report.checks.get(CHECK_COMPLETENESS),
            Some(&CheckStatus::Fail)
        );
        assert!(report
            .errors
            .iter()
            .any(|e| e.starts_with(CHECK_COMPLETENESS) && e.contains("'s1'")));
        // The receipts themselves are sound.
        assert_eq!(report.checks.get(CHECK_CAUSAL_CHAIN), Some(&CheckStatus::Pass));
        assert_eq!(report.checks.get(CHECK_SIGNATURES), Some(&CheckStatus::Pass));
    }

    #[test]
    fn declared_session_with_no_receipt_file_fails_completeness() {
        let (generator, registry) = generator_with_session(2);
        let mut pack = generator.to_pack();
        pack.sessions.remove("s1");

        let report = verify_pack(&pack, &registry);
        assert_eq!(report.verdict, Verdict::Fail);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("'s1' has no receipts")));
    }

    #[test]
    fn all_failures_are_enumerated_not_just_the_first() {
        let signer = Signer::generate();
        let mut registry = KeyRegistry::new();
        registry.register("kernel-1", signer.verifying_key());
        let mut generator = ReceiptGenerator::new(signer, "kernel-1").with_clock(fixed_clock);
        for n in 0..2 {
            generator.record("s1", allow_draft(n)).unwrap();
            generator.record("s2", allow_draft(n + 10)).unwrap();
        }
        let mut pack = generator.to_pack();

        // Break s1's chain and s2's manifest count.
        if let Some(receipts) = pack.sessions.get_mut("s1") {
            receipts[1].status = ReceiptStatus::Error;
        }
        if let Some(session) = pack
            .manifest
            .sessions
            .iter_mut()
            .find(|s| s.session_id == "s2")
        {
            session.receipt_count = 9;
        }

        let report = verify_pack(&pack, &registry);
        assert_eq!(report.verdict, Verdict::Fail);
        assert!(report.errors.iter().any(|e| e.contains("'s1'")));
        assert!(report.errors.iter().any(|e| e.contains("'s2'")));
        assert_eq!(report.checks.get(CHECK_CAUSAL_CHAIN), Some(&CheckStatus::Fail));
        assert_eq!(
            report.checks.get(CHECK_COMPLETENESS),
            Some(&CheckStatus::Fail)
        );
        // The tampered receipt also fails its signature check.
        assert_eq!(report.checks.get(CHECK_SIGNATURES), Some(&CheckStatus::Fail));
    }

    #[test]
    fn report_serializes_with_wire_verdicts() {
        let (generator, registry) = generator_with_session(1);
        let report = verify_pack(&generator.to_pack(), &registry);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "PASS");
        assert_eq!(json["checks"]["signatures"], "PASS");
    }
}
