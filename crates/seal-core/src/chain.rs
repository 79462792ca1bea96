//! Hash-chain continuity verification for a session's receipt sequence.
//!
//! For receipt *i* > 0 the chain is intact when
//! `lamport_clock[i] == lamport_clock[i-1] + 1` and `prev_hash[i]` equals
//! the **recomputed** blob hash of receipt *i*-1. The stored `blob_hash`
//! is never trusted for linking; comparing against the recomputed value
//! prevents a tampered link from hiding behind its own claimed hash. The
//! first receipt must carry the genesis sentinel and the session-start
//! clock.
//!
//! # Reporting policy
//!
//! After the first broken link (or blob-hash mismatch) in a sequence,
//! further link errors are suppressed — every later link is cascade noise
//! from the same break. Scanning still continues for structurally distinct
//! issues: duplicate Lamport clocks are reported for every colliding pair,
//! naming both receipt ids, with no attempt to guess which receipt is
//! legitimate.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::crypto::recompute_blob_hash;
use crate::receipt::{GENESIS_PREV_HASH, Receipt, SESSION_START_CLOCK};

/// One integrity defect found in a session's chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChainIssue {
    /// The stored `blob_hash` does not match the recomputed payload hash.
    #[error(
        "receipt {index} ('{receipt_id}') blob hash mismatch: stored {stored}, recomputed {recomputed}"
    )]
    HashMismatch {
        /// Index of the receipt within the sequence.
        index: usize,
        /// The receipt's id.
        receipt_id: String,
        /// The hash stored in the receipt.
        stored: String,
        /// The hash recomputed from the canonical payload.
        recomputed: String,
    },

    /// The first receipt does not carry the genesis sentinel.
    #[error("receipt 0 ('{receipt_id}') prev_hash is '{actual}', expected the genesis sentinel")]
    GenesisPrevHash {
        /// The first receipt's id.
        receipt_id: String,
        /// The prev_hash it carries instead.
        actual: String,
    },

    /// The first receipt does not start at the session-start clock.
    #[error("receipt 0 ('{receipt_id}') lamport_clock is {actual}, expected the session-start clock")]
    GenesisClock {
        /// The first receipt's id.
        receipt_id: String,
        /// The clock it carries instead.
        actual: u64,
    },

    /// `prev_hash` does not match the recomputed hash of the predecessor.
    #[error(
        "receipt {index} ('{receipt_id}') chain link broken: prev_hash {actual}, predecessor recomputed to {expected}"
    )]
    BrokenLink {
        /// Index of the receipt whose link is broken.
        index: usize,
        /// The receipt's id.
        receipt_id: String,
        /// The predecessor's recomputed blob hash.
        expected: String,
        /// The prev_hash the receipt carries.
        actual: String,
    },

    /// The Lamport clock does not increase by exactly one.
    #[error(
        "receipt {index} ('{receipt_id}') lamport_clock is {actual}, expected {expected}"
    )]
    ClockGap {
        /// Index of the receipt with the wrong clock.
        index: usize,
        /// The receipt's id.
        receipt_id: String,
        /// The clock value continuity requires.
        expected: u64,
        /// The clock the receipt carries.
        actual: u64,
    },

    /// Two receipts claim the same Lamport clock.
    #[error(
        "duplicate lamport_clock {clock} claimed by receipts '{first_receipt_id}' and '{second_receipt_id}'"
    )]
    DuplicateClock {
        /// The colliding clock value.
        clock: u64,
        /// Id of the receipt seen first with this clock.
        first_receipt_id: String,
        /// Id of the later receipt claiming the same clock.
        second_receipt_id: String,
    },

    /// The receipt's payload could not be canonicalized for rehashing.
    #[error("receipt {index} ('{receipt_id}') payload not hashable: {message}")]
    Unhashable {
        /// Index of the receipt.
        index: usize,
        /// The receipt's id.
        receipt_id: String,
        /// Description of the canonicalization failure.
        message: String,
    },
}

/// Result of walking one session's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// Per-receipt link validity (index 0 covers the genesis checks).
    pub links: Vec<bool>,

    /// Index of the first failing receipt, if any.
    pub first_failure: Option<usize>,

    /// All reported issues, in scan order.
    pub issues: Vec<ChainIssue>,
}

impl ChainReport {
    /// Returns true if the chain is fully intact.
    #[must_use]
    pub fn is_intact(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Walks an ordered receipt sequence claimed to belong to one session.
///
/// An empty sequence yields an intact report; whether an empty session is
/// acceptable is a completeness question, not a chain question.
#[must_use]
pub fn verify_chain(receipts: &[Receipt]) -> ChainReport {
    let mut issues = Vec::new();
    let mut links = Vec::with_capacity(receipts.len());
    let mut first_failure: Option<usize> = None;
    let mut recomputed: Vec<Option<String>> = Vec::with_capacity(receipts.len());

    for (index, receipt) in receipts.iter().enumerate() {
        let reporting = first_failure.is_none();
        let mut link_ok = true;

        let hash = match recompute_blob_hash(receipt) {
            Ok(hash) => Some(hash),
            Err(e) => {
                link_ok = false;
                if reporting {
                    issues.push(ChainIssue::Unhashable {
                        index,
                        receipt_id: receipt.receipt_id.clone(),
                        message: e.to_string(),
                    });
                }
                None
            },
        };

        if index == 0 {
            if receipt.prev_hash != GENESIS_PREV_HASH {
                link_ok = false;
                if reporting {
                    issues.push(ChainIssue::GenesisPrevHash {
                        receipt_id: receipt.receipt_id.clone(),
                        actual: receipt.prev_hash.clone(),
                    });
                }
            }
            if receipt.lamport_clock != SESSION_START_CLOCK {
                link_ok = false;
                if reporting {
                    issues.push(ChainIssue::GenesisClock {
                        receipt_id: receipt.receipt_id.clone(),
                        actual: receipt.lamport_clock,
                    });
                }
            }
        } else {
            let expected_clock = receipts[index - 1].lamport_clock.wrapping_add(1);
            if receipt.lamport_clock != expected_clock {
                link_ok = false;
                if reporting {
                    issues.push(ChainIssue::ClockGap {
                        index,
                        receipt_id: receipt.receipt_id.clone(),
                        expected: expected_clock,
                        actual: receipt.lamport_clock,
                    });
                }
            }
            if let Some(expected) = &recomputed[index - 1] {
                if receipt.prev_hash != *expected {
                    link_ok = false;
                    if reporting {
                        issues.push(ChainIssue::BrokenLink {
                            index,
                            receipt_id: receipt.receipt_id.clone(),
                            expected: expected.clone(),
                            actual: receipt.prev_hash.clone(),
                        });
                    }
                }
            }
        }

        if let Some(hash) = &hash {
            if receipt.blob_hash != *hash {
                link_ok = false;
                if reporting {
                    issues.push(ChainIssue::HashMismatch {
                        index,
                        receipt_id: receipt.receipt_id.clone(),
                        stored: receipt.blob_hash.clone(),
                        recomputed: hash.clone(),
                    });
                }
            }
        }

        if !link_ok && first_failure.is_none() {
            first_failure = Some(index);
        }
        links.push(link_ok);
        recomputed.push(hash);
    }

    // Duplicate clocks are reported regardless of link state; both
    // claimants are named and neither is assumed legitimate.
    let mut seen: BTreeMap<u64, &str> = BTreeMap::new();
    for receipt in receipts {
        match seen.get(&receipt.lamport_clock) {
            Some(first_receipt_id) => {
                issues.push(ChainIssue::DuplicateClock {
                    clock: receipt.lamport_clock,
                    first_receipt_id: (*first_receipt_id).to_string(),
                    second_receipt_id: receipt.receipt_id.clone(),
                });
            },
            None => {
                seen.insert(receipt.lamport_clock, &receipt.receipt_id);
            },
        }
    }

    ChainReport {
        links,
        first_failure,
        issues,
    }
}
