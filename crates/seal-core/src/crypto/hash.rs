//! Tagged SHA-256 digests for receipt payloads.

use sha2::{Digest, Sha256};

use crate::canonical::{self, CanonicalError};
use crate::receipt::Receipt;

/// Algorithm tag prefixed to every digest this engine computes.
///
/// The tag is part of the comparison contract: a stored `blob_hash` matches
/// a recomputed digest only under exact string equality, so a digest
/// computed under a different algorithm tag never matches.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// Computes the tagged SHA-256 digest of a byte sequence.
#[must_use]
pub fn tagged_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{DIGEST_ALGORITHM}:{}", hex::encode(digest))
}

/// Recomputes a receipt's `blob_hash` from its canonical hashed payload.
///
/// The stored `blob_hash` is a claim; chain verification always compares
/// against this recomputed value so a tampered link cannot hide behind its
/// own claimed hash.
///
/// # Errors
///
/// Returns [`CanonicalError`] if the payload cannot be canonicalized.
pub fn recompute_blob_hash(receipt: &Receipt) -> Result<String, CanonicalError> {
    Ok(tagged_sha256(&canonical::hashed_payload(receipt)?))
}
