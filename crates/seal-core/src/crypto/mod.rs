//! Cryptographic primitives for receipt verification.
//!
//! This module provides the hash and signature primitives the engine
//! trusts:
//!
//! - **SHA-256 tagged digests**: self-describing content hashes in the
//!   `"sha256:<hex>"` form the kernel stores in `blob_hash`
//! - **Ed25519 signatures**: signing and verification over canonical
//!   receipt payloads
//!
//! The verifier trusts only these primitives and the evidence-pack format;
//! every kernel-supplied field is recomputed or re-validated against them.

mod hash;
mod sign;

pub use hash::{DIGEST_ALGORITHM, recompute_blob_hash, tagged_sha256};
pub use sign::{
    PUBLIC_KEY_SIZE, SIGNATURE_SIZE, Signature, Signer, SignerError, VerifyingKey,
    parse_signature_hex, parse_verifying_key, parse_verifying_key_hex, verify_signature,
};
