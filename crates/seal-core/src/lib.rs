//! seal-core — offline tamper-evidence verification for governed-decision
//! audit trails.
//!
//! A governance kernel mints a *receipt* for every agent/tool-call decision
//! it takes; receipts are hash-chained per session and signed. This crate
//! is the independent verifier: given an exported evidence pack and a
//! public-key registry — and no trust in, or connectivity to, the issuing
//! service — it proves or disproves that the trail is complete, internally
//! consistent, and unaltered.
//!
//! # Trust model
//!
//! The verifier trusts only the cryptographic primitives (Ed25519,
//! SHA-256, RFC 8785 canonical JSON) and the pack format. Every
//! kernel-supplied field — `blob_hash` and `prev_hash` included — is a
//! claim to be recomputed and cross-checked, never ground truth.
//!
//! # Pipeline
//!
//! - [`pack`] parses an exported bundle into a manifest plus per-session
//!   receipt sequences
//! - [`chain`] walks each session's hash chain, re-hashing every receipt
//!   via [`canonical`] + [`crypto`]
//! - [`signature`] validates each receipt's signature against the
//!   [`registry`]
//! - [`verify`] fans the checks out across sessions and folds the
//!   outcomes into a single [`verify::VerificationReport`]
//!
//! # Example
//!
//! ```rust
//! use seal_core::crypto::Signer;
//! use seal_core::pack::read_pack;
//! use seal_core::receipt::{DecisionDraft, ReasonCode, ReceiptGenerator, ReceiptStatus};
//! use seal_core::registry::KeyRegistry;
//! use seal_core::verify::verify_pack;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // A kernel stand-in mints one governed decision...
//! let mut kernel = ReceiptGenerator::new(Signer::generate(), "kernel-1");
//! kernel.record("session-1", DecisionDraft {
//!     decision_id: "d1".to_string(),
//!     effect_id: "e1".to_string(),
//!     status: ReceiptStatus::Approved,
//!     reason_code: ReasonCode::Allow,
//!     output_hash: "sha256:abc".to_string(),
//! })?;
//!
//! // ...and the holder of the exported pack verifies it independently.
//! let mut registry = KeyRegistry::new();
//! registry.register("kernel-1", kernel.verifying_key());
//! let pack = read_pack(kernel.export()?.as_slice())?;
//! let report = verify_pack(&pack, &registry);
//! assert!(report.passed());
//! # Ok(())
//! # }
//! ```
//!
//! Verification is a pure, read-only computation over the in-memory pack:
//! nothing here blocks on I/O, retries, or aborts the process. Malformed
//! input surfaces as a structural [`pack::PackError`]; integrity failures
//! surface as data in the report.

pub mod api;
pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod pack;
pub mod receipt;
pub mod registry;
pub mod signature;
pub mod verify;

pub use chain::{ChainIssue, ChainReport};
pub use pack::{EvidencePack, PackError, PackManifest};
pub use receipt::{ReasonCode, Receipt, ReceiptStatus, Session};
pub use registry::{KeyRegistry, RegistryEntry};
pub use verify::{VerificationReport, Verdict, verify_pack};
