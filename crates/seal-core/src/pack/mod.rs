//! Evidence packs: the portable export format for audit trails.
//!
//! A pack is a gzip-compressed tarball holding a manifest plus the full
//! receipt sequence for each referenced session:
//!
//! ```text
//! manifest.json                      — format version, export time, sessions
//! sessions/<session_id>/receipts.json — ordered receipt array
//! ```
//!
//! Packs are read-only views assembled at verification time; they own no
//! state beyond the current run. The [`reader`] parses untrusted bytes into
//! an [`EvidencePack`]; the [`writer`] produces the deterministic layout
//! the kernel exports (sorted paths, epoch mtime, fixed ownership).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::receipt::{Receipt, Session};

pub mod reader;
pub mod writer;

pub use reader::{read_pack, read_pack_file};
pub use writer::{write_pack, write_pack_bytes};

/// Export format version this engine understands.
pub const PACK_FORMAT_VERSION: &str = "1.0";

/// Archive path of the manifest.
pub const MANIFEST_PATH: &str = "manifest.json";

/// Returns the archive path of a session's receipt file.
#[must_use]
pub fn session_receipts_path(session_id: &str) -> String {
    format!("sessions/{session_id}/receipts.json")
}

/// The manifest written at the root of every pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackManifest {
    /// Export format version.
    pub format_version: String,

    /// When the pack was exported. Advisory, like receipt timestamps.
    pub exported_at: DateTime<Utc>,

    /// The sessions this pack claims to contain.
    pub sessions: Vec<Session>,
}

impl PackManifest {
    /// Looks up a declared session by id.
    #[must_use]
    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }
}

/// An unpacked evidence bundle: manifest plus per-session receipts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidencePack {
    /// The pack's manifest.
    pub manifest: PackManifest,

    /// Receipt sequences keyed by session id, in declared order.
    pub sessions: BTreeMap<String, Vec<Receipt>>,
}

impl EvidencePack {
    /// Returns the total number of receipts present in the pack.
    #[must_use]
    pub fn receipt_count(&self) -> usize {
        self.sessions.values().map(Vec::len).sum()
    }
}

/// Structural errors raised while parsing a pack.
///
/// Each failure mode is distinct so downstream tooling can discriminate
/// corruption from tampering. Structural errors abort verification for the
/// affected pack only; integrity findings never surface here — they are
/// data in the verification report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackError {
    /// The archive could not be decompressed or walked.
    #[error("malformed archive: {message}")]
    MalformedArchive {
        /// Description of the archive failure.
        message: String,
    },

    /// The archive contains no `manifest.json`.
    #[error("missing manifest: archive contains no manifest.json")]
    MissingManifest,

    /// The manifest is present but unparseable.
    #[error("malformed manifest: {message}")]
    MalformedManifest {
        /// Description of the parse failure.
        message: String,
    },

    /// A session's receipt file is unparseable.
    #[error("malformed receipts for session '{session_id}': {message}")]
    MalformedReceipts {
        /// The session whose receipt file failed to parse.
        session_id: String,
        /// Description of the parse failure.
        message: String,
    },

    /// The archive carries receipts for a session the manifest never
    /// declares.
    #[error("orphan receipts: session '{session_id}' is not declared in the manifest")]
    OrphanSession {
        /// The undeclared session id.
        session_id: String,
    },

    /// The same receipt id appears in two different sessions.
    #[error(
        "receipt '{receipt_id}' appears in both session '{first_session}' and session '{second_session}'"
    )]
    DuplicateReceipt {
        /// The duplicated receipt id.
        receipt_id: String,
        /// The session that first claimed the receipt.
        first_session: String,
        /// The session that also claims it.
        second_session: String,
    },

    /// The same archive path appears twice.
    #[error("duplicate archive entry: {path}")]
    DuplicateEntry {
        /// The repeated path.
        path: String,
    },

    /// An archive entry exceeds the size bound.
    #[error("archive entry '{path}' too large: {size} bytes exceeds maximum of {max_size} bytes")]
    EntryTooLarge {
        /// The oversized entry's path.
        path: String,
        /// Its declared size.
        size: u64,
        /// The maximum allowed size.
        max_size: u64,
    },

    /// Underlying I/O failure while reading or writing a pack file.
    #[error("pack I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
