//! Evidence pack parsing from untrusted bytes.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use super::{EvidencePack, MANIFEST_PATH, PackError, PackManifest};
use crate::receipt::Receipt;

/// Maximum size of a single archive entry (64 MiB).
///
/// Untrusted archives must not be able to balloon memory through a single
/// oversized entry.
pub const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Parses an evidence pack from a gzip-compressed tar stream.
///
/// Unknown archive entries are skipped; the verifier only interprets the
/// manifest and session receipt files. Entries under `sessions/` for a
/// session the manifest never declares are orphans and abort the parse.
///
/// # Errors
///
/// Returns a distinct [`PackError`] variant per structural failure mode;
/// see the enum docs.
pub fn read_pack<R: Read>(input: R) -> Result<EvidencePack, PackError> {
    let mut archive = tar::Archive::new(GzDecoder::new(input));

    let mut manifest: Option<PackManifest> = None;
    let mut sessions: BTreeMap<String, Vec<Receipt>> = BTreeMap::new();

    let entries = archive.entries().map_err(|e| PackError::MalformedArchive {
        message: e.to_string(),
    })?;
    for entry in entries {
        let mut entry = entry.map_err(|e| PackError::MalformedArchive {
            message: e.to_string(),
        })?;
        let path = entry
            .path()
            .ok()
            .and_then(|p| p.to_str().map(str::to_string))
            .ok_or_else(|| PackError::MalformedArchive {
                message: "entry path is not valid UTF-8".to_string(),
            })?;

        if entry.size() > MAX_ENTRY_SIZE {
            return Err(PackError::EntryTooLarge {
                path,
                size: entry.size(),
                max_size: MAX_ENTRY_SIZE,
            });
        }

        if path == MANIFEST_PATH {
            let parsed: PackManifest = parse_entry(&mut entry).map_err(|message| {
                PackError::MalformedManifest { message }
            })?;
            if manifest.replace(parsed).is_some() {
                return Err(PackError::DuplicateEntry { path });
            }
        } else if let Some(session_id) = session_id_from_path(&path) {
            let receipts: Vec<Receipt> = parse_entry(&mut entry).map_err(|message| {
                PackError::MalformedReceipts {
                    session_id: session_id.clone(),
                    message,
                }
            })?;
            if sessions.insert(session_id, receipts).is_some() {
                return Err(PackError::DuplicateEntry { path });
            }
        } else {
            debug!(path, "skipping unrecognized pack entry");
        }
    }

    let manifest = manifest.ok_or(PackError::MissingManifest)?;

    for session_id in sessions.keys() {
        if manifest.session(session_id).is_none() {
            return Err(PackError::OrphanSession {
                session_id: session_id.clone(),
            });
        }
    }

    // No receipt may appear in two sessions. A repeat within one session
    // is left to the chain verifier, which reports it as a duplicate clock.
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    for (session_id, receipts) in &sessions {
        for receipt in receipts {
            if let Some(first_session) = owners.insert(&receipt.receipt_id, session_id) {
                if first_session != session_id {
                    return Err(PackError::DuplicateReceipt {
                        receipt_id: receipt.receipt_id.clone(),
                        first_session: first_session.to_string(),
                        second_session: session_id.clone(),
                    });
                }
            }
        }
    }

    debug!(
        sessions = sessions.len(),
        receipts = sessions.values().map(Vec::len).sum::<usize>(),
        "parsed evidence pack"
    );

    Ok(EvidencePack { manifest, sessions })
}

/// Parses an evidence pack from a file on disk.
///
/// # Errors
///
/// Returns [`PackError::Io`] if the file cannot be opened, or any
/// [`read_pack`] error.
pub fn read_pack_file(path: &Path) -> Result<EvidencePack, PackError> {
    let file = std::fs::File::open(path)?;
    read_pack(std::io::BufReader::new(file))
}

fn parse_entry<T: serde::de::DeserializeOwned, R: Read>(entry: &mut R) -> Result<T, String> {
    let mut raw = String::new();
    entry
        .read_to_string(&mut raw)
        .map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

/// Extracts the session id from a `sessions/<id>/receipts.json` path.
fn session_id_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix("sessions/")?;
    let (session_id, tail) = rest.split_once('/')?;
    if tail == "receipts.json" && !session_id.is_empty() {
        Some(session_id.to_string())
    } else {
        None
    }
}
