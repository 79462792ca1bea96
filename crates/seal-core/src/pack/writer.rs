//! Deterministic evidence-pack export.
//!
//! The writer produces byte-identical output for identical input: entries
//! are emitted in sorted path order with fixed mtime (epoch), mode 0644,
//! and uid/gid 0, so that exporting the same trail twice yields the same
//! archive hash.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use super::{EvidencePack, MANIFEST_PATH, PackError, session_receipts_path};

/// Writes an evidence pack as a gzip-compressed tarball.
///
/// The manifest is emitted first, then each session's receipt file in
/// session-id order.
///
/// # Errors
///
/// Returns [`PackError::Io`] on stream failures and
/// [`PackError::MalformedManifest`] / [`PackError::MalformedReceipts`] if
/// serialization fails.
pub fn write_pack<W: Write>(pack: &EvidencePack, out: W) -> Result<(), PackError> {
    let mut builder = tar::Builder::new(GzEncoder::new(out, Compression::default()));

    let manifest_bytes =
        serde_json::to_vec_pretty(&pack.manifest).map_err(|e| PackError::MalformedManifest {
            message: e.to_string(),
        })?;
    append_entry(&mut builder, MANIFEST_PATH, &manifest_bytes)?;

    // BTreeMap iteration gives the sorted path order determinism needs.
    for (session_id, receipts) in &pack.sessions {
        let receipt_bytes =
            serde_json::to_vec_pretty(receipts).map_err(|e| PackError::MalformedReceipts {
                session_id: session_id.clone(),
                message: e.to_string(),
            })?;
        append_entry(&mut builder, &session_receipts_path(session_id), &receipt_bytes)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

/// Writes an evidence pack into an in-memory byte buffer.
///
/// # Errors
///
/// Propagates any [`write_pack`] error.
pub fn write_pack_bytes(pack: &EvidencePack) -> Result<Vec<u8>, PackError> {
    let mut bytes = Vec::new();
    write_pack(pack, &mut bytes)?;
    Ok(bytes)
}

fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    path: &str,
    data: &[u8],
) -> Result<(), PackError> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_cksum();
    builder.append_data(&mut header, path, data)?;
    Ok(())
}
