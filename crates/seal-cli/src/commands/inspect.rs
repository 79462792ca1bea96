//! `seal inspect` - print a pack's manifest without verifying anything.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use seal_core::pack::read_pack_file;

/// Arguments for `seal inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the evidence pack (gzip-compressed tarball)
    pub bundle: PathBuf,
}

/// Prints the manifest summary and per-session receipt counts.
pub fn run(args: &InspectArgs) -> Result<()> {
    let pack = read_pack_file(&args.bundle)
        .with_context(|| format!("cannot read evidence pack {}", args.bundle.display()))?;

    println!("format version: {}", pack.manifest.format_version);
    println!("exported at: {}", pack.manifest.exported_at.to_rfc3339());
    println!("sessions: {}", pack.manifest.sessions.len());
    println!("receipts present: {}", pack.receipt_count());
    for session in &pack.manifest.sessions {
        let present = pack
            .sessions
            .get(&session.session_id)
            .map_or(0, Vec::len);
        println!(
            "  {}  declared {} receipts (last clock {}), {present} present",
            session.session_id, session.receipt_count, session.last_lamport_clock
        );
    }
    Ok(())
}
