//! `seal verify` - run the verification engine over an exported bundle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use seal_core::pack::read_pack_file;
use seal_core::registry::{KeyRegistry, RegistryEntry};
use seal_core::verify::{VerificationReport, verify_pack};

/// Arguments for `seal verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the evidence pack (gzip-compressed tarball)
    pub bundle: PathBuf,

    /// Path to the key registry JSON file
    /// (`[{"principal": ..., "public_key": ..., "revoked": ...}]`)
    #[arg(long)]
    pub keys: PathBuf,

    /// Output format (`text` or `json`)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

/// Runs verification and prints the report.
///
/// Exits with status 1 on a `FAIL` verdict so scripts can gate on the
/// outcome; structural pack errors surface as ordinary command failures.
pub fn run(args: &VerifyArgs) -> Result<()> {
    let registry = load_registry(&args.keys)?;
    let pack = read_pack_file(&args.bundle)
        .with_context(|| format!("cannot read evidence pack {}", args.bundle.display()))?;

    let report = verify_pack(&pack, &registry);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_report(&report);
    }

    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn load_registry(path: &PathBuf) -> Result<KeyRegistry> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read key registry {}", path.display()))?;
    let entries: Vec<RegistryEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("malformed key registry {}", path.display()))?;
    KeyRegistry::from_entries(&entries)
        .with_context(|| format!("unusable key registry {}", path.display()))
}

fn print_text_report(report: &VerificationReport) {
    println!("verdict: {}", report.verdict);
    println!("receipts examined: {}", report.receipts_examined);
    println!("checks:");
    for (name, status) in &report.checks {
        println!("  {name}: {status}");
    }
    if !report.errors.is_empty() {
        println!("errors:");
        for (n, error) in report.errors.iter().enumerate() {
            println!("  {}. {error}", n + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use seal_core::crypto::Signer;

    use super::*;

    #[test]
    fn load_registry_parses_entries() {
        let signer = Signer::generate();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(
            &path,
            format!(
                r#"[{{"principal": "kernel-1", "public_key": "{}"}}]"#,
                signer.public_key_hex()
            ),
        )
        .unwrap();

        let registry = load_registry(&path).unwrap();
        assert!(registry.record("kernel-1").is_some());
    }

    #[test]
    fn load_registry_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_registry(&path).is_err());
    }
}
