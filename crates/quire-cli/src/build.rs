//! # Build CLI: assemble and verify a container.
//!
//! ```bash
//! quire build --source book                 # book-20250830-080822.epub
//! quire build --source book --output dist/book.epub
//! ```
//!
//! The manifest comes from the unpacked package layout: `mimetype`,
//! `META-INF/`, `OEBPS/`, then other root files. The finished container is
//! verified before the command reports success.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use quire_package::{assemble_to_path, verify_path, Manifest, VerificationReport};

use crate::{file_stamp, resolve_path};

/// Arguments for `quire build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Unpacked package directory.
    #[arg(long, default_value = ".")]
    pub source: PathBuf,

    /// Output container. Defaults to `<source name>-<timestamp>.epub` in
    /// the working directory.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Execute `quire build`.
pub fn run_build(args: &BuildArgs, work_dir: &Path) -> Result<u8> {
    let source = resolve_path(&args.source, work_dir);
    if !source.is_dir() {
        println!("FAIL: source directory not found: {}", source.display());
        return Ok(1);
    }
    let output = match &args.output {
        Some(path) => resolve_path(path, work_dir),
        None => work_dir.join(default_output_name(&source)),
    };

    let manifest = Manifest::from_directory(&source)?;
    let assembly = match assemble_to_path(&manifest, &output) {
        Ok(report) => report,
        Err(e) => {
            println!("FAIL: assembly failed: {:#}", anyhow::Error::new(e));
            return Ok(2);
        }
    };

    for skipped in &assembly.skipped {
        println!("WARN: skipped {}: {}", skipped.path, skipped.reason);
    }
    if assembly.type_declaration_normalized {
        println!("WARN: mimetype source was not canonical; wrote canonical value");
    }
    println!("Built {}", output.display());
    println!("  entries: {}", assembly.written.len());
    if let Some(size) = assembly.size_bytes {
        println!("  size:    {size} bytes");
    }
    if let Some(digest) = &assembly.sha256 {
        println!("  sha256:  {digest}");
    }

    let verification = verify_path(&output)?;
    print_verification(&verification);
    Ok(if verification.passed() { 0 } else { 2 })
}

/// `<dir name>-<YYYYmmdd-HHMMSS>.epub`.
fn default_output_name(source: &Path) -> String {
    let stem = source
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "book".to_string());
    format!("{stem}-{}.epub", file_stamp())
}

/// Shared by `build` and `verify`.
pub(crate) fn print_verification(report: &VerificationReport) {
    println!("Verification");
    println!("  entries: {}", report.total_entries());
    println!(
        "  content: {} markup, {} style, {} image, {} font",
        report.counts.markup, report.counts.style, report.counts.image, report.counts.font
    );
    if report.passed() {
        println!("OK: container passes packaging checks");
    } else {
        for defect in &report.defects {
            println!("  - {defect}");
        }
        println!("FAIL: {} packaging defect(s)", report.defects.len());
    }
}
