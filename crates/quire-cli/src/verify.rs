//! # Verify CLI: packaging checks on an existing container.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use quire_package::verify_path;

use crate::build::print_verification;
use crate::resolve_path;

/// Arguments for `quire verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Container to verify.
    pub file: PathBuf,

    /// Also list every entry.
    #[arg(long)]
    pub list: bool,
}

/// Execute `quire verify`. Exit 0 iff no defects were found.
pub fn run_verify(args: &VerifyArgs, work_dir: &Path) -> Result<u8> {
    let path = resolve_path(&args.file, work_dir);
    if !path.is_file() {
        println!("FAIL: file not found: {}", path.display());
        return Ok(1);
    }

    let report = verify_path(&path)?;
    println!("{}", path.display());
    if args.list {
        for entry in &report.entries {
            let method = if entry.compressed { "deflated" } else { "stored" };
            println!("  {:<9} {:>10}  {}", method, entry.size, entry.name);
        }
    }
    print_verification(&report);
    Ok(if report.passed() { 0 } else { 2 })
}
