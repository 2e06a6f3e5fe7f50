//! # Validate CLI: external conformance tool over every container.
//!
//! Runs the configured validator on each `*.epub` in `--dir`, upserts one
//! record per container into the record store, and writes a timestamped
//! JSON report (`epub_validation_report_<stamp>.json`) next to them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use quire_package::{
    validate_batch, BatchReport, ExternalValidator, JsonRecordStore, RecordStore, ValidationRecord,
};

use crate::config::QuireConfig;
use crate::{file_stamp, resolve_path};

/// Sample errors printed per invalid container.
const SAMPLE_ERRORS: usize = 3;

/// Arguments for `quire validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory containing the containers.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Record store path; overrides the configured one.
    #[arg(long)]
    pub records: Option<PathBuf>,
}

/// Execute `quire validate` with the configured command validator.
pub fn run_validate(args: &ValidateArgs, config: &QuireConfig, work_dir: &Path) -> Result<u8> {
    let validator = config.validator(work_dir);
    validate_with(args, config, work_dir, &validator)
}

/// Execute `quire validate` against any validator.
pub fn validate_with(
    args: &ValidateArgs,
    config: &QuireConfig,
    work_dir: &Path,
    validator: &dyn ExternalValidator,
) -> Result<u8> {
    let dir = resolve_path(&args.dir, work_dir);
    if !dir.is_dir() {
        println!("FAIL: directory not found: {}", dir.display());
        return Ok(1);
    }

    let outcomes = validate_batch(validator, &dir)?;
    if outcomes.is_empty() {
        println!("No .epub files found in {}", dir.display());
        return Ok(0);
    }

    let records_path = resolve_path(args.records.as_ref().unwrap_or(&config.records), work_dir);
    let mut store = JsonRecordStore::open(&records_path)
        .with_context(|| format!("failed to open record store: {}", records_path.display()))?;
    for outcome in &outcomes {
        store.upsert(ValidationRecord::from_outcome(outcome))?;
    }

    for outcome in &outcomes {
        let status = if outcome.is_valid { "VALID" } else { "INVALID" };
        println!("{status}: {}", outcome.file_name);
        println!("  size: {} bytes", outcome.file_size);
        println!(
            "  errors: {}, warnings: {}",
            outcome.error_count, outcome.warning_count
        );
        if !outcome.is_valid {
            for error in outcome.errors.iter().take(SAMPLE_ERRORS) {
                println!("    - {error}");
            }
        }
    }

    let report = BatchReport::new(outcomes);
    let report_path = dir.join(format!("epub_validation_report_{}.json", file_stamp()));
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("failed to write report: {}", report_path.display()))?;

    println!();
    println!("Report written to {}", report_path.display());
    println!("Records updated in {}", records_path.display());
    if report.all_valid() {
        println!("OK: all {} containers valid", report.total_files);
        Ok(0)
    } else {
        println!(
            "FAIL: {} of {} containers invalid",
            report.invalid_files, report.total_files
        );
        Ok(2)
    }
}
