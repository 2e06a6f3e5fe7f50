//! # Check CLI: chapter template compliance.
//!
//! ```bash
//! quire check                       # ./OEBPS/text, report to compliance_report.json
//! quire check --dir book --report out/compliance.json --workers 4
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use quire_compliance::{
    aggregate_with_threshold, check_all_parallel, ComplianceReport, ComplianceResult,
    RuleCatalog,
};
use quire_core::{discover_unit_paths, ContentUnit, Sequencer};

use crate::config::QuireConfig;
use crate::{resolve_path, CONTENT_SUBDIR};

/// Issues listed in the printed summary.
const TOP_ISSUES: usize = 10;

/// Arguments for `quire check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Package root; chapters are read from `<dir>/OEBPS/text`.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Where to write the JSON report.
    #[arg(long, default_value = "compliance_report.json")]
    pub report: PathBuf,

    /// Worker threads used for checking.
    #[arg(long, default_value_t = 1)]
    pub workers: usize,
}

/// JSON document written by `quire check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub generated_at: String,
    pub catalog_version: String,
    pub summary: ComplianceReport,
    pub results: Vec<ComplianceResult>,
}

/// Execute `quire check`.
pub fn run_check(args: &CheckArgs, config: &QuireConfig, work_dir: &Path) -> Result<u8> {
    let content_dir = resolve_path(&args.dir, work_dir).join(CONTENT_SUBDIR);
    if !content_dir.is_dir() {
        println!("FAIL: content directory not found: {}", content_dir.display());
        return Ok(1);
    }

    let catalog = config.catalog()?;
    let results = check_directory(&content_dir, &config.sequencer(), &catalog, args.workers)?;
    let summary = aggregate_with_threshold(&results, config.critical_threshold);
    print_summary(&summary);

    let report_path = resolve_path(&args.report, work_dir);
    let document = CheckReport {
        generated_at: chrono::Local::now().to_rfc3339(),
        catalog_version: catalog.version().to_string(),
        summary,
        results,
    };
    let json = serde_json::to_string_pretty(&document).context("failed to serialize report")?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("failed to write report: {}", report_path.display()))?;
    println!("Report written to {}", report_path.display());

    Ok(if document.summary.is_fully_compliant() { 0 } else { 2 })
}

/// Check every chapter under `content_dir`, in sequence order.
///
/// A chapter that cannot be read yields a failed result in its slot rather
/// than an error.
pub fn check_directory(
    content_dir: &Path,
    sequencer: &Sequencer,
    catalog: &RuleCatalog,
    workers: usize,
) -> Result<Vec<ComplianceResult>> {
    let paths = discover_unit_paths(content_dir, sequencer)?;
    tracing::info!(count = paths.len(), dir = %content_dir.display(), "checking chapters");

    let mut units = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        match ContentUnit::read(path, sequencer) {
            Ok(unit) => units.push(unit),
            Err(e) => {
                let e = anyhow::Error::new(e);
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "unreadable chapter");
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                failures.push((
                    index,
                    ComplianceResult::read_failure(
                        &path.display().to_string(),
                        sequencer.key(&name),
                        &format!("{e:#}"),
                    ),
                ));
            }
        }
    }

    let mut results = check_all_parallel(&units, catalog, workers);
    // Ascending indices, so each insert lands in its final slot.
    for (index, failed) in failures {
        results.insert(index, failed);
    }
    Ok(results)
}

fn print_summary(report: &ComplianceReport) {
    println!("Template compliance");
    println!("  total:         {}", report.total);
    println!("  compliant:     {}", report.compliant);
    println!("  non-compliant: {}", report.non_compliant);
    println!("  rate:          {:.1}%", report.compliance_rate);

    let top = report.top_issues(TOP_ISSUES);
    if !top.is_empty() {
        println!();
        println!("Most common issues:");
        for entry in top {
            println!("  {:>4}  {}", entry.count, entry.issue);
        }
    }

    if !report.critical.is_empty() {
        println!();
        println!("Critical chapters:");
        for unit in &report.critical {
            println!("  {} ({} issues)", unit.file, unit.issue_count);
            for issue in &unit.issues {
                println!("    - {issue}");
            }
        }
    }

    println!();
    if report.is_fully_compliant() {
        println!("OK: all {} chapters comply", report.total);
    } else {
        println!("FAIL: {} of {} chapters need attention", report.non_compliant, report.total);
    }
}
