//! # Fix CLI: retrofit chapters to the template.
//!
//! Reads chapters from `<dir>/OEBPS/text`, applies the idempotent
//! remediation transform, and writes changed chapters to `--out-dir`.
//! Sources are never modified. A chapter that cannot be read or written is
//! reported and skipped; the run exits 2 if any chapter failed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use quire_compliance::remediate;
use quire_core::{discover_unit_paths, ContentUnit};

use crate::config::QuireConfig;
use crate::{resolve_path, CONTENT_SUBDIR};

/// Arguments for `quire fix`.
#[derive(Args, Debug)]
pub struct FixArgs {
    /// Package root; chapters are read from `<dir>/OEBPS/text`.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Directory receiving remediated chapters.
    #[arg(long)]
    pub out_dir: PathBuf,
}

/// Execute `quire fix`.
pub fn run_fix(args: &FixArgs, config: &QuireConfig, work_dir: &Path) -> Result<u8> {
    let content_dir = resolve_path(&args.dir, work_dir).join(CONTENT_SUBDIR);
    if !content_dir.is_dir() {
        println!("FAIL: content directory not found: {}", content_dir.display());
        return Ok(1);
    }
    let out_dir = resolve_path(&args.out_dir, work_dir);
    if same_dir(&content_dir, &out_dir) {
        bail!("--out-dir must differ from the content directory");
    }

    let sequencer = config.sequencer();
    let catalog = config.catalog()?;
    let paths = discover_unit_paths(&content_dir, &sequencer)?;
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut changed = 0usize;
    let mut failed = 0usize;
    for path in &paths {
        let unit = match ContentUnit::read(path, &sequencer) {
            Ok(unit) => unit,
            Err(e) => {
                let e = anyhow::Error::new(e);
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "unreadable chapter");
                println!("FAIL: {}: {e:#}", display_name(path));
                failed += 1;
                continue;
            }
        };
        let fixed = remediate(&unit, &catalog, &config.remediation);
        if !fixed.is_changed() {
            continue;
        }
        let target = out_dir.join(unit.file_name());
        if let Err(e) = std::fs::write(&target, fixed.unit.text()) {
            tracing::warn!(path = %target.display(), error = %e, "failed to write chapter");
            println!("FAIL: {}: failed to write {}: {e}", unit.file_name(), target.display());
            failed += 1;
            continue;
        }
        println!("FIXED: {}", unit.file_name());
        for fix in &fixed.applied {
            println!("  - {fix}");
        }
        changed += 1;
    }

    if failed > 0 {
        println!(
            "FAIL: {failed} of {} chapters could not be processed; {changed} remediated into {}",
            paths.len(),
            out_dir.display()
        );
        return Ok(2);
    }
    println!(
        "OK: {changed} of {} chapters remediated into {}",
        paths.len(),
        out_dir.display()
    );
    Ok(0)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{compliant_chapter, legacy_chapter, write};

    #[test]
    fn writes_only_changed_chapters() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "OEBPS/text/chapter-i.xhtml", &compliant_chapter("i"));
        write(dir.path(), "OEBPS/text/chapter-ii.xhtml", &legacy_chapter("ii"));
        let args = FixArgs {
            dir: PathBuf::from("."),
            out_dir: PathBuf::from("fixed"),
        };
        let code = run_fix(&args, &QuireConfig::default(), dir.path()).unwrap();
        assert_eq!(code, 0);

        let out = dir.path().join("fixed");
        assert!(!out.join("chapter-i.xhtml").exists());
        let fixed = std::fs::read_to_string(out.join("chapter-ii.xhtml")).unwrap();
        assert!(fixed.contains("<!DOCTYPE html>"));
        assert!(fixed.contains(r#"name="viewport""#));

        let original =
            std::fs::read_to_string(dir.path().join("OEBPS/text/chapter-ii.xhtml")).unwrap();
        assert_eq!(original, legacy_chapter("ii"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreadable_chapter_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "OEBPS/text/chapter-i.xhtml", &legacy_chapter("i"));
        write(dir.path(), "OEBPS/text/chapter-iii.xhtml", &legacy_chapter("iii"));
        // Reading /proc/self/mem from offset 0 fails with EIO.
        std::os::unix::fs::symlink(
            "/proc/self/mem",
            dir.path().join("OEBPS/text/chapter-ii.xhtml"),
        )
        .unwrap();
        let args = FixArgs {
            dir: PathBuf::from("."),
            out_dir: PathBuf::from("fixed"),
        };
        let code = run_fix(&args, &QuireConfig::default(), dir.path()).unwrap();
        assert_eq!(code, 2);

        let out = dir.path().join("fixed");
        assert!(out.join("chapter-i.xhtml").exists());
        assert!(!out.join("chapter-ii.xhtml").exists());
        assert!(out.join("chapter-iii.xhtml").exists());
    }

    #[test]
    fn in_place_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "OEBPS/text/chapter-i.xhtml", &legacy_chapter("i"));
        let args = FixArgs {
            dir: PathBuf::from("."),
            out_dir: PathBuf::from(CONTENT_SUBDIR),
        };
        assert!(run_fix(&args, &QuireConfig::default(), dir.path()).is_err());
    }

    #[test]
    fn missing_content_dir_exits_1() {
        let dir = tempfile::tempdir().unwrap();
        let args = FixArgs {
            dir: PathBuf::from("."),
            out_dir: PathBuf::from("fixed"),
        };
        assert_eq!(run_fix(&args, &QuireConfig::default(), dir.path()).unwrap(), 1);
    }
}
