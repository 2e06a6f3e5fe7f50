//! # External Validator Boundary
//!
//! The conformance tool is an opaque checker: it receives one archive path,
//! exits 0 when it found nothing wrong, and prints line-oriented
//! diagnostics. Lines starting with `ERROR` or `WARNING` are classified; the
//! first line containing `Messages:` is the summary.
//!
//! A tool that cannot be started, or that overruns its timeout, never aborts
//! a batch. The archive is reported invalid with a single synthetic error.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{PackagingError, PackagingResult, ToolError};

/// Diagnostics kept per severity.
pub const MAX_DIAGNOSTICS: usize = 10;

/// Summary used when the tool prints no `Messages:` line.
pub const NO_SUMMARY: &str = "No summary available";

const SUMMARY_MARKER: &str = "Messages:";
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Raw result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Something that can check one archive.
pub trait ExternalValidator {
    fn run(&self, archive: &Path) -> Result<ToolOutput, ToolError>;
}

// ---------------------------------------------------------------------------
// Command-backed validator
// ---------------------------------------------------------------------------

/// Runs a configured argv with the archive path appended.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    argv: Vec<String>,
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl CommandValidator {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self {
            argv,
            timeout,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ExternalValidator for CommandValidator {
    fn run(&self, archive: &Path) -> Result<ToolOutput, ToolError> {
        let (program, args) = self.argv.split_first().ok_or(ToolError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .arg(archive)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Drain both pipes on helper threads so a chatty tool cannot block on
        // a full pipe while we poll for exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    abandon(&mut child);
                    return Err(ToolError::Io(e));
                }
            }
            if Instant::now() >= deadline {
                abandon(&mut child);
                return Err(ToolError::Timeout {
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(ToolOutput {
            exit_code: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

/// Kill and reap a child we are giving up on.
fn abandon(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!(error = %e, "failed to kill validator");
    }
    if let Err(e) = child.wait() {
        tracing::warn!(error = %e, "failed to reap validator");
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Classified tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub is_valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    /// First [`MAX_DIAGNOSTICS`] error lines.
    pub errors: Vec<String>,
    /// First [`MAX_DIAGNOSTICS`] warning lines.
    pub warnings: Vec<String>,
    pub summary: String,
}

/// Classify tool output. Counts cover every line; the stored lists are
/// capped.
pub fn parse_diagnostics(exit_code: i32, output: &str) -> Diagnostics {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut summary = None;

    for line in output.lines() {
        if line.starts_with("ERROR") {
            errors.push(line);
        } else if line.starts_with("WARNING") {
            warnings.push(line);
        }
        if summary.is_none() && line.contains(SUMMARY_MARKER) {
            summary = Some(line);
        }
    }

    Diagnostics {
        is_valid: exit_code == 0 && errors.is_empty(),
        error_count: errors.len(),
        warning_count: warnings.len(),
        errors: keep(&errors),
        warnings: keep(&warnings),
        summary: summary.unwrap_or(NO_SUMMARY).to_string(),
    }
}

fn keep(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .take(MAX_DIAGNOSTICS)
        .map(|l| l.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Validation result for one archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub file_name: String,
    pub file_path: PathBuf,
    pub file_size: u64,
    pub is_valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: String,
    pub validation_time: DateTime<Utc>,
    pub return_code: i32,
}

impl ValidationOutcome {
    fn from_diagnostics(archive: &Path, return_code: i32, diagnostics: Diagnostics) -> Self {
        Self {
            file_name: file_name(archive),
            file_path: archive.to_path_buf(),
            file_size: file_size(archive),
            is_valid: diagnostics.is_valid,
            error_count: diagnostics.error_count,
            warning_count: diagnostics.warning_count,
            errors: diagnostics.errors,
            warnings: diagnostics.warnings,
            summary: diagnostics.summary,
            validation_time: Utc::now(),
            return_code,
        }
    }

    /// Outcome for a tool that could not produce a verdict.
    pub fn tool_failure(archive: &Path, err: &ToolError) -> Self {
        Self {
            file_name: file_name(archive),
            file_path: archive.to_path_buf(),
            file_size: file_size(archive),
            is_valid: false,
            error_count: 1,
            warning_count: 0,
            errors: vec![format!("Validation failed: {err}")],
            warnings: Vec::new(),
            summary: format!("Validation error: {err}"),
            validation_time: Utc::now(),
            return_code: -1,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Validate one archive. Never fails; tool problems become a failed outcome.
pub fn validate_archive(validator: &dyn ExternalValidator, archive: &Path) -> ValidationOutcome {
    match validator.run(archive) {
        Ok(output) => {
            let code = output.exit_code.unwrap_or(-1);
            let text = if output.stderr.is_empty() {
                output.stdout
            } else {
                format!("{}\n{}", output.stdout, output.stderr)
            };
            ValidationOutcome::from_diagnostics(archive, code, parse_diagnostics(code, &text))
        }
        Err(e) => {
            tracing::warn!(archive = %archive.display(), error = %e, "validator failed");
            ValidationOutcome::tool_failure(archive, &e)
        }
    }
}

/// Every `*.epub` directly inside `dir`, sorted by file name.
pub fn find_archives(dir: &Path) -> PackagingResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PackagingError::SourceNotFound {
            path: dir.to_path_buf(),
        });
    }
    Ok(WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
        })
        .collect())
}

/// Validate every archive in `dir`.
pub fn validate_batch(
    validator: &dyn ExternalValidator,
    dir: &Path,
) -> PackagingResult<Vec<ValidationOutcome>> {
    let archives = find_archives(dir)?;
    tracing::info!(count = archives.len(), dir = %dir.display(), "validating archives");
    Ok(archives
        .iter()
        .map(|archive| validate_archive(validator, archive))
        .collect())
}

/// Batch summary written by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub validation_timestamp: DateTime<Utc>,
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub results: Vec<ValidationOutcome>,
}

impl BatchReport {
    pub fn new(results: Vec<ValidationOutcome>) -> Self {
        let valid_files = results.iter().filter(|r| r.is_valid).count();
        Self {
            validation_timestamp: Utc::now(),
            total_files: results.len(),
            valid_files,
            invalid_files: results.len() - valid_files,
            results,
        }
    }

    pub fn all_valid(&self) -> bool {
        self.invalid_files == 0
    }
}
