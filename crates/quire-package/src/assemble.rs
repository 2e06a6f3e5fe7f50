//! # Archive Assembler
//!
//! Writes a manifest into a zip container with the packaging invariants a
//! reading system expects:
//!
//! 1. Entry 0 is `mimetype`, stored uncompressed, containing exactly
//!    `application/epub+zip` with no trailing newline.
//! 2. Every other entry follows in manifest order, compressed per its policy.
//! 3. Archive paths are unique.
//!
//! ## Failure Policy
//!
//! The manifest is checked before a single byte is written. A duplicate path
//! or an unreadable `mimetype` source aborts; any other unreadable source is
//! skipped and listed in [`AssemblyReport::skipped`].

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PackagingError, PackagingResult};
use crate::manifest::{Compression, Manifest, EPUB_MIMETYPE, MIMETYPE_PATH};

/// Deflate level used for compressed entries.
const DEFLATE_LEVEL: i64 = 6;

/// An entry left out of the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

/// What an assembly run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyReport {
    /// Archive paths in write order; `mimetype` first.
    pub written: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    /// The `mimetype` source differed from the canonical literal, which was
    /// written instead.
    pub type_declaration_normalized: bool,
    pub output: Option<PathBuf>,
    pub size_bytes: Option<u64>,
    pub sha256: Option<String>,
}

/// Checks that must pass before any output exists.
struct Preflight {
    type_declaration_normalized: bool,
}

fn preflight(manifest: &Manifest) -> PackagingResult<Preflight> {
    let mut seen = HashSet::new();
    for entry in manifest.entries() {
        if !seen.insert(entry.path.as_str()) {
            return Err(PackagingError::DuplicatePath {
                path: entry.path.clone(),
            });
        }
    }

    let entry = manifest
        .entries()
        .iter()
        .find(|e| e.is_type_declaration())
        .ok_or_else(|| PackagingError::MissingTypeDeclaration {
            detail: "manifest has no mimetype entry".to_string(),
        })?;
    let source = entry
        .source
        .read()
        .map_err(|e| PackagingError::MissingTypeDeclaration {
            detail: e.to_string(),
        })?;

    let normalized = source.as_slice() != EPUB_MIMETYPE.as_bytes();
    if normalized {
        tracing::warn!("mimetype source differs from {EPUB_MIMETYPE}; writing canonical value");
    }
    Ok(Preflight {
        type_declaration_normalized: normalized,
    })
}

fn options_for(compression: Compression) -> SimpleFileOptions {
    match compression {
        Compression::Stored => {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        }
        Compression::Deflated => SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(DEFLATE_LEVEL)),
    }
}

/// Assemble `manifest` into `output`.
pub fn assemble<W: Write + Seek>(manifest: &Manifest, output: W) -> PackagingResult<AssemblyReport> {
    let checked = preflight(manifest)?;
    let mut report = AssemblyReport {
        type_declaration_normalized: checked.type_declaration_normalized,
        ..AssemblyReport::default()
    };

    let mut zip = ZipWriter::new(output);
    zip.start_file(MIMETYPE_PATH, options_for(Compression::Stored))?;
    zip.write_all(EPUB_MIMETYPE.as_bytes())?;
    report.written.push(MIMETYPE_PATH.to_string());

    for entry in manifest.entries().iter().filter(|e| !e.is_type_declaration()) {
        let bytes = match entry.source.read() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %entry.path, error = %e, "source not readable; skipping entry");
                report.skipped.push(SkippedEntry {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        zip.start_file(entry.path.as_str(), options_for(entry.compression))?;
        zip.write_all(&bytes)?;
        report.written.push(entry.path.clone());
    }

    let mut inner = zip.finish()?;
    inner.flush()?;

    tracing::info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        "assembled archive"
    );
    Ok(report)
}

/// Assemble into a file at `path`.
///
/// The manifest is validated before the file is created. If writing fails
/// part-way, the partial file is removed.
pub fn assemble_to_path(manifest: &Manifest, path: &Path) -> PackagingResult<AssemblyReport> {
    preflight(manifest)?;

    let io_err = |source| PackagingError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut report = match assemble(manifest, BufWriter::new(file)) {
        Ok(report) => report,
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %rm, "failed to remove partial archive");
            }
            return Err(e);
        }
    };

    let bytes = std::fs::read(path).map_err(io_err)?;
    report.output = Some(path.to_path_buf());
    report.size_bytes = Some(bytes.len() as u64);
    report.sha256 = Some(sha256_hex(&bytes));
    Ok(report)
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
