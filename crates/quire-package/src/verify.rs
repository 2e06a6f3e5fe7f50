//! # Archive Verifier
//!
//! Re-opens an assembled container and re-derives the packaging invariants
//! the assembler encodes. Every check runs; defects are collected, never
//! short-circuited. Content counts are descriptive only.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use serde::{Deserialize, Serialize};
use zip::{CompressionMethod, ZipArchive};

use crate::error::{PackagingError, PackagingResult};
use crate::manifest::{CONTAINER_PATH, EPUB_MIMETYPE, MIMETYPE_PATH, PACKAGE_DOCUMENT_PATH};

/// Entries whose absence is a defect.
pub const CRITICAL_ENTRIES: [&str; 3] = [MIMETYPE_PATH, CONTAINER_PATH, PACKAGE_DOCUMENT_PATH];

/// A packaging defect found in an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Defect {
    /// The bytes are not a readable zip archive.
    Unreadable { detail: String },
    MissingEntry { path: String },
    /// Entry 0 is something other than `mimetype`.
    TypeDeclarationNotFirst { first: String },
    TypeDeclarationCompressed,
    /// `mimetype` content, trimmed, is not the expected literal.
    TypeDeclarationMismatch { found: String },
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable { detail } => write!(f, "archive is not readable: {detail}"),
            Self::MissingEntry { path } => write!(f, "missing critical entry: {path}"),
            Self::TypeDeclarationNotFirst { first } => {
                write!(f, "first entry is {first}, expected {MIMETYPE_PATH}")
            }
            Self::TypeDeclarationCompressed => {
                write!(f, "{MIMETYPE_PATH} entry is compressed")
            }
            Self::TypeDeclarationMismatch { found } => {
                write!(f, "{MIMETYPE_PATH} content is {found:?}, expected {EPUB_MIMETYPE:?}")
            }
        }
    }
}

/// One entry as seen in the archive directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub compressed: bool,
    pub size: u64,
}

/// Entry counts by content category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCounts {
    pub markup: usize,
    pub style: usize,
    pub image: usize,
    pub font: usize,
}

impl ContentCounts {
    fn tally(&mut self, name: &str) {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xhtml" | "html" | "htm" => self.markup += 1,
            "css" => self.style += 1,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" => self.image += 1,
            "woff2" | "woff" | "ttf" | "otf" => self.font += 1,
            _ => {}
        }
    }
}

/// Outcome of [`verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub defects: Vec<Defect>,
    pub entries: Vec<ArchiveEntry>,
    pub counts: ContentCounts,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.entries.len()
    }
}

/// Verify an archive read from `reader`.
pub fn verify<R: Read + Seek>(reader: R) -> VerificationReport {
    let mut report = VerificationReport::default();

    let mut archive = match ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(e) => {
            report.defects.push(Defect::Unreadable {
                detail: e.to_string(),
            });
            return report;
        }
    };

    for index in 0..archive.len() {
        match archive.by_index(index) {
            Ok(file) => {
                let entry = ArchiveEntry {
                    name: file.name().to_string(),
                    compressed: file.compression() != CompressionMethod::Stored,
                    size: file.size(),
                };
                report.counts.tally(&entry.name);
                report.entries.push(entry);
            }
            Err(e) => report.defects.push(Defect::Unreadable {
                detail: format!("entry {index}: {e}"),
            }),
        }
    }

    for path in CRITICAL_ENTRIES {
        if !report.entries.iter().any(|e| e.name == path) {
            report.defects.push(Defect::MissingEntry {
                path: path.to_string(),
            });
        }
    }

    if let Some(first) = report.entries.first() {
        if first.name != MIMETYPE_PATH {
            report.defects.push(Defect::TypeDeclarationNotFirst {
                first: first.name.clone(),
            });
        }
    }

    if let Some(declared) = report.entries.iter().find(|e| e.name == MIMETYPE_PATH) {
        if declared.compressed {
            report.defects.push(Defect::TypeDeclarationCompressed);
        }
        match read_entry(&mut archive, MIMETYPE_PATH) {
            Ok(bytes) => {
                let found = String::from_utf8_lossy(&bytes).trim().to_string();
                if found != EPUB_MIMETYPE {
                    report.defects.push(Defect::TypeDeclarationMismatch { found });
                }
            }
            Err(e) => report.defects.push(Defect::Unreadable {
                detail: format!("{MIMETYPE_PATH}: {e}"),
            }),
        }
    }

    tracing::debug!(
        entries = report.entries.len(),
        defects = report.defects.len(),
        "verified archive"
    );
    report
}

/// Verify the archive at `path`. Fails only if the file cannot be opened.
pub fn verify_path(path: &Path) -> PackagingResult<VerificationReport> {
    let file = File::open(path).map_err(|source| PackagingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(verify(BufReader::new(file)))
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> PackagingResult<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
