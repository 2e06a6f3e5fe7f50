//! # Manifest
//!
//! An ordered list of `(archive path, byte source, compression)` entries.
//! Order is preserved exactly as given; the assembler only hoists the
//! `mimetype` entry to the front.
//!
//! [`Manifest::from_directory`] reproduces the conventional layout walk:
//! `mimetype`, then `META-INF/`, then `OEBPS/`, then any other regular
//! files at the root except previously built `.epub` files. Each walk is
//! sorted by file name so two runs over the same tree produce the same
//! archive.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{PackagingError, PackagingResult};

/// Archive path of the type-declaration entry.
pub const MIMETYPE_PATH: &str = "mimetype";

/// Exact content of the type-declaration entry.
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// Container descriptor path.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Package document path.
pub const PACKAGE_DOCUMENT_PATH: &str = "OEBPS/content.opf";

const META_INF_DIR: &str = "META-INF";
const CONTENT_DIR: &str = "OEBPS";

/// Per-entry compression policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

/// Where an entry's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl EntrySource {
    pub(crate) fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::File(path) => std::fs::read(path),
        }
    }
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub source: EntrySource,
    pub compression: Compression,
}

impl ManifestEntry {
    /// Deflated entry backed by a file.
    pub fn file(path: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: EntrySource::File(source.into()),
            compression: Compression::Deflated,
        }
    }

    /// Deflated entry backed by in-memory bytes.
    pub fn bytes(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            source: EntrySource::Bytes(bytes.into()),
            compression: Compression::Deflated,
        }
    }

    pub fn stored(mut self) -> Self {
        self.compression = Compression::Stored;
        self
    }

    pub fn is_type_declaration(&self) -> bool {
        self.path == MIMETYPE_PATH
    }
}

/// Ordered collection of manifest entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a manifest from an unpacked package directory.
    ///
    /// The `mimetype` entry is always included, even if the file is absent,
    /// so the assembler can reject the manifest with a precise error.
    pub fn from_directory(root: &Path) -> PackagingResult<Self> {
        if !root.is_dir() {
            return Err(PackagingError::SourceNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut manifest = Self::new();
        manifest.push(ManifestEntry::file(MIMETYPE_PATH, root.join(MIMETYPE_PATH)).stored());

        for dir in [META_INF_DIR, CONTENT_DIR] {
            let base = root.join(dir);
            if !base.is_dir() {
                tracing::warn!(dir = %base.display(), "package directory missing; skipping");
                continue;
            }
            for file in walk_files(&base) {
                if let Some(logical) = logical_path(root, &file) {
                    manifest.push(ManifestEntry::file(logical, file));
                }
            }
        }

        for file in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = file.file_name().to_string_lossy();
            // Previously built containers sit next to the sources.
            if name == MIMETYPE_PATH || name.to_ascii_lowercase().ends_with(".epub") {
                continue;
            }
            manifest.push(ManifestEntry::file(name.into_owned(), file.path()));
        }

        tracing::debug!(root = %root.display(), entries = manifest.len(), "built manifest from directory");
        Ok(manifest)
    }

    /// Build a manifest from an explicit list of paths relative to `root`.
    ///
    /// Paths are kept in the given order whether or not the files exist;
    /// missing sources surface as skipped entries during assembly.
    pub fn from_listing<S: AsRef<str>>(root: &Path, paths: &[S]) -> Self {
        let mut manifest = Self::new();
        for rel in paths {
            let rel = rel.as_ref();
            let entry = ManifestEntry::file(rel, root.join(rel));
            manifest.push(if rel == MIMETYPE_PATH {
                entry.stored()
            } else {
                entry
            });
        }
        manifest
    }
}

fn walk_files(base: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(base).sort_by_file_name() {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(dir = %base.display(), error = %e, "failed to read entry during walk");
            }
        }
    }
    files
}

/// Archive path for `file` relative to `root`, `/`-separated.
fn logical_path(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
