//! # Content Units
//!
//! A [`ContentUnit`] is a read-only snapshot of one document file (one
//! chapter) taken at check time. Checkers borrow it; nothing mutates it.
//! Transforms that need to change content build a new unit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::sequence::Sequencer;

/// Extension of markup content files.
const CONTENT_EXTENSION: &str = "xhtml";

/// One document-like file within the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    path: String,
    text: String,
    sequence_key: u32,
}

impl ContentUnit {
    /// Build a unit from text, deriving its sequence key from the file name.
    pub fn new(path: impl Into<String>, text: impl Into<String>, sequencer: &Sequencer) -> Self {
        let path = path.into();
        let sequence_key = sequencer.key(file_name_of(&path));
        Self {
            path,
            text: text.into(),
            sequence_key,
        }
    }

    /// Build a unit from raw bytes. Invalid UTF-8 is replaced, not rejected.
    pub fn from_bytes(path: impl Into<String>, bytes: &[u8], sequencer: &Sequencer) -> Self {
        Self::new(path, String::from_utf8_lossy(bytes).into_owned(), sequencer)
    }

    /// Read a unit from disk.
    pub fn read(path: &Path, sequencer: &Sequencer) -> CoreResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(
            path.to_string_lossy().into_owned(),
            &bytes,
            sequencer,
        ))
    }

    /// Logical path; the unit's identity.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.path)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Decoded Roman-numeral position; `0` when unsequenced.
    pub fn sequence_key(&self) -> u32 {
        self.sequence_key
    }

    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// Length in characters, the measure used by truncation checks.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Replace the text, keeping path and sequence key. Used by transforms
    /// that emit a revised unit.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            path: self.path.clone(),
            text: text.into(),
            sequence_key: self.sequence_key,
        }
    }
}

fn file_name_of(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}

/// List sequenced content files in `dir`, in Sequencer order.
///
/// Selects `*.xhtml` files whose name contains the sequencer prefix
/// (case-insensitive). Subdirectories are not descended into.
pub fn discover_unit_paths(dir: &Path, sequencer: &Sequencer) -> CoreResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CoreError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|source| CoreError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let prefix = sequencer.prefix().to_ascii_lowercase();
    let mut found = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_markup = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(CONTENT_EXTENSION));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if is_markup && name.contains(&prefix) {
            found.push(path);
        }
    }

    sequencer.sort_by_name(&mut found, |p| {
        p.file_name().and_then(|n| n.to_str()).unwrap_or("")
    });
    tracing::debug!(dir = %dir.display(), units = found.len(), "discovered content units");
    Ok(found)
}
