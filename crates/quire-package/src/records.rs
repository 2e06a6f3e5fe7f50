//! # Validation Records
//!
//! One record per archive path, replaced on collision. [`JsonRecordStore`]
//! keeps the map in a single pretty-printed JSON file and rewrites it on
//! every upsert.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::validator::ValidationOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub path: String,
    pub status: RecordStatus,
    pub defect_count: usize,
    pub note: String,
}

impl ValidationRecord {
    pub fn from_outcome(outcome: &ValidationOutcome) -> Self {
        Self {
            path: outcome.file_path.display().to_string(),
            status: if outcome.is_valid {
                RecordStatus::Pass
            } else {
                RecordStatus::Fail
            },
            defect_count: outcome.error_count,
            note: format!(
                "Errors: {}, Warnings: {}",
                outcome.error_count, outcome.warning_count
            ),
        }
    }
}

/// Path-keyed record persistence.
pub trait RecordStore {
    /// Insert or replace the record for `record.path`.
    fn upsert(&mut self, record: ValidationRecord) -> StoreResult<()>;
    fn get(&self, path: &str) -> Option<ValidationRecord>;
    /// All records, ordered by path.
    fn all(&self) -> Vec<ValidationRecord>;
}

/// Write-through JSON file store.
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    records: BTreeMap<String, ValidationRecord>,
}

impl JsonRecordStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let records = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl RecordStore for JsonRecordStore {
    fn upsert(&mut self, record: ValidationRecord) -> StoreResult<()> {
        tracing::debug!(path = %record.path, status = %record.status, "upserting record");
        self.records.insert(record.path.clone(), record);
        self.persist()
    }

    fn get(&self, path: &str) -> Option<ValidationRecord> {
        self.records.get(path).cloned()
    }

    fn all(&self) -> Vec<ValidationRecord> {
        self.records.values().cloned().collect()
    }
}
