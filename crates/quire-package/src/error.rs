//! Packaging error types.
//!
//! Only two conditions abort an assembly: a missing type-declaration source
//! and a duplicated archive path. Missing sources for other entries are
//! recorded on the [`AssemblyReport`](crate::AssemblyReport) instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by assembly, verification I/O, and archive discovery.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The manifest has no readable `mimetype` source.
    #[error("type-declaration entry `mimetype` unavailable: {detail}")]
    MissingTypeDeclaration { detail: String },

    /// Two manifest entries map to the same archive path.
    #[error("duplicate archive path in manifest: {path}")]
    DuplicatePath { path: String },

    /// A required input directory does not exist.
    #[error("source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The zip writer or reader failed.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Filesystem I/O failed.
    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing to a caller-supplied stream failed.
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Result alias for packaging operations.
pub type PackagingResult<T> = Result<T, PackagingError>;

/// Errors raised by the validation record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store I/O error at {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("record store at {path} is corrupt")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures invoking the external validation tool.
///
/// These never escape a batch run; they are folded into a failed
/// [`ValidationOutcome`](crate::ValidationOutcome).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("validator command is empty")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("timed out after {}s", .timeout.as_secs())]
    Timeout { timeout: std::time::Duration },

    #[error("I/O error talking to validator: {0}")]
    Io(#[from] std::io::Error),
}
