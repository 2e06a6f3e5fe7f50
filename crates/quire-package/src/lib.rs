//! # quire-package: Container Packaging
//!
//! Builds and checks the zip container a finished book ships in.
//!
//! - [`Manifest`]: ordered entries, built by hand or from an unpacked
//!   package directory.
//! - [`assemble`] / [`assemble_to_path`]: write the container with
//!   `mimetype` first and stored.
//! - [`verify`] / [`verify_path`]: re-open a container and re-derive the
//!   same invariants.
//! - [`ExternalValidator`]: the opaque conformance tool boundary, with
//!   [`CommandValidator`] as the process-backed implementation.
//! - [`RecordStore`]: persisted per-archive validation verdicts.

pub mod assemble;
pub mod error;
pub mod manifest;
pub mod records;
pub mod validator;
pub mod verify;

pub use assemble::{assemble, assemble_to_path, AssemblyReport, SkippedEntry};
pub use error::{PackagingError, PackagingResult, StoreError, StoreResult, ToolError};
pub use manifest::{
    Compression, EntrySource, Manifest, ManifestEntry, CONTAINER_PATH, EPUB_MIMETYPE,
    MIMETYPE_PATH, PACKAGE_DOCUMENT_PATH,
};
pub use records::{JsonRecordStore, RecordStatus, RecordStore, ValidationRecord};
pub use validator::{
    find_archives, parse_diagnostics, validate_archive, validate_batch, BatchReport,
    CommandValidator, Diagnostics, ExternalValidator, ToolOutput, ValidationOutcome,
    MAX_DIAGNOSTICS, NO_SUMMARY,
};
pub use verify::{
    verify, verify_path, ArchiveEntry, ContentCounts, Defect, VerificationReport,
    CRITICAL_ENTRIES,
};
