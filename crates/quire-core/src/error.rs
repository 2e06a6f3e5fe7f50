//! Error types for content-unit loading and discovery.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating or reading content units.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The content directory does not exist or is not a directory.
    #[error("content directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Reading a file or directory failed.
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_not_found_display() {
        let err = CoreError::DirectoryNotFound {
            path: PathBuf::from("OEBPS/text"),
        };
        assert!(format!("{err}").contains("OEBPS/text"));
    }

    #[test]
    fn read_display_carries_path_and_chains_cause() {
        let err = CoreError::Read {
            path: PathBuf::from("/tmp/chapter-i.xhtml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("chapter-i.xhtml"));
        assert!(!msg.contains("denied"), "cause belongs to the source chain: {msg}");
        let cause = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("denied"));
    }
}
