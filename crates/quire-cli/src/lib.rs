//! # quire-cli: Command-Line Interface
//!
//! The `quire` binary. Handlers parse nothing themselves and hold no
//! business logic; they load inputs, call the library crates, print, and
//! return a process exit code.
//!
//! ## Subcommands
//!
//! - `quire check`: chapter template compliance report.
//! - `quire fix`: write remediated chapters to an output directory.
//! - `quire build`: assemble a container from an unpacked package, then verify it.
//! - `quire verify`: verify an existing container.
//! - `quire validate`: run the external conformance tool over every container.
//!
//! ## Exit Codes
//!
//! `0` success, `1` missing input or internal error, `2` the inputs were
//! processed and found wanting.

pub mod build;
pub mod check;
pub mod config;
pub mod fix;
pub mod validate;
pub mod verify;

use std::path::{Path, PathBuf};

/// Subdirectory of a package holding the chapter files.
pub const CONTENT_SUBDIR: &str = "OEBPS/text";

/// Resolve a user-supplied path against the working directory.
pub fn resolve_path(path: &Path, work_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}

/// Timestamp used in generated file names.
pub(crate) fn file_stamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}
