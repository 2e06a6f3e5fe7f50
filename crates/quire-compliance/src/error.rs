//! Rule-catalog errors.
//!
//! Compliance *findings* are never errors: they are recorded as data on a
//! [`ComplianceResult`](crate::ComplianceResult). The only failures this
//! crate raises come from compiling a catalog definition.

use thiserror::Error;

/// Errors raised while compiling a [`CatalogDefinition`](crate::CatalogDefinition).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A requirement's pattern is not a valid regular expression.
    #[error("invalid pattern for requirement {name:?}")]
    InvalidPattern {
        name: String,
        source: regex::Error,
    },

    /// Two requirements share a name.
    #[error("duplicate requirement name: {name:?}")]
    DuplicateRequirement { name: String },

    /// A compound group references a requirement the catalog does not define.
    #[error("group {group:?} references unknown requirement {name:?}")]
    UnknownRequirement { group: String, name: String },

    /// A compound group can never be satisfied.
    #[error("group {group:?} requires {min_present} of {members} members")]
    UnsatisfiableGroup {
        group: String,
        min_present: usize,
        members: usize,
    },
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
