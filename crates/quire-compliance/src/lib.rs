//! # quire-compliance: Template-Compliance Rule Engine
//!
//! Inspects chapter files against an enumerated template contract and
//! reports every violation as data.
//!
//! ```text
//! CatalogDefinition --compile--> RuleCatalog
//!                                     |
//! ContentUnit (sequenced) ----------> check() --> ComplianceResult
//!                                                       |
//!                         aggregate() <-----------------+
//!                              |
//!                        ComplianceReport
//! ```
//!
//! - [`catalog`]: requirement definitions, compound groups, placeholder tokens.
//! - [`checker`]: exhaustive per-unit evaluation (no short-circuit).
//! - [`report`]: counts, compliance rate, issue ranking, critical units.
//! - [`remediate`]: idempotent transform that retrofits missing markup.
//!
//! Findings never surface as `Err`: a unit that fails every rule still
//! produces an `Ok`-shaped [`ComplianceResult`]. The only error type is
//! [`CatalogError`], raised when a catalog definition does not compile.

pub mod catalog;
pub mod checker;
pub mod error;
pub mod remediate;
pub mod report;
pub mod result;

pub use catalog::{
    CatalogDefinition, GroupDef, MatcherDef, Polarity, RequirementDef, RuleCatalog,
    PLACEHOLDER_TOKENS, STRUCTURE_GROUP, TYPEFACE_GROUP,
};
pub use checker::{check, check_all, check_all_parallel};
pub use error::{CatalogError, CatalogResult};
pub use remediate::{remediate, Remediated, Remediation};
pub use report::{
    aggregate, aggregate_with_threshold, ComplianceReport, CriticalUnit, IssueFrequency,
    CRITICAL_ISSUE_THRESHOLD,
};
pub use result::{ComplianceResult, GroupOutcome, Issue, IssueKind, Severity};
