//! Per-unit compliance results.
//!
//! A [`ComplianceResult`] is built append-only by the checker and frozen on
//! return: fields are private and only exposed through accessors.

use std::fmt;

use serde::{Deserialize, Serialize};

use quire_core::ContentUnit;

use crate::catalog::{STRUCTURE_GROUP, TYPEFACE_GROUP};

/// Whether an issue affects the compliant flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Marks the unit non-compliant.
    Fatal,
    /// Reported, but the unit may still be compliant.
    Advisory,
}

/// Classification of a recorded issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingRequirement,
    ForbiddenMarker,
    IncompleteGroup,
    UnreplacedPlaceholder,
    PossibleTruncation,
    MissingTitle,
    ReadFailure,
}

impl IssueKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::PossibleTruncation => Severity::Advisory,
            Self::MissingRequirement
            | Self::ForbiddenMarker
            | Self::IncompleteGroup
            | Self::UnreplacedPlaceholder
            | Self::MissingTitle
            | Self::ReadFailure => Severity::Fatal,
        }
    }
}

/// One compliance finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How a compound group fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub name: String,
    pub present: usize,
    pub required: usize,
    pub satisfied: bool,
}

/// Compliance result for one content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    file: String,
    path: String,
    sequence_key: u32,
    compliant: bool,
    issues: Vec<Issue>,
    missing_requirements: Vec<String>,
    unreplaced_placeholders: Vec<String>,
    groups: Vec<GroupOutcome>,
    content_chars: usize,
    file_size: usize,
    possibly_truncated: bool,
}

impl ComplianceResult {
    /// Result for a unit whose content could not be obtained.
    pub fn read_failure(path: &str, sequence_key: u32, detail: &str) -> Self {
        let file = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
        let mut builder = ResultBuilder {
            inner: Self::empty(file.to_string(), path.to_string(), sequence_key),
        };
        builder.record(IssueKind::ReadFailure, format!("Error reading file: {detail}"));
        builder.finish()
    }

    fn empty(file: String, path: String, sequence_key: u32) -> Self {
        Self {
            file,
            path,
            sequence_key,
            compliant: true,
            issues: Vec::new(),
            missing_requirements: Vec::new(),
            unreplaced_placeholders: Vec::new(),
            groups: Vec::new(),
            content_chars: 0,
            file_size: 0,
            possibly_truncated: false,
        }
    }

    /// File name of the unit.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn sequence_key(&self) -> u32 {
        self.sequence_key
    }

    pub fn is_compliant(&self) -> bool {
        self.compliant
    }

    /// Issues in the order the checks ran.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Names of unsatisfied requirements, standalone and grouped.
    pub fn missing_requirements(&self) -> &[String] {
        &self.missing_requirements
    }

    pub fn unreplaced_placeholders(&self) -> &[String] {
        &self.unreplaced_placeholders
    }

    pub fn groups(&self) -> &[GroupOutcome] {
        &self.groups
    }

    /// Whether the named group was evaluated and satisfied.
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name == name && g.satisfied)
    }

    pub fn has_typefaces(&self) -> bool {
        self.has_group(TYPEFACE_GROUP)
    }

    pub fn has_structure(&self) -> bool {
        self.has_group(STRUCTURE_GROUP)
    }

    pub fn content_chars(&self) -> usize {
        self.content_chars
    }

    pub fn file_size(&self) -> usize {
        self.file_size
    }

    pub fn is_possibly_truncated(&self) -> bool {
        self.possibly_truncated
    }
}

/// Append-only construction of a [`ComplianceResult`].
pub(crate) struct ResultBuilder {
    inner: ComplianceResult,
}

impl ResultBuilder {
    pub(crate) fn new(unit: &ContentUnit) -> Self {
        let mut inner = ComplianceResult::empty(
            unit.file_name().to_string(),
            unit.path().to_string(),
            unit.sequence_key(),
        );
        inner.content_chars = unit.char_len();
        inner.file_size = unit.byte_len();
        Self { inner }
    }

    pub(crate) fn record(&mut self, kind: IssueKind, message: impl Into<String>) {
        if kind.severity() == Severity::Fatal {
            self.inner.compliant = false;
        }
        if kind == IssueKind::PossibleTruncation {
            self.inner.possibly_truncated = true;
        }
        self.inner.issues.push(Issue {
            kind,
            message: message.into(),
        });
    }

    pub(crate) fn missing(&mut self, name: &str) {
        if !self.inner.missing_requirements.iter().any(|m| m == name) {
            self.inner.missing_requirements.push(name.to_string());
        }
    }

    pub(crate) fn placeholder(&mut self, token: &str) {
        self.inner.unreplaced_placeholders.push(token.to_string());
    }

    pub(crate) fn group(&mut self, outcome: GroupOutcome) {
        self.inner.groups.push(outcome);
    }

    pub(crate) fn finish(self) -> ComplianceResult {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_truncation_is_advisory() {
        assert_eq!(IssueKind::PossibleTruncation.severity(), Severity::Advisory);
        assert_eq!(IssueKind::MissingTitle.severity(), Severity::Fatal);
        assert_eq!(IssueKind::UnreplacedPlaceholder.severity(), Severity::Fatal);
    }

    #[test]
    fn read_failure_is_non_compliant_with_one_issue() {
        let result = ComplianceResult::read_failure("OEBPS/text/chapter-ii.xhtml", 2, "denied");
        assert!(!result.is_compliant());
        assert_eq!(result.file(), "chapter-ii.xhtml");
        assert_eq!(result.issue_count(), 1);
        assert_eq!(result.issues()[0].kind, IssueKind::ReadFailure);
        assert_eq!(result.issues()[0].to_string(), "Error reading file: denied");
    }

    #[test]
    fn advisory_issue_keeps_compliance() {
        let unit = ContentUnit::new("a.xhtml", "x", &quire_core::Sequencer::default());
        let mut builder = ResultBuilder::new(&unit);
        builder.record(IssueKind::PossibleTruncation, "short");
        let result = builder.finish();
        assert!(result.is_compliant());
        assert!(result.is_possibly_truncated());
    }

    #[test]
    fn missing_names_are_deduplicated() {
        let unit = ContentUnit::new("a.xhtml", "x", &quire_core::Sequencer::default());
        let mut builder = ResultBuilder::new(&unit);
        builder.missing("doctype");
        builder.missing("doctype");
        assert_eq!(builder.finish().missing_requirements().to_vec(), vec!["doctype".to_string()]);
    }
}
