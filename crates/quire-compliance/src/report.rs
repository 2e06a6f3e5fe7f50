//! # Aggregate Reporter
//!
//! Folds per-unit results into a corpus summary. Nothing is recomputed from
//! content; the report is derived entirely from the results it is given.
//!
//! ## Determinism
//!
//! Both rankings are stable sorts over the input order, so ties resolve
//! the same way on every run:
//!
//! - Issue frequency: descending count, ties by first appearance when the
//!   issues of all results are flattened in order.
//! - Critical units: descending issue count, ties by input order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::result::ComplianceResult;

/// A non-compliant unit is critical when its issue count exceeds this.
pub const CRITICAL_ISSUE_THRESHOLD: usize = 3;

/// How often an issue text occurred across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFrequency {
    pub issue: String,
    pub count: usize,
}

/// A unit flagged as critical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalUnit {
    pub file: String,
    pub issue_count: usize,
    pub issues: Vec<String>,
}

/// Corpus-level compliance summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub total: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    /// Percentage of compliant units, `0.0` for an empty corpus.
    pub compliance_rate: f64,
    pub issue_frequency: Vec<IssueFrequency>,
    pub critical: Vec<CriticalUnit>,
}

impl ComplianceReport {
    /// The `n` most frequent issues.
    pub fn top_issues(&self, n: usize) -> &[IssueFrequency] {
        &self.issue_frequency[..n.min(self.issue_frequency.len())]
    }

    pub fn is_fully_compliant(&self) -> bool {
        self.non_compliant == 0
    }
}

/// Aggregate with the default critical threshold.
pub fn aggregate(results: &[ComplianceResult]) -> ComplianceReport {
    aggregate_with_threshold(results, CRITICAL_ISSUE_THRESHOLD)
}

/// Aggregate; units with more than `critical_threshold` issues that are
/// also non-compliant are listed as critical.
pub fn aggregate_with_threshold(
    results: &[ComplianceResult],
    critical_threshold: usize,
) -> ComplianceReport {
    let total = results.len();
    let compliant = results.iter().filter(|r| r.is_compliant()).count();
    let compliance_rate = if total == 0 {
        0.0
    } else {
        compliant as f64 / total as f64 * 100.0
    };

    let mut issue_frequency: Vec<IssueFrequency> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for issue in results.iter().flat_map(|r| r.issues()) {
        match position.get(issue.message.as_str()) {
            Some(&idx) => issue_frequency[idx].count += 1,
            None => {
                position.insert(issue.message.as_str(), issue_frequency.len());
                issue_frequency.push(IssueFrequency {
                    issue: issue.message.clone(),
                    count: 1,
                });
            }
        }
    }
    issue_frequency.sort_by(|a, b| b.count.cmp(&a.count));

    let mut critical: Vec<CriticalUnit> = results
        .iter()
        .filter(|r| !r.is_compliant() && r.issue_count() > critical_threshold)
        .map(|r| CriticalUnit {
            file: r.file().to_string(),
            issue_count: r.issue_count(),
            issues: r.issues().iter().map(|i| i.message.clone()).collect(),
        })
        .collect();
    critical.sort_by(|a, b| b.issue_count.cmp(&a.issue_count));

    tracing::info!(
        total,
        compliant,
        non_compliant = total - compliant,
        critical = critical.len(),
        "aggregated compliance results"
    );

    ComplianceReport {
        total,
        compliant,
        non_compliant: total - compliant,
        compliance_rate,
        issue_frequency,
        critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDefinition, GroupDef, MatcherDef, RequirementDef, RuleCatalog};
    use crate::checker::check;
    use quire_core::{ContentUnit, Sequencer};

    /// Catalog with four independent literal markers `a`..`d` and nothing else.
    fn letters_catalog() -> RuleCatalog {
        let requirements = ["a", "b", "c", "d"]
            .iter()
            .map(|n| RequirementDef {
                name: n.to_string(),
                matcher: MatcherDef::Literal(format!("[{n}]")),
                polarity: Default::default(),
                ignore_case: false,
            })
            .collect();
        RuleCatalog::compile(&CatalogDefinition {
            requirements,
            groups: Vec::<GroupDef>::new(),
            placeholders: vec![],
            min_content_chars: 0,
            ..CatalogDefinition::default()
        })
        .unwrap()
    }

    fn result(name: &str, text: &str, catalog: &RuleCatalog) -> ComplianceResult {
        check(
            &ContentUnit::new(name, format!("<title>t</title>{text}"), &Sequencer::default()),
            catalog,
        )
    }

    #[test]
    fn empty_corpus() {
        let report = aggregate(&[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.compliance_rate, 0.0);
        assert!(report.issue_frequency.is_empty());
        assert!(report.is_fully_compliant());
    }

    #[test]
    fn counts_and_rate() {
        let catalog = letters_catalog();
        let results = vec![
            result("one", "[a][b][c][d]", &catalog),
            result("two", "[a][b][c]", &catalog),
            result("three", "[a][b][c][d]", &catalog),
            result("four", "[a][b][c][d]", &catalog),
        ];
        let report = aggregate(&results);
        assert_eq!(report.total, 4);
        assert_eq!(report.compliant, 3);
        assert_eq!(report.non_compliant, 1);
        assert!((report.compliance_rate - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn frequency_ties_break_by_first_appearance() {
        let catalog = letters_catalog();
        let results = vec![
            result("one", "[a][b]", &catalog),     // missing c, d
            result("two", "[a][c][d]", &catalog),  // missing b
            result("three", "[a][c]", &catalog),   // missing b, d
        ];
        let report = aggregate(&results);
        let ranked: Vec<(&str, usize)> = report
            .issue_frequency
            .iter()
            .map(|f| (f.issue.as_str(), f.count))
            .collect();
        // d and b both occur twice; d was seen first.
        assert_eq!(
            ranked,
            vec![("Missing: d", 2), ("Missing: b", 2), ("Missing: c", 1)]
        );
        assert_eq!(report.top_issues(1).len(), 1);
        assert_eq!(report.top_issues(10).len(), 3);
    }

    #[test]
    fn critical_requires_more_than_threshold_and_sorts_stably() {
        let catalog = letters_catalog();
        let results = vec![
            result("three-issues", "[d]", &catalog),
            result("four-a", "", &catalog),
            result("fine", "[a][b][c][d]", &catalog),
            result("four-b", "", &catalog),
        ];
        let report = aggregate(&results);
        let files: Vec<&str> = report.critical.iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, vec!["four-a", "four-b"]);
        assert_eq!(report.critical[0].issue_count, 4);

        let lowered = aggregate_with_threshold(&results, 2);
        let files: Vec<&str> = lowered.critical.iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, vec!["four-a", "four-b", "three-issues"]);
    }

    #[test]
    fn compliant_units_with_many_advisories_are_not_critical() {
        let catalog = letters_catalog();
        let mut def = CatalogDefinition {
            requirements: vec![],
            groups: vec![],
            placeholders: vec![],
            ..CatalogDefinition::default()
        };
        def.min_content_chars = 10_000;
        let short = RuleCatalog::compile(&def).unwrap();
        let results = vec![result("short", "", &short), result("ok", "[a][b][c][d]", &catalog)];
        let report = aggregate_with_threshold(&results, 0);
        assert!(report.critical.is_empty());
        assert_eq!(report.compliant, 2);
    }
}
