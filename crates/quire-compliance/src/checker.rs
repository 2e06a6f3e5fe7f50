//! # Compliance Checker
//!
//! Applies a [`RuleCatalog`] to one [`ContentUnit`]. Every check runs even
//! after an earlier one fails, so a result lists *all* issues, in this order:
//!
//! 1. Standalone requirements (`Missing: <name>` / `Forbidden: <name>`).
//! 2. Compound groups, one combined issue per unsatisfied group.
//! 3. Placeholder tokens, one issue per token found. Zero tolerance.
//! 4. Minimum length, advisory only.
//! 5. Title element present and non-blank.
//!
//! The checker is a pure function of `(unit, catalog)`. Reading files is the
//! caller's job.

use quire_core::ContentUnit;

use crate::catalog::{Polarity, RuleCatalog};
use crate::result::{ComplianceResult, GroupOutcome, IssueKind, ResultBuilder};

/// Issue text for short content.
pub const TRUNCATION_ISSUE: &str = "Suspiciously short content - possible truncation";

/// Issue text for a missing or blank `<title>`.
pub const TITLE_ISSUE: &str = "Missing or empty title tag";

/// Check one unit against the catalog.
pub fn check(unit: &ContentUnit, catalog: &RuleCatalog) -> ComplianceResult {
    let text = unit.text();
    let mut result = ResultBuilder::new(unit);

    for req in catalog.standalone() {
        if req.is_satisfied(text) {
            continue;
        }
        result.missing(req.name());
        match req.polarity() {
            Polarity::Present => {
                result.record(IssueKind::MissingRequirement, format!("Missing: {}", req.name()))
            }
            Polarity::Absent => {
                result.record(IssueKind::ForbiddenMarker, format!("Forbidden: {}", req.name()))
            }
        }
    }

    for group in catalog.groups() {
        let mut present = 0;
        for member in catalog.members(group) {
            if member.is_satisfied(text) {
                present += 1;
            } else {
                result.missing(member.name());
            }
        }
        let satisfied = present >= group.min_present();
        result.group(GroupOutcome {
            name: group.name().to_string(),
            present,
            required: group.min_present(),
            satisfied,
        });
        if !satisfied {
            result.record(IssueKind::IncompleteGroup, group.issue());
        }
    }

    for token in catalog.placeholders() {
        if text.contains(token.as_str()) {
            result.placeholder(token);
            result.record(
                IssueKind::UnreplacedPlaceholder,
                format!("Unreplaced variable: {token}"),
            );
        }
    }

    if unit.char_len() < catalog.min_content_chars() {
        result.record(IssueKind::PossibleTruncation, TRUNCATION_ISSUE);
    }

    if !has_title(text) {
        result.record(IssueKind::MissingTitle, TITLE_ISSUE);
    }

    let result = result.finish();
    tracing::debug!(
        file = result.file(),
        compliant = result.is_compliant(),
        issues = result.issue_count(),
        "checked content unit"
    );
    result
}

/// Check units one after another, preserving input order.
pub fn check_all(units: &[ContentUnit], catalog: &RuleCatalog) -> Vec<ComplianceResult> {
    units.iter().map(|u| check(u, catalog)).collect()
}

/// Check units on up to `workers` scoped threads.
///
/// Output order equals input order, so aggregation over the result is
/// identical to [`check_all`].
pub fn check_all_parallel(
    units: &[ContentUnit],
    catalog: &RuleCatalog,
    workers: usize,
) -> Vec<ComplianceResult> {
    let workers = workers.max(1);
    if workers == 1 || units.len() < 2 {
        return check_all(units, catalog);
    }
    let chunk = units.len().div_ceil(workers);

    std::thread::scope(|scope| {
        let handles: Vec<_> = units
            .chunks(chunk)
            .map(|part| scope.spawn(move || check_all(part, catalog)))
            .collect();
        let mut results = Vec::with_capacity(units.len());
        for handle in handles {
            match handle.join() {
                Ok(part) => results.extend(part),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        results
    })
}

/// True when some `<title>` element holds non-blank text.
///
/// The first `<title>...</title>` pair whose body contains no markup
/// decides; an empty `<title></title>` never counts as a match.
fn has_title(text: &str) -> bool {
    const OPEN: &str = "<title>";
    const CLOSE: &str = "</title>";
    for (start, _) in text.match_indices(OPEN) {
        let rest = &text[start + OPEN.len()..];
        let body_len = rest.find('<').unwrap_or(rest.len());
        if body_len == 0 || !rest[body_len..].starts_with(CLOSE) {
            continue;
        }
        return !rest[..body_len].trim().is_empty();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDefinition, STRUCTURE_GROUP, TYPEFACE_GROUP};
    use crate::result::Severity;
    use proptest::prelude::*;
    use quire_core::Sequencer;

    const HEAD_FONTS: &str = r#"<link href="https://fonts.googleapis.com/css2?family=Cinzel+Decorative:wght@400;700&amp;family=Libre+Baskerville:ital,wght@0,400;0,700;1,400&amp;display=swap" rel="stylesheet" />"#;

    fn chapter(head_extra: &str, body: &str) -> String {
        let filler = "<p>Every stylist begins with a single strand of curiosity and a willingness to learn.</p>\n"
            .repeat(40);
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="en" lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Chapter IV: The Art of Networking</title>
  {head_extra}
</head>
<body>
{body}
{filler}
</body>
</html>"#
        )
    }

    fn structure(markers: &[bool; 3]) -> String {
        let mut out = String::new();
        if markers[0] {
            out.push_str(r#"<div class="chapter-number-container"><span>IV</span></div>"#);
        }
        if markers[1] {
            out.push_str(r#"<div class="chapter-title-container">"#);
        }
        if markers[2] {
            out.push_str(r#"<span class="chapter-title-word">Networking</span>"#);
        }
        if markers[1] {
            out.push_str("</div>");
        }
        out
    }

    fn unit(text: &str) -> ContentUnit {
        ContentUnit::new(
            "OEBPS/text/13-chapter-iv-networking.xhtml",
            text,
            &Sequencer::default(),
        )
    }

    fn messages(result: &ComplianceResult) -> Vec<String> {
        result.issues().iter().map(|i| i.message.clone()).collect()
    }

    #[test]
    fn full_template_is_compliant() {
        let catalog = RuleCatalog::canonical().unwrap();
        let result = check(&unit(&chapter(HEAD_FONTS, &structure(&[true; 3]))), &catalog);
        assert!(result.is_compliant(), "{:?}", messages(&result));
        assert!(result.issues().is_empty());
        assert!(result.has_typefaces());
        assert!(result.has_structure());
        assert_eq!(result.sequence_key(), 4);
        assert_eq!(result.file(), "13-chapter-iv-networking.xhtml");
    }

    #[test]
    fn placeholder_is_reported_once_and_fails() {
        let catalog = RuleCatalog::canonical().unwrap();
        let body = format!("{}<h1>{{{{CHAPTER_TITLE}}}}</h1>", structure(&[true; 3]));
        let result = check(&unit(&chapter(HEAD_FONTS, &body)), &catalog);
        assert!(!result.is_compliant());
        let unreplaced: Vec<_> = messages(&result)
            .into_iter()
            .filter(|m| m.starts_with("Unreplaced variable"))
            .collect();
        assert_eq!(unreplaced, vec!["Unreplaced variable: {{CHAPTER_TITLE}}"]);
        assert_eq!(result.unreplaced_placeholders().to_vec(), vec!["{{CHAPTER_TITLE}}"]);
    }

    #[test]
    fn two_of_three_structure_markers_pass() {
        let catalog = RuleCatalog::canonical().unwrap();
        for markers in [[true, true, false], [true, false, true], [false, true, true]] {
            let result = check(&unit(&chapter(HEAD_FONTS, &structure(&markers))), &catalog);
            assert!(result.has_structure(), "{markers:?}");
            assert!(result.is_compliant(), "{markers:?}: {:?}", messages(&result));
            assert_eq!(result.missing_requirements().len(), 1);
        }
    }

    #[test]
    fn fewer_than_two_structure_markers_fail_with_one_issue() {
        let catalog = RuleCatalog::canonical().unwrap();
        for markers in [[false; 3], [true, false, false], [false, false, true]] {
            let result = check(&unit(&chapter(HEAD_FONTS, &structure(&markers))), &catalog);
            assert!(!result.has_structure());
            assert!(!result.is_compliant());
            let structural: Vec<_> = messages(&result)
                .into_iter()
                .filter(|m| m.contains("chapter structure"))
                .collect();
            assert_eq!(structural.len(), 1);
        }
    }

    #[test]
    fn typefaces_are_one_compound_issue() {
        let catalog = RuleCatalog::canonical().unwrap();
        let result = check(&unit(&chapter("", &structure(&[true; 3]))), &catalog);
        assert!(!result.is_compliant());
        assert!(!result.has_typefaces());
        assert_eq!(messages(&result), vec!["Missing proper typeface links"]);
        assert_eq!(
            result.missing_requirements().to_vec(),
            vec!["cinzel_font", "baskerville_font"]
        );
    }

    #[test]
    fn one_typeface_is_not_enough() {
        let catalog = RuleCatalog::canonical().unwrap();
        let cinzel_only = r#"<link href="https://fonts.googleapis.com/css2?family=Cinzel+Decorative&amp;display=swap" rel="stylesheet" />"#;
        let result = check(&unit(&chapter(cinzel_only, &structure(&[true; 3]))), &catalog);
        assert!(!result.has_typefaces());
        assert_eq!(result.missing_requirements().to_vec(), vec!["baskerville_font"]);
    }

    #[test]
    fn short_content_is_advisory_only() {
        let catalog = RuleCatalog::canonical().unwrap();
        let text = format!(
            "<!DOCTYPE html><html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"en\" lang=\"en\"><head><meta charset=\"UTF-8\" /><meta name=\"viewport\" content=\"\" /><title>Short</title>{HEAD_FONTS}</head><body>{}</body></html>",
            structure(&[true; 3])
        );
        let result = check(&unit(&text), &catalog);
        assert!(result.is_compliant(), "{:?}", messages(&result));
        assert!(result.is_possibly_truncated());
        assert_eq!(messages(&result), vec![TRUNCATION_ISSUE]);
        assert_eq!(result.issues()[0].severity(), Severity::Advisory);
    }

    #[test]
    fn empty_title_fails() {
        let catalog = RuleCatalog::canonical().unwrap();
        let text = chapter(HEAD_FONTS, &structure(&[true; 3]))
            .replace("<title>Chapter IV: The Art of Networking</title>", "<title>   </title>");
        let result = check(&unit(&text), &catalog);
        assert!(!result.is_compliant());
        assert_eq!(messages(&result), vec![TITLE_ISSUE]);
    }

    #[test]
    fn has_title_edge_cases() {
        assert!(has_title("<title>Chapter</title>"));
        assert!(!has_title("<title></title>"));
        assert!(!has_title("<title> \n </title>"));
        assert!(!has_title("<title>Unclosed"));
        assert!(!has_title("<head></head>"));
        assert!(has_title("<title></title><title>Second</title>"));
    }

    #[test]
    fn issues_follow_check_order() {
        let catalog = RuleCatalog::canonical().unwrap();
        let text = "<html><body>{{MAIN_CONTENT}} {{BOOK_TITLE}}</body></html>";
        let result = check(&unit(text), &catalog);
        assert_eq!(
            messages(&result),
            vec![
                "Missing: doctype",
                "Missing: html_namespace",
                "Missing: xml_lang",
                "Missing: lang_attr",
                "Missing: utf8_charset",
                "Missing: viewport_meta",
                "Missing proper typeface links",
                "Missing proper chapter structure",
                "Unreplaced variable: {{BOOK_TITLE}}",
                "Unreplaced variable: {{MAIN_CONTENT}}",
                TRUNCATION_ISSUE,
                TITLE_ISSUE,
            ]
        );
        let groups: Vec<_> = result.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(groups, vec![TYPEFACE_GROUP, STRUCTURE_GROUP]);
    }

    #[test]
    fn swapped_catalog_changes_rules_not_checker() {
        let def = CatalogDefinition {
            requirements: vec![],
            groups: vec![],
            placeholders: vec!["[[TODO]]".to_string()],
            min_content_chars: 0,
            ..CatalogDefinition::default()
        };
        let catalog = RuleCatalog::compile(&def).unwrap();
        let ok = check(&unit("<title>t</title>"), &catalog);
        assert!(ok.is_compliant());
        let bad = check(&unit("<title>t</title>[[TODO]]"), &catalog);
        assert_eq!(messages(&bad), vec!["Unreplaced variable: [[TODO]]"]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let catalog = RuleCatalog::canonical().unwrap();
        let seq = Sequencer::default();
        let units: Vec<ContentUnit> = (0..9)
            .map(|i| {
                let body = if i % 2 == 0 { structure(&[true; 3]) } else { String::new() };
                ContentUnit::new(format!("chapter-{i}.xhtml"), chapter(HEAD_FONTS, &body), &seq)
            })
            .collect();
        let sequential = check_all(&units, &catalog);
        for workers in [0, 1, 2, 4, 16] {
            assert_eq!(check_all_parallel(&units, &catalog, workers), sequential);
        }
    }

    proptest! {
        #[test]
        fn check_is_deterministic(text in ".{0,400}") {
            let catalog = RuleCatalog::canonical().unwrap();
            let u = unit(&text);
            prop_assert_eq!(check(&u, &catalog), check(&u, &catalog));
        }

        #[test]
        fn placeholder_is_never_compliant(idx in 0usize..17, at in 0usize..2000) {
            let catalog = RuleCatalog::canonical().unwrap();
            let mut text = chapter(HEAD_FONTS, &structure(&[true; 3]));
            let mut pos = at.min(text.len());
            while !text.is_char_boundary(pos) {
                pos -= 1;
            }
            text.insert_str(pos, &catalog.placeholders()[idx]);
            let result = check(&unit(&text), &catalog);
            prop_assert!(!result.is_compliant());
        }
    }
}
