//! # Template Remediation
//!
//! Retrofits missing template markup into an existing chapter. This is a
//! content migration, kept apart from the checker: it consumes the same
//! [`RuleCatalog`] to decide what is missing and emits a *new*
//! [`ContentUnit`]; the input is never touched.
//!
//! Every fix is conditional on its requirement being unmet in the current
//! working text, which makes the transform idempotent: a second pass over
//! its own output applies nothing.

use serde::{Deserialize, Serialize};

use quire_core::ContentUnit;

use crate::catalog::RuleCatalog;

/// Markup inserted before `</head>` when any of its requirements is unmet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSnippet {
    pub label: String,
    pub requirements: Vec<String>,
    pub markup: String,
}

/// Remediation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Remediation {
    /// Requirement name guarding the doctype fix.
    pub doctype_requirement: String,
    pub doctype: String,
    /// Attributes the root `<html>` element must carry, in insertion order.
    pub html_attributes: Vec<(String, String)>,
    pub head_snippets: Vec<HeadSnippet>,
}

impl Default for Remediation {
    fn default() -> Self {
        Self {
            doctype_requirement: "doctype".to_string(),
            doctype: "<!DOCTYPE html>".to_string(),
            html_attributes: vec![
                ("xmlns".to_string(), "http://www.w3.org/1999/xhtml".to_string()),
                ("xml:lang".to_string(), "en".to_string()),
                ("lang".to_string(), "en".to_string()),
            ],
            head_snippets: vec![
                HeadSnippet {
                    label: "charset meta".to_string(),
                    requirements: vec!["utf8_charset".to_string()],
                    markup: r#"<meta charset="UTF-8" />"#.to_string(),
                },
                HeadSnippet {
                    label: "viewport meta".to_string(),
                    requirements: vec!["viewport_meta".to_string()],
                    markup: r#"<meta name="viewport" content="width=device-width, initial-scale=1.0" />"#
                        .to_string(),
                },
                HeadSnippet {
                    label: "typeface link".to_string(),
                    requirements: vec!["cinzel_font".to_string(), "baskerville_font".to_string()],
                    markup: r#"<link href="https://fonts.googleapis.com/css2?family=Cinzel+Decorative:wght@400;700&amp;family=Libre+Baskerville:ital,wght@0,400;0,700;1,400&amp;display=swap" rel="stylesheet" />"#
                        .to_string(),
                },
            ],
        }
    }
}

/// Output of [`remediate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediated {
    pub unit: ContentUnit,
    /// Human-readable fixes, in application order.
    pub applied: Vec<String>,
}

impl Remediated {
    pub fn is_changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Apply the remediation fixes to a copy of `unit`.
pub fn remediate(unit: &ContentUnit, catalog: &RuleCatalog, settings: &Remediation) -> Remediated {
    let mut text = unit.text().to_string();
    let mut applied = Vec::new();

    let unmet = |text: &str, name: &str| {
        catalog
            .requirement(name)
            .is_some_and(|req| !req.is_satisfied(text))
    };

    if unmet(&text, &settings.doctype_requirement) {
        fix_doctype(&mut text, &settings.doctype);
        applied.push("Fixed DOCTYPE".to_string());
    }

    if text.contains(r#"charset="utf-8""#) && !text.contains(r#"charset="UTF-8""#) {
        text = text.replace(r#"charset="utf-8""#, r#"charset="UTF-8""#);
        applied.push("Standardized charset to UTF-8".to_string());
    }

    if let Some((start, end)) = find_open_tag(&text, "html") {
        let mut tag = text[start..end].to_string();
        for (name, value) in &settings.html_attributes {
            if !has_attribute(&tag, name) {
                tag.insert_str(tag.len() - 1, &format!(r#" {name}="{value}""#));
                applied.push(format!("Added {name} attribute"));
            }
        }
        text.replace_range(start..end, &tag);
    }

    for snippet in &settings.head_snippets {
        if !snippet.requirements.iter().any(|r| unmet(&text, r)) {
            continue;
        }
        match text.find("</head>") {
            Some(pos) => {
                text.insert_str(pos, &format!("  {}\n", snippet.markup));
                applied.push(format!("Added {}", snippet.label));
            }
            None => {
                tracing::warn!(file = unit.file_name(), snippet = %snippet.label, "no </head> to insert into");
            }
        }
    }

    if !applied.is_empty() {
        tracing::debug!(file = unit.file_name(), fixes = applied.len(), "remediated content unit");
    }

    Remediated {
        unit: unit.with_text(text),
        applied,
    }
}

/// Replace the first `<!DOCTYPE ...>` with `doctype`, or insert one after
/// the XML declaration (or at the start) when there is none.
fn fix_doctype(text: &mut String, doctype: &str) {
    let lower = text.to_ascii_lowercase();
    if let Some(start) = lower.find("<!doctype") {
        if let Some(len) = lower[start..].find('>') {
            text.replace_range(start..start + len + 1, doctype);
            return;
        }
    }
    let insert_at = if lower.starts_with("<?xml") {
        lower.find("?>").map(|p| p + 2).unwrap_or(0)
    } else {
        0
    };
    if insert_at == 0 {
        text.insert_str(0, &format!("{doctype}\n"));
    } else {
        text.insert_str(insert_at, &format!("\n{doctype}"));
    }
}

/// Byte range of the first `<name ...>` start tag, including brackets.
fn find_open_tag(text: &str, name: &str) -> Option<(usize, usize)> {
    let open = format!("<{name}");
    for (start, _) in text.match_indices(open.as_str()) {
        let after = &text[start + open.len()..];
        match after.chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => {
                let end = after.find('>')? + start + open.len() + 1;
                return Some((start, end));
            }
            _ => continue,
        }
    }
    None
}

/// Whether a start tag carries `name=`, as a whole attribute name.
fn has_attribute(tag: &str, name: &str) -> bool {
    let needle = format!("{name}=");
    tag.match_indices(needle.as_str()).any(|(pos, _)| {
        tag[..pos]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::check;
    use quire_core::Sequencer;

    fn unit(text: &str) -> ContentUnit {
        ContentUnit::new("OEBPS/text/9-chapter-i.xhtml", text, &Sequencer::default())
    }

    const LEGACY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="en">
<head>
  <meta charset="utf-8" />
  <title>Chapter I</title>
</head>
<body><div class="chapter-number-container"></div><div class="chapter-title-container"></div></body>
</html>"#;

    #[test]
    fn legacy_chapter_is_brought_to_template() {
        let catalog = RuleCatalog::canonical().unwrap();
        let original = unit(LEGACY);
        let fixed = remediate(&original, &catalog, &Remediation::default());

        assert!(fixed.is_changed());
        assert_eq!(
            fixed.applied,
            vec![
                "Fixed DOCTYPE",
                "Standardized charset to UTF-8",
                "Added xmlns attribute",
                "Added lang attribute",
                "Added viewport meta",
                "Added typeface link",
            ]
        );
        let text = fixed.unit.text();
        assert!(text.contains("<!DOCTYPE html>\n<html"));
        assert!(text.contains(
            r#"<html xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="en" xmlns="http://www.w3.org/1999/xhtml" lang="en">"#
        ));
        assert_eq!(original.text(), LEGACY);

        let after = check(&fixed.unit, &catalog);
        let fatal: Vec<_> = after
            .issues()
            .iter()
            .filter(|i| i.severity() == crate::Severity::Fatal)
            .collect();
        assert!(fatal.is_empty(), "{fatal:?}");
    }

    #[test]
    fn remediation_is_idempotent() {
        let catalog = RuleCatalog::canonical().unwrap();
        let settings = Remediation::default();
        let once = remediate(&unit(LEGACY), &catalog, &settings);
        let twice = remediate(&once.unit, &catalog, &settings);
        assert!(!twice.is_changed());
        assert_eq!(twice.unit, once.unit);
    }

    #[test]
    fn missing_doctype_is_inserted_after_xml_declaration() {
        let mut text = r#"<?xml version="1.0"?><html>"#.to_string();
        fix_doctype(&mut text, "<!DOCTYPE html>");
        assert_eq!(text, "<?xml version=\"1.0\"?>\n<!DOCTYPE html><html>");

        let mut bare = "<html>".to_string();
        fix_doctype(&mut bare, "<!DOCTYPE html>");
        assert_eq!(bare, "<!DOCTYPE html>\n<html>");
    }

    #[test]
    fn attribute_detection_respects_names() {
        assert!(has_attribute(r#"<html xml:lang="en">"#, "xml:lang"));
        assert!(!has_attribute(r#"<html xml:lang="en">"#, "lang"));
        assert!(has_attribute("<html\n lang=\"en\">", "lang"));
    }

    #[test]
    fn open_tag_skips_longer_names() {
        let text = "<htmlish><html lang=\"en\">";
        assert_eq!(find_open_tag(text, "html"), Some((9, text.len())));
        assert_eq!(find_open_tag("<head>", "html"), None);
    }

    #[test]
    fn no_head_means_no_snippets() {
        let catalog = RuleCatalog::canonical().unwrap();
        let fixed = remediate(
            &unit(r#"<!DOCTYPE html><html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en"><body/></html>"#),
            &catalog,
            &Remediation::default(),
        );
        assert!(!fixed.is_changed());
    }
}
