//! # Rule Catalog
//!
//! The enumerated, versioned set of markers a chapter file must (or must
//! not) contain. A catalog exists in two forms:
//!
//! - [`CatalogDefinition`]: plain data, serde-deserializable, so a
//!   deployment can swap the whole rule set from a config file.
//! - [`RuleCatalog`]: the compiled form the checker runs against. Patterns
//!   are compiled once and cross-references are resolved to indices.
//!
//! ## Standalone vs. Grouped Requirements
//!
//! A requirement referenced by a compound [`GroupDef`] is evaluated *only*
//! as part of that group. The group reports one combined issue when fewer
//! than `min_present` members are satisfied. Every other requirement is
//! standalone and reports its own `Missing: <name>` issue.
//!
//! The canonical catalog has two groups: `typefaces` (both linked families
//! required) and `structure` (any two of the three chapter class markers).

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Group name for the externally linked typeface families.
pub const TYPEFACE_GROUP: &str = "typefaces";

/// Group name for the chapter-structure class markers.
pub const STRUCTURE_GROUP: &str = "structure";

/// Template variables that must never survive into a finished chapter.
pub const PLACEHOLDER_TOKENS: [&str; 17] = [
    "{{BOOK_TITLE}}",
    "{{CHAPTER_TITLE}}",
    "{{NAV_TITLE}}",
    "{{CHAPTER_ROMAN_NUMERAL}}",
    "{{CHAPTER_TITLE_LINES}}",
    "{{BIBLE_QUOTE_TEXT}}",
    "{{BIBLE_QUOTE_REFERENCE}}",
    "{{INTRODUCTION_LABEL}}",
    "{{INTRODUCTION_TEXT}}",
    "{{CONTENT_HEADER}}",
    "{{MAIN_CONTENT}}",
    "{{QUIZ_HEADER}}",
    "{{WORKSHEET_HEADER}}",
    "{{TOP_FLOURISH}}",
    "{{BOTTOM_FLOURISH}}",
    "{{CLOSING_IMAGE}}",
    "{{CLOSING_QUOTE}}",
];

/// Chapters shorter than this many characters are flagged as possibly truncated.
pub const MIN_CONTENT_CHARS: usize = 3000;

/// Version tag of the built-in catalog.
pub const CANONICAL_CATALOG_VERSION: &str = "chapter-template/1";

// ---------------------------------------------------------------------------
// Definitions (data)
// ---------------------------------------------------------------------------

/// Whether a requirement's marker must be present or must be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Present,
    Absent,
}

/// How a requirement matches content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MatcherDef {
    /// Literal substring.
    Literal(String),
    /// Regular expression (`regex` crate syntax).
    Pattern(String),
}

/// One named requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDef {
    pub name: String,
    pub matcher: MatcherDef,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub ignore_case: bool,
}

impl RequirementDef {
    /// Required-present substring match.
    pub fn literal(name: &str, value: &str, ignore_case: bool) -> Self {
        Self {
            name: name.to_string(),
            matcher: MatcherDef::Literal(value.to_string()),
            polarity: Polarity::Present,
            ignore_case,
        }
    }

    /// Required-present case-insensitive regex match.
    pub fn pattern(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            matcher: MatcherDef::Pattern(value.to_string()),
            polarity: Polarity::Present,
            ignore_case: true,
        }
    }
}

/// A compound check over several requirements with partial credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDef {
    pub name: String,
    pub members: Vec<String>,
    /// Minimum number of satisfied members for the group to pass.
    pub min_present: usize,
    /// Issue text recorded when the group fails.
    pub issue: String,
}

/// Serializable rule catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDefinition {
    pub version: String,
    pub requirements: Vec<RequirementDef>,
    pub groups: Vec<GroupDef>,
    pub placeholders: Vec<String>,
    pub min_content_chars: usize,
}

impl Default for CatalogDefinition {
    /// The canonical chapter-template catalog.
    fn default() -> Self {
        let requirements = vec![
            RequirementDef::literal("doctype", "<!DOCTYPE html>", true),
            RequirementDef::literal("html_namespace", r#"xmlns="http://www.w3.org/1999/xhtml""#, false),
            RequirementDef::literal("xml_lang", r#"xml:lang="en""#, false),
            // Plain `lang`, not the tail of `xml:lang`.
            RequirementDef::pattern("lang_attr", r#"(?:^|[^:\w])lang="en""#),
            RequirementDef::literal("utf8_charset", r#"<meta charset="UTF-8""#, true),
            RequirementDef::literal("viewport_meta", r#"name="viewport""#, false),
            RequirementDef::pattern(
                "cinzel_font",
                r#"fonts\.googleapis\.com/css2\?[^"'>]*family=Cinzel\+Decorative"#,
            ),
            RequirementDef::pattern(
                "baskerville_font",
                r#"fonts\.googleapis\.com/css2\?[^"'>]*family=Libre\+Baskerville"#,
            ),
            RequirementDef::literal("chapter_structure", r#"class="chapter-number-container""#, false),
            RequirementDef::literal("title_container", r#"class="chapter-title-container""#, false),
            RequirementDef::literal("title_word", "chapter-title-word", false),
        ];
        let groups = vec![
            GroupDef {
                name: TYPEFACE_GROUP.to_string(),
                members: vec!["cinzel_font".to_string(), "baskerville_font".to_string()],
                min_present: 2,
                issue: "Missing proper typeface links".to_string(),
            },
            GroupDef {
                name: STRUCTURE_GROUP.to_string(),
                members: vec![
                    "chapter_structure".to_string(),
                    "title_container".to_string(),
                    "title_word".to_string(),
                ],
                min_present: 2,
                issue: "Missing proper chapter structure".to_string(),
            },
        ];
        Self {
            version: CANONICAL_CATALOG_VERSION.to_string(),
            requirements,
            groups,
            placeholders: PLACEHOLDER_TOKENS.iter().map(|t| t.to_string()).collect(),
            min_content_chars: MIN_CONTENT_CHARS,
        }
    }
}

// ---------------------------------------------------------------------------
// Compiled catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Pattern(Regex),
}

/// A compiled requirement.
#[derive(Debug, Clone)]
pub struct Requirement {
    name: String,
    matcher: Matcher,
    polarity: Polarity,
}

impl Requirement {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Whether the marker occurs in `text`, regardless of polarity.
    pub fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(needle) => text.contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }

    /// Whether `text` satisfies the requirement under its polarity.
    pub fn is_satisfied(&self, text: &str) -> bool {
        self.matches(text) == (self.polarity == Polarity::Present)
    }

    fn compile(def: &RequirementDef) -> CatalogResult<Self> {
        let invalid = |source| CatalogError::InvalidPattern {
            name: def.name.clone(),
            source,
        };
        let matcher = match (&def.matcher, def.ignore_case) {
            (MatcherDef::Literal(lit), false) => Matcher::Literal(lit.clone()),
            (MatcherDef::Literal(lit), true) => Matcher::Pattern(
                RegexBuilder::new(&regex::escape(lit))
                    .case_insensitive(true)
                    .build()
                    .map_err(invalid)?,
            ),
            (MatcherDef::Pattern(pat), ignore_case) => Matcher::Pattern(
                RegexBuilder::new(pat)
                    .case_insensitive(ignore_case)
                    .build()
                    .map_err(invalid)?,
            ),
        };
        Ok(Self {
            name: def.name.clone(),
            matcher,
            polarity: def.polarity,
        })
    }
}

/// A compiled compound group.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    members: Vec<usize>,
    min_present: usize,
    issue: String,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_present(&self) -> usize {
        self.min_present
    }

    pub fn issue(&self) -> &str {
        &self.issue
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Compiled, immutable rule catalog.
///
/// Passed explicitly to the checker; there is no process-global catalog.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    version: String,
    requirements: Vec<Requirement>,
    standalone: Vec<usize>,
    groups: Vec<Group>,
    placeholders: Vec<String>,
    min_content_chars: usize,
}

impl RuleCatalog {
    /// Compile a definition, validating patterns and cross-references.
    pub fn compile(def: &CatalogDefinition) -> CatalogResult<Self> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut requirements = Vec::with_capacity(def.requirements.len());
        for (i, req) in def.requirements.iter().enumerate() {
            if index.insert(req.name.as_str(), i).is_some() {
                return Err(CatalogError::DuplicateRequirement {
                    name: req.name.clone(),
                });
            }
            requirements.push(Requirement::compile(req)?);
        }

        let mut grouped = vec![false; requirements.len()];
        let mut groups = Vec::with_capacity(def.groups.len());
        for g in &def.groups {
            let mut members = Vec::with_capacity(g.members.len());
            for m in &g.members {
                let idx = *index
                    .get(m.as_str())
                    .ok_or_else(|| CatalogError::UnknownRequirement {
                        group: g.name.clone(),
                        name: m.clone(),
                    })?;
                grouped[idx] = true;
                members.push(idx);
            }
            if g.min_present > members.len() {
                return Err(CatalogError::UnsatisfiableGroup {
                    group: g.name.clone(),
                    min_present: g.min_present,
                    members: members.len(),
                });
            }
            groups.push(Group {
                name: g.name.clone(),
                members,
                min_present: g.min_present,
                issue: g.issue.clone(),
            });
        }

        let standalone = (0..requirements.len()).filter(|i| !grouped[*i]).collect();

        // An empty token would match every unit.
        let placeholders: Vec<String> = def
            .placeholders
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();
        if placeholders.len() != def.placeholders.len() {
            tracing::warn!("ignoring empty placeholder tokens in catalog definition");
        }

        tracing::debug!(
            version = %def.version,
            requirements = requirements.len(),
            groups = groups.len(),
            placeholders = placeholders.len(),
            "compiled rule catalog"
        );

        Ok(Self {
            version: def.version.clone(),
            requirements,
            standalone,
            groups,
            placeholders,
            min_content_chars: def.min_content_chars,
        })
    }

    /// Compile the built-in chapter-template catalog.
    pub fn canonical() -> CatalogResult<Self> {
        Self::compile(&CatalogDefinition::default())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up any requirement, standalone or grouped, by name.
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    /// Requirements evaluated individually, in definition order.
    pub fn standalone(&self) -> impl Iterator<Item = &Requirement> {
        self.standalone.iter().map(|i| &self.requirements[*i])
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Members of a group, in group definition order.
    pub fn members<'a>(&'a self, group: &'a Group) -> impl Iterator<Item = &'a Requirement> {
        group.members.iter().map(|i| &self.requirements[*i])
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn min_content_chars(&self) -> usize {
        self.min_content_chars
    }
}
