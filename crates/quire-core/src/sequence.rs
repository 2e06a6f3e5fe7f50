//! # Sequencer
//!
//! Derives a total order over named content units from an embedded
//! `<prefix>-<roman-numeral>` token.
//!
//! ## Ordering Rules
//!
//! 1. Primary key: the decoded numeral (`chapter-iv` → 4).
//! 2. Names with no recognizable token, or with a numeral outside `I..=XVI`,
//!    get key `0` and sort ahead of every sequenced name. This is lenient on
//!    purpose: a malformed token never aborts a run.
//! 3. Ties (all key-0 names, or duplicated numerals) fall back to the name
//!    itself, so the result never depends on directory-listing order.

use crate::roman::decode_roman;

/// Prefix used by the document class for chapter files.
pub const DEFAULT_SEQUENCE_PREFIX: &str = "chapter";

/// Characters that may appear in a Roman-numeral run.
const NUMERAL_CHARS: &[u8] = b"ivxlcdm";

/// Orders content units by the Roman-numeral token in their names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequencer {
    needle: String,
}

impl Sequencer {
    /// Create a sequencer matching `<prefix>-<numeral>` tokens.
    pub fn new(prefix: &str) -> Self {
        Self {
            needle: format!("{}-", prefix.to_ascii_lowercase()),
        }
    }

    /// The configured prefix, without the trailing separator.
    pub fn prefix(&self) -> &str {
        self.needle.trim_end_matches('-')
    }

    /// Sequence key for a name; `0` means unsequenced.
    ///
    /// The first `<prefix>-` occurrence followed by a numeral run that ends
    /// at a non-alphanumeric boundary decides the key. A run that does not
    /// decode (e.g. `xvii`) yields `0` rather than searching further.
    pub fn key(&self, name: &str) -> u32 {
        let lower = name.to_ascii_lowercase();
        for (start, _) in lower.match_indices(self.needle.as_str()) {
            let rest = &lower[start + self.needle.len()..];
            let run = rest
                .bytes()
                .take_while(|b| NUMERAL_CHARS.contains(b))
                .count();
            if run == 0 {
                continue;
            }
            if rest
                .as_bytes()
                .get(run)
                .is_some_and(|b| b.is_ascii_alphanumeric())
            {
                continue;
            }
            return decode_roman(&rest[..run]).unwrap_or(0);
        }
        0
    }

    /// Sort items in place by `(key, name)`.
    pub fn sort_by_name<T, F>(&self, items: &mut [T], name_of: F)
    where
        F: Fn(&T) -> &str,
    {
        items.sort_by_cached_key(|item| {
            let name = name_of(item);
            (self.key(name), name.to_string())
        });
    }

    /// Return the names in sequence order.
    pub fn order<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut ordered: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        self.sort_by_name(&mut ordered, |n| n.as_str());
        ordered
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_PREFIX)
    }
}
