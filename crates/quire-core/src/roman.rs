//! Roman-numeral decoding for sequence tokens.
//!
//! Only the range the document class actually uses is supported, via direct
//! lookup rather than a general parser: `I` through `XVI`. Anything else
//! (including valid numerals above 16) decodes to `None`.

/// Numerals 1 through 16, lowercase, indexed by value minus one.
pub const ROMAN_NUMERALS: [&str; 16] = [
    "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii", "xiii", "xiv", "xv",
    "xvi",
];

/// Decode a Roman numeral in the range 1..=16, case-insensitively.
pub fn decode_roman(token: &str) -> Option<u32> {
    ROMAN_NUMERALS
        .iter()
        .position(|numeral| numeral.eq_ignore_ascii_case(token))
        .map(|idx| idx as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_range() {
        for (idx, numeral) in ROMAN_NUMERALS.iter().enumerate() {
            assert_eq!(decode_roman(numeral), Some(idx as u32 + 1));
        }
    }

    #[test]
    fn decoding_ignores_case() {
        assert_eq!(decode_roman("XIV"), Some(14));
        assert_eq!(decode_roman("Vii"), Some(7));
    }

    #[test]
    fn out_of_range_and_garbage_are_none() {
        assert_eq!(decode_roman("xvii"), None);
        assert_eq!(decode_roman("iiii"), None);
        assert_eq!(decode_roman(""), None);
        assert_eq!(decode_roman("mcm"), None);
    }
}
