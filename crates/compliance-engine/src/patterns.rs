//! Regex patterns and keyword lists shared by the builder, normalizer and matcher

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of whitespace, underscores and hyphens
    static ref SEPARATOR_PATTERN: Regex = Regex::new(r"[\s_\-]+").unwrap();

    /// Alphanumeric words, unicode-aware
    static ref WORD_PATTERN: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
}

/// Words shorter than this never count as keywords
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Item texts that look like mandatory packaging wording
pub const TEXT_REQUIREMENT_KEYWORDS: &[&str] = &[
    "warning",
    "caution",
    "hazard",
    "trademark",
    "country",
    "origin",
    "made in",
    "age",
    "grade",
];

/// Spreadsheet cell values that mean "nothing here"
pub const PLACEHOLDER_VALUES: &[&str] = &["-", "--", "n/a", "na", "none", "null", "nan", "nil"];

/// Lowercase the name and join its separator-delimited tokens with single spaces.
///
/// `"Age_Grade"`, `"age-grade"` and `" age  grade "` all become `"age grade"`.
pub fn canonical_key(name: &str) -> String {
    separated_tokens(name).join(" ")
}

/// Same tokens as [`canonical_key`], joined with underscores
pub fn underscore_form(name: &str) -> String {
    separated_tokens(name).join("_")
}

fn separated_tokens(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    SEPARATOR_PATTERN
        .split(lower.trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Words of `text` that are long enough to count as keywords, in order
pub fn keywords(text: &str) -> Vec<&str> {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() >= MIN_KEYWORD_CHARS)
        .collect()
}

/// True for empty cells and the usual "no value" spellings
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || PLACEHOLDER_VALUES
            .iter()
            .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
}
