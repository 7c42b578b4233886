//! Small text helpers shared by the keyword matchers

use unicode_segmentation::UnicodeSegmentation;

const TRAILING_PUNCTUATION: &[char] = &['?', '.', '!', ',', ';', ':', '\u{0964}'];

/// Lowercase, collapse whitespace and drop trailing punctuation
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim_end()
        .to_string()
}

/// Drop trailing punctuation and whitespace, keeping the original casing
pub fn trim_trailing_punctuation(text: &str) -> &str {
    text.trim_end()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim_end()
}

pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// True when `term` occurs in `haystack` on word boundaries
///
/// Both arguments are expected to be lowercase already.
pub fn mentions(haystack: &str, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// First term of `terms` mentioned in `haystack`
pub fn first_mention<'a>(haystack: &str, terms: &'a [String]) -> Option<&'a str> {
    terms
        .iter()
        .map(String::as_str)
        .find(|term| mentions(haystack, &term.to_lowercase()))
}

pub fn mentions_any(haystack: &str, terms: &[String]) -> bool {
    first_mention(haystack, terms).is_some()
}

/// True when the whole (normalized) text equals one of `phrases`
pub fn is_one_of(normalized: &str, phrases: &[String]) -> bool {
    phrases
        .iter()
        .any(|phrase| normalize(phrase) == normalized)
}
