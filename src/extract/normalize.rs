//! Title cleaning
//!
//! Listing and detail pages decorate job titles with employer and location
//! clauses ("Urologist Job at Acme in Denver"). [`clean_title`] strips them
//! with a ranked chain of patterns, applied until none fires.

use regex::Regex;
use std::sync::LazyLock;

/// Hard cap on title length, in characters
pub const MAX_TITLE_CHARS: usize = 100;

/// Shortest candidate a pattern may produce
const MIN_CANDIDATE_CHARS: usize = 3;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Ranked title patterns; capture group 1 is the cleaned candidate
static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // "Urologist Job at Acme Health in Denver, CO"
        r"(?i)^(.+?)\s+job\s+at\s+.+$",
        // "Hospitalist Position with Acme Health"
        r"(?i)^(.+?)\s+(?:position|opening|opportunity)\s+(?:at|with)\s+.+$",
        // "Job: Hospitalist"
        r"(?i)^(?:job|position|opening)\s*:\s*(.+)$",
        // "Hospitalist - Acme Health", "Hospitalist | PracticeLink"
        r"^(.+?)\s+(?:-|\||–|—)\s+.+$",
        // "Hospitalist at Acme Health"
        r"(?i)^(.+?)\s+at\s+.+$",
        // "Hospitalist in Denver, CO"
        r"^(.+?)\s+(?i:in)\s+[A-Z][\w.'-]*(?:\s+[A-Z][\w.'-]*)*(?:,\s*[A-Z]{2})?$",
        // "Hospitalist Position"
        r"(?i)^(.+?)\s+(?:job|position)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Cleans a raw job title
///
/// Whitespace is collapsed and the title is truncated to
/// [`MAX_TITLE_CHARS`] characters. The pattern chain is then applied
/// repeatedly: on each pass the first pattern whose candidate has a plausible
/// length wins. When no pattern fires the collapsed title is returned as-is.
///
/// # Examples
///
/// ```
/// use practicelink_scraper::extract::clean_title;
///
/// assert_eq!(clean_title("Urologist Job at Acme in Denver"), "Urologist");
/// assert_eq!(clean_title("  Hospitalist  "), "Hospitalist");
/// ```
pub fn clean_title(raw: &str) -> String {
    let mut current = truncate_chars(&collapse_whitespace(raw), MAX_TITLE_CHARS);

    while let Some(candidate) = apply_first_pattern(&current) {
        current = candidate;
    }

    current
}

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Title-cases space-separated words ("family physician" -> "Family Physician")
pub fn title_case(text: &str) -> String {
    collapse_whitespace(text)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn apply_first_pattern(title: &str) -> Option<String> {
    TITLE_PATTERNS.iter().find_map(|pattern| {
        let candidate = pattern.captures(title)?.get(1)?.as_str().trim();
        let len = candidate.chars().count();
        let plausible = (MIN_CANDIDATE_CHARS..=MAX_TITLE_CHARS).contains(&len);
        (plausible && candidate != title).then(|| candidate.to_string())
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect::<String>().trim_end().to_string()
}
