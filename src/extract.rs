//! Movie-title extraction from model output
//!
//! The system prompt instructs the model to wrap every recommended title in
//! `**bold**` with the release year in parentheses. This is a lexical
//! convention, not entity recognition: unmarked titles are missed and bolded
//! non-titles are picked up. Accepted tradeoff, coupled to the prompt.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold span regex"));

static TRAILING_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(\d{4}\)\s*$").expect("trailing year regex"));

/// Extract candidate movie titles from assistant text.
///
/// Returns titles in order of first appearance, deduplicated by exact string
/// equality after trimming. A trailing ` (YYYY)` year suffix is stripped.
/// Never fails; text without the bold convention yields an empty vec.
pub fn extract_titles(text: &str) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();

    for caps in BOLD_SPAN.captures_iter(text) {
        let raw = &caps[1];
        let title = TRAILING_YEAR.replace(raw, "").trim().to_string();
        if !title.is_empty() && !titles.contains(&title) {
            titles.push(title);
        }
    }

    titles
}
