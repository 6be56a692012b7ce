//! Locating date tokens inside free text without resolving them.
//!
//! Repair passes need to see *where* dates sit in a cell (which one follows
//! `발표`, how many ranges are packed together) before any year is resolved.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse_one_date;

const DATE: &str = r"(?:\d{4}\s*[.\-/년]\s*\d{1,2}\s*[.\-/월]\s*\d{1,2}|[`'’‵′]?\d{2}\.\d{1,2}\.\d{1,2}|\d{1,2}\s*[./월]\s*\d{1,2})\s*일?\.?(?:\s*\([^)]{1,3}\))?";

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(DATE).expect("valid regex"));

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{DATE}\s*[~∼～\-–]\s*{DATE}")).expect("valid regex")
});

/// Date-looking tokens in reading order, as written.
pub fn date_tokens(text: &str) -> Vec<&str> {
    DATE_TOKEN.find_iter(text).map(|m| m.as_str().trim()).collect()
}

/// Byte range of the first date token in `text`.
pub fn first_date_span(text: &str) -> Option<std::ops::Range<usize>> {
    DATE_TOKEN.find(text).map(|m| m.range())
}

/// `A ~ B` ranges in reading order, as written.
pub fn date_ranges(text: &str) -> Vec<&str> {
    DATE_RANGE.find_iter(text).map(|m| m.as_str().trim()).collect()
}

/// Remove every range from `text`, leaving the remainder.
pub fn strip_ranges(text: &str) -> String {
    DATE_RANGE.replace_all(text, " ").into_owned()
}

/// Whether `text` holds something that is a calendar date for some year.
pub fn has_date_token(text: &str) -> bool {
    // 2000 is a leap year, so 02.29 counts.
    date_tokens(text)
        .iter()
        .any(|t| parse_one_date(t, Some(2000)).is_some())
}

/// Whether `text` is exactly one date token and nothing else.
pub fn is_lone_date(text: &str) -> bool {
    let trimmed = text.trim();
    DATE_TOKEN
        .find(trimmed)
        .is_some_and(|m| m.start() == 0 && m.end() == trimmed.len())
}
