//! Coalescing free-form cell text into a [`DateSpan`].

use std::sync::LazyLock;

use certnorm_shared::DateSpan;
use chrono::NaiveDate;
use regex::Regex;

use crate::parse_range;

/// Dates that carry their own year, anywhere in the text.
static ABSOLUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(\d{4})\s*[.\-/년]\s*(\d{1,2})\s*[.\-/월]\s*(\d{1,2}))|(?:[`'’‵′](\d{2})\.(\d{1,2})\.(\d{1,2}))",
    )
    .expect("valid regex")
});

static YEAR_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})\s*년").expect("valid regex"));

/// Every date in `text` that states its year, in reading order.
pub fn absolute_dates(text: &str) -> Vec<NaiveDate> {
    ABSOLUTE
        .captures_iter(text)
        .filter_map(|c| {
            let field = |i: usize| c.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
            let (year, month, day) = if c.get(1).is_some() {
                (field(1)? as i32, field(2)?, field(3)?)
            } else {
                (2000 + field(4)? as i32, field(5)?, field(6)?)
            };
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .collect()
}

pub fn has_absolute_date(text: &str) -> bool {
    !absolute_dates(text).is_empty()
}

/// `2025년` anywhere in the text.
pub fn year_hint(text: &str) -> Option<i32> {
    YEAR_HINT.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Resolve a cell's text to a span.
///
/// Dates with explicit years win: two or more give a range over the earliest
/// and latest, a single one gives whatever the range parser makes of the text
/// if that agrees, else a single day (open-ended when the text ends in a tilde).
/// Without explicit years the text goes through [`parse_range`].
pub fn span_from_text(text: &str, base_year: Option<i32>) -> Option<DateSpan> {
    let absolute = absolute_dates(text);
    match absolute.as_slice() {
        [] => {
            let (start, end) = parse_range(text, base_year);
            DateSpan::from_bounds(start, end)
        }
        [only] => {
            let (start, end) = parse_range(text, base_year);
            if start == Some(*only) && end.is_some() {
                return DateSpan::from_bounds(start, end);
            }
            if end == Some(*only) && start.is_some() {
                return DateSpan::from_bounds(start, end);
            }
            if text.trim_end().ends_with(['~', '∼', '～']) {
                Some(DateSpan::OpenEnded(*only))
            } else {
                Some(DateSpan::Single(*only))
            }
        }
        many => {
            let first = many.iter().min().copied()?;
            let last = many.iter().max().copied()?;
            DateSpan::from_bounds(Some(first), Some(last))
        }
    }
}
