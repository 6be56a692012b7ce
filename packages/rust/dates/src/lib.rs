//! Korean date and time normalization.
//!
//! Schedule cells write dates in many shapes: `2025.03.10`, `'24.11.05`,
//! `02.27(목)`, `3월 10일`, `3/10`, and ranges of any of these joined by `~`
//! or a hyphen. Everything here is total: text that cannot be resolved yields
//! `None`, never an error. Calendar validity is checked with `chrono`.

pub mod scan;
pub mod span;
pub mod time;

pub use scan::{
    date_ranges, date_tokens, first_date_span, has_date_token, is_lone_date, strip_ranges,
};
pub use span::{absolute_dates, has_absolute_date, span_from_text, year_hint};
pub use time::{duration_minutes, minutes_ko, split_time_range};

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// `2025.03.10`, `2025-3-10`, `2025/03/10`, `2025년 3월 10일`
static YEAR4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[.\-/년]\s*(\d{1,2})\s*[.\-/월]\s*(\d{1,2})").expect("valid regex")
});

/// `'24.11.05`, `24.11.05` at the start of a token.
static YEAR2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[`'’‵′]?(\d{2})\.(\d{1,2})\.(\d{1,2})").expect("valid regex")
});

/// `02.27`, `2.27(목)`, `3월 10일`, `3/10`
static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*[./월]\s*(\d{1,2})").expect("valid regex"));

/// A bare day on the right side of a range: `01.13 ~ 16(목)`.
static DAY_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\s*일?\s*(?:\([^)]*\))?\s*(?:$|\s|\d{1,2}:\d{2})").expect("valid regex")
});

static TILDE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[~∼～]+").expect("valid regex"));

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{1,2}-\d{1,2}").expect("valid regex"));

/// Spaced hyphen or any en-dash. Used when ISO dates forbid a bare split on `-`.
static SPACED_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s[-–]\s|–").expect("valid regex"));

static DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-–]+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Single tokens
// ---------------------------------------------------------------------------

/// A date token before year resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Partial {
    year: Option<i32>,
    month: Option<u32>,
    day: u32,
}

impl Partial {
    fn resolve(self, year: i32, month: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year.unwrap_or(year), self.month.unwrap_or(month), self.day)
    }
}

fn num<T: std::str::FromStr>(caps: &regex::Captures, i: usize) -> Option<T> {
    caps.get(i)?.as_str().parse().ok()
}

fn parse_partial(token: &str) -> Option<Partial> {
    let s = token.trim();
    if let Some(c) = YEAR4.captures(s) {
        return Some(Partial {
            year: num(&c, 1),
            month: num(&c, 2),
            day: num(&c, 3)?,
        });
    }
    if let Some(c) = YEAR2.captures(s) {
        return Some(Partial {
            year: num::<i32>(&c, 1).map(|yy| 2000 + yy),
            month: num(&c, 2),
            day: num(&c, 3)?,
        });
    }
    if let Some(c) = MONTH_DAY.captures(s) {
        return Some(Partial {
            year: None,
            month: num(&c, 1),
            day: num(&c, 2)?,
        });
    }
    None
}

/// Parse one date token. Month/day tokens need `base_year`.
pub fn parse_one_date(token: &str, base_year: Option<i32>) -> Option<NaiveDate> {
    let p = parse_partial(token)?;
    let year = p.year.or(base_year)?;
    NaiveDate::from_ymd_opt(year, p.month?, p.day)
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

fn split_range(text: &str) -> Vec<&str> {
    if TILDE.is_match(text) {
        TILDE.split(text).collect()
    } else if ISO_DATE.is_match(text) {
        SPACED_DASH.split(text).collect()
    } else {
        DASH.split(text).collect()
    }
}

/// Parse `left ~ right` into a start/end pair.
///
/// Year inference when sides disagree about explicitness:
/// - left explicit, right not: right takes left's year, `+1` if its month is smaller
/// - right explicit, left not: left takes right's year, `-1` if its month is larger
/// - neither: both take `base_year`, right `+1` if its month is smaller
///
/// A lone token yields `(d, d)`; `X ~` yields `(d, None)`.
pub fn parse_range(text: &str, base_year: Option<i32>) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let parts = split_range(text);
    let left_raw = parts.first().copied().unwrap_or_default();
    if parts.len() < 2 {
        let d = parse_one_date(left_raw, base_year);
        return (d, d);
    }
    let right_raw = parts[1];

    let Some(left) = parse_partial(left_raw) else {
        return (None, parse_one_date(right_raw, base_year));
    };
    let right = parse_partial(right_raw).or_else(|| {
        DAY_ONLY.captures(right_raw.trim()).and_then(|c| {
            Some(Partial {
                year: None,
                month: None,
                day: num(&c, 1)?,
            })
        })
    });

    let Some(left_month) = left.month else {
        return (None, None);
    };
    let Some(right) = right else {
        return (left.year.or(base_year).and_then(|y| left.resolve(y, left_month)), None);
    };
    let right_month = right.month.unwrap_or(left_month);

    let rolls = i32::from(right_month < left_month);
    let years = match (left.year, right.year) {
        (Some(ly), Some(ry)) => Some((ly, ry)),
        (Some(ly), None) => ly.checked_add(rolls).map(|ry| (ly, ry)),
        (None, Some(ry)) => ry.checked_sub(rolls).map(|ly| (ly, ry)),
        (None, None) => base_year.and_then(|by| by.checked_add(rolls).map(|ry| (by, ry))),
    };
    let Some((left_year, right_year)) = years else {
        return (None, None);
    };

    (
        left.resolve(left_year, left_month),
        right.resolve(right_year, right_month),
    )
}

/// Format a date as `MM.DD`, the shape most schedule tables use.
pub fn month_day(date: NaiveDate) -> String {
    format!("{:02}.{:02}", date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn one_date_shapes() {
        assert_eq!(parse_one_date("02.27(목)", Some(2025)), d(2025, 2, 27));
        assert_eq!(parse_one_date("'24.11.05.(화)", Some(2025)), d(2024, 11, 5));
        assert_eq!(parse_one_date("’24.11.05", None), d(2024, 11, 5));
        assert_eq!(parse_one_date("2025.03.10", None), d(2025, 3, 10));
        assert_eq!(parse_one_date("2025년 3월 10일", None), d(2025, 3, 10));
        assert_eq!(parse_one_date("3월 10일", Some(2025)), d(2025, 3, 10));
        assert_eq!(parse_one_date("3/10", Some(2025)), d(2025, 3, 10));
    }

    #[test]
    fn month_day_needs_a_year() {
        assert_eq!(parse_one_date("02.27", None), None);
    }

    #[test]
    fn invalid_calendar_dates_are_none() {
        assert_eq!(parse_one_date("02.30", Some(2025)), None);
        assert_eq!(parse_one_date("2025.13.01", None), None);
        assert_eq!(parse_one_date("발표 예정", Some(2025)), None);
    }

    #[test]
    fn simple_range() {
        assert_eq!(parse_range("01.20 ~ 02.07", Some(2025)), (d(2025, 1, 20), d(2025, 2, 7)));
    }

    #[test]
    fn range_rolls_into_next_year() {
        assert_eq!(parse_range("12.30 ~ 01.03", Some(2024)), (d(2024, 12, 30), d(2025, 1, 3)));
    }

    #[test]
    fn extreme_base_year_gives_nothing() {
        assert_eq!(parse_range("12.30 ~ 01.03", Some(i32::MAX)), (None, None));
        assert_eq!(parse_range("01.02 ~ 01.03", Some(i32::MAX)), (None, None));
        assert_eq!(parse_range("12.30 ~ 01.03", Some(i32::MIN)), (None, None));
    }

    #[test]
    fn explicit_right_year_pulls_left_back() {
        assert_eq!(
            parse_range("12.23 ~ '25.01.01", Some(2030)),
            (d(2024, 12, 23), d(2025, 1, 1))
        );
    }

    #[test]
    fn explicit_left_year_carries_right() {
        assert_eq!(
            parse_range("'24.12.23 ~ 01.02", Some(2030)),
            (d(2024, 12, 23), d(2025, 1, 2))
        );
        assert_eq!(
            parse_range("2025.03.10 ~ 03.14", None),
            (d(2025, 3, 10), d(2025, 3, 14))
        );
    }

    #[test]
    fn both_explicit() {
        assert_eq!(
            parse_range("`24.12.23 ~ `25.01.01", None),
            (d(2024, 12, 23), d(2025, 1, 1))
        );
    }

    #[test]
    fn alternative_separators() {
        assert_eq!(parse_range("01.20∼01.24", Some(2025)), (d(2025, 1, 20), d(2025, 1, 24)));
        assert_eq!(parse_range("01.20～01.24", Some(2025)), (d(2025, 1, 20), d(2025, 1, 24)));
        assert_eq!(parse_range("01.20-01.24", Some(2025)), (d(2025, 1, 20), d(2025, 1, 24)));
        assert_eq!(parse_range("3/10~3/14", Some(2025)), (d(2025, 3, 10), d(2025, 3, 14)));
    }

    #[test]
    fn iso_hyphens_are_not_separators() {
        assert_eq!(
            parse_range("2025-03-10 - 2025-03-14", None),
            (d(2025, 3, 10), d(2025, 3, 14))
        );
        assert_eq!(parse_range("2025-03-10", None), (d(2025, 3, 10), d(2025, 3, 10)));
    }

    #[test]
    fn single_token_is_degenerate_range() {
        assert_eq!(parse_range("02.27(목)", Some(2025)), (d(2025, 2, 27), d(2025, 2, 27)));
    }

    #[test]
    fn open_ended_range() {
        assert_eq!(parse_range("03.10 ~", Some(2025)), (d(2025, 3, 10), None));
    }

    #[test]
    fn right_side_may_be_a_bare_day() {
        assert_eq!(parse_range("01.13 ~ 16(목)", Some(2025)), (d(2025, 1, 13), d(2025, 1, 16)));
    }

    #[test]
    fn unparseable_gives_nothing() {
        assert_eq!(parse_range("추후 공지", Some(2025)), (None, None));
        assert_eq!(parse_range("", Some(2025)), (None, None));
        assert_eq!(parse_range("01.20 ~ 02.07", None), (None, None));
    }

    proptest! {
        #[test]
        fn month_day_roundtrips_with_base_year(days in 0u32..365) {
            let date = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
                + chrono::Days::new(u64::from(days));
            prop_assert_eq!(parse_one_date(&month_day(date), Some(2025)), Some(date));
        }

        #[test]
        fn december_to_january_rolls_over(dd in 1u32..=31, jd in 1u32..=31, year in 2000i32..2100) {
            let text = format!("12.{dd:02} ~ 01.{jd:02}");
            let (start, end) = parse_range(&text, Some(year));
            prop_assert_eq!(start.map(|s| s.year()), Some(year));
            prop_assert_eq!(end.map(|e| e.year()), Some(year + 1));
        }
    }
}
