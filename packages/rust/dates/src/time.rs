//! Time-of-day ranges and durations (`09:00 ~ 10:30`, `90분`).

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

static TIME_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}).*?(\d{1,2}):(\d{2})").expect("valid regex")
});

static MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*분").expect("valid regex"));

fn hm(caps: &regex::Captures, h: usize, m: usize) -> Option<NaiveTime> {
    let hour = caps.get(h)?.as_str().parse().ok()?;
    let minute = caps.get(m)?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn pair(text: &str) -> Option<(NaiveTime, NaiveTime)> {
    let caps = TIME_PAIR.captures(text)?;
    Some((hm(&caps, 1, 2)?, hm(&caps, 3, 4)?))
}

/// First two times in `text`, zero-padded as `HH:MM`.
pub fn split_time_range(text: &str) -> (Option<String>, Option<String>) {
    match pair(text) {
        Some((start, end)) => (
            Some(start.format("%H:%M").to_string()),
            Some(end.format("%H:%M").to_string()),
        ),
        None => (None, None),
    }
}

/// An explicit `N분` in the text. Zero is treated as absent.
pub fn minutes_ko(text: &str) -> Option<u32> {
    MINUTES
        .captures(text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|m| *m > 0)
}

/// Duration of a slot: an explicit `N분` wins, otherwise `end - start`.
/// Zero or negative spans give `None`.
pub fn duration_minutes(text: &str) -> Option<u32> {
    minutes_ko(text).or_else(|| {
        let (start, end) = pair(text)?;
        let minutes = (end - start).num_minutes();
        u32::try_from(minutes).ok().filter(|m| *m > 0)
    })
}
