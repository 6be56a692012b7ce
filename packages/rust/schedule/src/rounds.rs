//! Round and session labels.
//!
//! A round cell may pack several offerings into one label: `1-3회`,
//! `1,2,4회`, `Ⅰ~Ⅲ회`, `제1회 1·2차`, `2024년 정기 기능사 3회`, `상시`.
//! [`parse_label`] turns such a label into the rounds and sessions it names;
//! [`expand`] produces their Cartesian product in canonical form.

use std::sync::LazyLock;

use regex::Regex;

/// Numeric ranges wider than this are kept as their two endpoints.
pub const MAX_RANGE: u32 = 52;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    const N: &str = r"(?:[0-9]+|[一二三四五六七八九十]+|[Ⅰ-Ⅻ])";
    Regex::new(&format!(
        r"(상시)|제?\s*({N})(?:\s*[-~∼～–]\s*({N}))?\s*(회차|회|차)?"
    ))
    .expect("valid regex")
});

/// One offering of an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Round {
    Numbered(u32),
    /// Standing, continuously open offering. Sorts after every number.
    Always,
}

impl Round {
    pub fn label(self) -> String {
        match self {
            Self::Numbered(n) => format!("제{n}회"),
            Self::Always => "상시".to_string(),
        }
    }
}

/// Everything a label names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLabel {
    /// Sorted, distinct.
    pub rounds: Vec<Round>,
    /// Sorted, distinct.
    pub sessions: Vec<u32>,
}

impl ParsedLabel {
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty() && self.sessions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Round,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gap {
    Separator,
    Dash,
    Other,
}

fn classify_gap(gap: &str) -> Gap {
    let mut dash = false;
    for c in gap.chars() {
        match c {
            '-' | '~' | '∼' | '～' | '–' => dash = true,
            ',' | '·' | 'ㆍ' | '、' | '/' | '&' | '+' | '및' => {}
            c if c.is_whitespace() => {}
            _ => return Gap::Other,
        }
    }
    if dash { Gap::Dash } else { Gap::Separator }
}

/// Arabic digits, Chinese numerals up to 99, or a single Roman numeral.
fn numeral(token: &str) -> Option<u32> {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }
    let mut chars = token.chars();
    if let (Some(c @ 'Ⅰ'..='Ⅻ'), None) = (chars.next(), chars.next()) {
        return Some(c as u32 - 'Ⅰ' as u32 + 1);
    }
    let digit = |c: char| "一二三四五六七八九".chars().position(|d| d == c).map(|i| i as u32 + 1);
    match token.split_once('十') {
        None => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => digit(c),
                _ => None,
            }
        }
        Some((tens, ones)) => {
            let tens = match tens {
                "" => 1,
                t => numeral(t).filter(|n| *n < 10)?,
            };
            let ones = match ones {
                "" => 0,
                o => numeral(o).filter(|n| *n < 10)?,
            };
            Some(tens * 10 + ones)
        }
    }
}

fn push_span(out: &mut Vec<u32>, lo: u32, hi: u32) {
    let (lo, hi) = (lo.min(hi), lo.max(hi));
    if hi - lo >= MAX_RANGE {
        out.extend([lo, hi]);
    } else {
        out.extend(lo..=hi);
    }
}

/// Parse every round and session named in `label`.
///
/// Numbers without a unit take the unit of the next number in the same list
/// (`1,2,4회`). A list is broken by any text that is not a separator.
pub fn parse_label(label: &str) -> ParsedLabel {
    let mut rounds: Vec<Round> = Vec::new();
    let mut sessions: Vec<u32> = Vec::new();
    let mut pending: Vec<(u32, u32)> = Vec::new();
    let mut last_unit: Option<(u32, Unit)> = None;
    let mut prev_end = 0;

    for caps in TOKEN.captures_iter(label) {
        let Some(whole) = caps.get(0) else { continue };
        let gap = classify_gap(&label[prev_end..whole.start()]);
        prev_end = whole.end();
        if gap == Gap::Other {
            pending.clear();
            last_unit = None;
        }

        if caps.get(1).is_some() {
            rounds.push(Round::Always);
            pending.clear();
            last_unit = None;
            continue;
        }

        let Some(lo) = caps.get(2).and_then(|m| numeral(m.as_str())) else {
            pending.clear();
            continue;
        };
        let hi = caps.get(3).and_then(|m| numeral(m.as_str())).unwrap_or(lo);
        let unit = match caps.get(4).map(|m| m.as_str()) {
            Some("회" | "회차") => Unit::Round,
            Some(_) => Unit::Session,
            None => {
                pending.push((lo, hi));
                continue;
            }
        };

        let mut spans = std::mem::take(&mut pending);
        match last_unit {
            // `1회 ~ 3회`
            Some((prev, prev_unit)) if gap == Gap::Dash && prev_unit == unit && spans.is_empty() => {
                spans.push((prev, hi));
            }
            _ => spans.push((lo, hi)),
        }
        let mut numbers = Vec::new();
        for (a, b) in spans {
            push_span(&mut numbers, a, b);
        }
        match unit {
            Unit::Round => rounds.extend(numbers.into_iter().map(Round::Numbered)),
            Unit::Session => sessions.extend(numbers),
        }
        last_unit = Some((hi, unit));
    }

    rounds.sort();
    rounds.dedup();
    sessions.sort_unstable();
    sessions.dedup();
    ParsedLabel { rounds, sessions }
}

/// Whether the label names at least one round (sessions alone do not count).
pub fn has_round(label: &str) -> bool {
    !parse_label(label).rounds.is_empty()
}

/// First canonical round in `label`, if any.
pub fn canonical_round(label: &str) -> Option<String> {
    parse_label(label).rounds.first().map(|r| r.label())
}

/// Cartesian product of rounds × sessions as `(회차, 차수)` pairs.
///
/// An empty side contributes a single `None`, so a label with neither yields
/// one `(None, None)` pair. Sessions are dropped when `keep_sessions` is false.
pub fn expand(label: Option<&str>, keep_sessions: bool) -> Vec<(Option<String>, Option<String>)> {
    let parsed = label.map(parse_label).unwrap_or_default();
    let rounds: Vec<Option<String>> = if parsed.rounds.is_empty() {
        vec![None]
    } else {
        parsed.rounds.iter().map(|r| Some(r.label())).collect()
    };
    let sessions: Vec<Option<String>> = if parsed.sessions.is_empty() || !keep_sessions {
        vec![None]
    } else {
        parsed.sessions.iter().map(|s| Some(format!("{s}차"))).collect()
    };

    rounds
        .iter()
        .flat_map(|r| sessions.iter().map(move |s| (r.clone(), s.clone())))
        .collect()
}
