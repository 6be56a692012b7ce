//! Exam fee extraction (`수수료`).
//!
//! Fee tables come in two layouts: phases across the header
//! (`구분 | 필기 | 실기`) or phases down the first column
//! (`필기 | 19,400원`). When no table yields an amount, the paragraph block
//! that starts with a fee heading is returned as text.

use std::sync::LazyLock;

use certnorm_grid::Table;
use certnorm_shared::{Fees, Phase, Tokens, strip_ws};
use regex::Regex;
use tracing::{debug, instrument};

use crate::builder::header_layout;

/// `19,400원`, `19400 원`
static WON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9,]*)\s*원").expect("valid regex"));
/// `2만원`, `2만 원`
static MAN_WON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*만\s*원?").expect("valid regex"));
/// A grouped number standing alone in a cell of a fee table.
static BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,3}(?:,[0-9]{3})+$").expect("valid regex"));
/// Headings that end a fee paragraph block.
static NEXT_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:합격기준|시험과목|시험 방법|시험방법|응시자격|출제경향|공개문제)")
        .expect("valid regex")
});

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Written,
    Practical,
}

/// Phases are folded into the two fee columns: interviews are billed with
/// the practical exam.
fn slot_of(text: &str, tokens: &Tokens) -> Option<Slot> {
    let compact = strip_ws(text);
    if tokens.row_phase_matcher(Phase::Written).is_match(&compact) {
        Some(Slot::Written)
    } else if tokens.row_phase_matcher(Phase::Practical).is_match(&compact)
        || tokens.row_phase_matcher(Phase::Interview).is_match(&compact)
    {
        Some(Slot::Practical)
    } else {
        None
    }
}

/// `1234567` → `1,234,567`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Normalize an amount to `N,NNN원`. A bare grouped number is accepted only
/// when `bare_ok` (the table itself is about fees).
pub fn parse_amount(text: &str, bare_ok: bool) -> Option<String> {
    let text = text.trim();
    let won = WON
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<u64>().ok());
    let man = || {
        MAN_WON
            .captures(text)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .and_then(|n| n.checked_mul(10_000))
    };
    let bare = || {
        (bare_ok && BARE.is_match(text))
            .then(|| text.replace(',', "").parse::<u64>().ok())
            .flatten()
    };
    won.or_else(man)
        .or_else(bare)
        .map(|n| format!("{}원", group_thousands(n)))
}

#[derive(Default)]
struct Found {
    written: Option<String>,
    practical: Option<String>,
}

impl Found {
    fn slot_mut(&mut self, slot: Slot) -> &mut Option<String> {
        match slot {
            Slot::Written => &mut self.written,
            Slot::Practical => &mut self.practical,
        }
    }

    fn is_empty(&self) -> bool {
        self.written.is_none() && self.practical.is_none()
    }
}

fn read_table(table: &Table, tokens: &Tokens, found: &mut Found) {
    let grid = table.grid();
    let Some(layout) = header_layout(&grid) else {
        return;
    };
    let rows: Vec<Vec<String>> = (0..grid.height()).map(|r| grid.row_texts(r)).collect();
    let about_fees = rows
        .iter()
        .any(|row| row.iter().any(|c| tokens.fee.is_match(&strip_ws(c))));

    let columns: Vec<Option<Slot>> = layout.headers.iter().map(|h| slot_of(h, tokens)).collect();
    let across = columns.contains(&Some(Slot::Written)) && columns.contains(&Some(Slot::Practical));
    let schedule_header = tokens
        .schedule_keywords
        .is_match(&strip_ws(&layout.headers.concat()));
    if !about_fees && (!across || schedule_header) {
        return;
    }

    if across {
        for (c, slot) in columns.iter().enumerate() {
            let Some(slot) = *slot else {
                continue;
            };
            let target = found.slot_mut(slot);
            if target.is_some() {
                continue;
            }
            *target = rows[layout.body_start..]
                .iter()
                .find_map(|row| row.get(c).and_then(|cell| parse_amount(cell, about_fees)));
        }
    } else {
        for row in &rows {
            let Some(slot) = row.first().and_then(|first| slot_of(first, tokens)) else {
                continue;
            };
            if let Some(amount) = row[1..].iter().find_map(|cell| parse_amount(cell, true)) {
                *found.slot_mut(slot) = Some(amount);
            }
        }
    }
}

/// Fee paragraphs: from the first line naming `응시수수료` (or starting with
/// `수수료`) up to the next section heading.
fn fee_paragraph(paragraphs: &[String]) -> Option<String> {
    let mut block = Vec::new();
    for para in paragraphs {
        let para = para.split_whitespace().collect::<Vec<_>>().join(" ");
        if block.is_empty() {
            let starts = para.contains("응시수수료")
                || para.starts_with("응시 수수료")
                || para.starts_with("수수료");
            if !starts {
                continue;
            }
        } else if NEXT_SECTION.is_match(&para) {
            break;
        }
        if !para.is_empty() {
            block.push(para);
        }
    }
    (!block.is_empty()).then(|| block.join(" "))
}

/// Fees from the first tables that state them, else from the paragraphs.
#[instrument(skip_all, fields(tables = tables.len(), paragraphs = paragraphs.len()))]
pub fn extract_fees(tables: &[Table], paragraphs: &[String], tokens: &Tokens) -> Option<Fees> {
    let mut found = Found::default();
    for table in tables {
        read_table(table, tokens, &mut found);
        if !found.is_empty() {
            debug!(written = ?found.written, practical = ?found.practical, "fees from table");
            return Some(Fees::ByPhase {
                written: found.written,
                practical: found.practical,
            });
        }
    }
    fee_paragraph(paragraphs).map(Fees::Text)
}
