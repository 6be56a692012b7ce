//! Schedules handed over as already-extracted dictionaries.
//!
//! Site crawlers that read a schedule page themselves produce
//! `{정기검정일정: [...], 시험시간: [...]}` with their own key names and
//! display strings. Each line is mapped onto [`ScheduleEntry`] /
//! [`TimeSlotRecord`], resolving dates from the display text when the ISO
//! fields are missing.

use std::sync::LazyLock;

use certnorm_dates::{duration_minutes, minutes_ko, span_from_text, split_time_range, year_hint};
use certnorm_shared::{DateSpan, ScheduleEntry, ScheduleOutput, TimeSlotRecord};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::rounds::canonical_round;

const ALIAS_EXAM: &[&str] = &["시험일자표시", "일시", "시험일자", "시험일"];
const ALIAS_TITLE: &[&str] = &["항목", "제목", "필기_항목", "실기_항목"];
const ALIAS_REGISTER: &[&str] = &["원서접수표시", "원서접수", "접수일자", "접수기간"];
const ALIAS_RESULT: &[&str] = &["발표표시", "발표", "발표일", "합격자 발표"];
const TIME_ROOTS: &[&str] = &["시험시간", "입실 및 시험시간", "입실및시험시간"];

/// What a titled line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Result,
    Exam,
    ExtraRegister,
    Register,
    Unknown,
}

fn infer_kind(title: &str) -> LineKind {
    let t: String = title.chars().filter(|c| !c.is_whitespace()).collect();
    if t.contains("발표") {
        LineKind::Result
    } else if t.contains("시험") {
        LineKind::Exam
    } else if t.contains("추가접수") || t.contains("추가입금") {
        LineKind::ExtraRegister
    } else if t.contains("접수") || t.contains("원서") {
        LineKind::Register
    } else {
        LineKind::Unknown
    }
}

/// Strip weekday markers and trailing clock times, unify tildes.
fn clean_line(text: &str) -> String {
    static WEEKDAY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\([월화수목금토일]\)").expect("valid regex"));
    static CLOCK_TAIL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r",\s*\d{1,2}:\d{2}").expect("valid regex"));

    let text = text.replace(['\u{a0}', '\n'], " ").replace('\u{200b}', "");
    let text = WEEKDAY.replace_all(&text, "");
    let text = CLOCK_TAIL.replace_all(&text, "");
    let text = text.replace(['∼', '–'], "~");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Non-empty scalar as text.
fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn first_of(line: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| line.get(*k).and_then(scalar))
}

fn iso(line: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    line.get(key)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

/// `시험일정 → [시험일정 →] [exam_schedule →] {...}`, or the value itself.
fn schedule_root(raw: &Value) -> Option<&Map<String, Value>> {
    let mut node = raw;
    for key in ["시험일정", "시험일정", "exam_schedule"] {
        if let Some(inner) = node.get(key).filter(|v| v.is_object()) {
            node = inner;
        }
    }
    node.as_object()
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

fn normalize_line(line: &Map<String, Value>, base_year: Option<i32>) -> ScheduleEntry {
    let title = first_of(line, ALIAS_TITLE);
    let show_exam = first_of(line, ALIAS_EXAM);
    let show_register = first_of(line, ALIAS_REGISTER);
    let show_result = first_of(line, ALIAS_RESULT);

    let year = [&show_register, &show_exam, &show_result]
        .into_iter()
        .flatten()
        .find_map(|s| year_hint(s))
        .or(base_year);
    let span = |text: &Option<String>| -> Option<DateSpan> {
        text.as_deref().and_then(|t| span_from_text(&clean_line(t), year))
    };

    let mut entry = ScheduleEntry {
        round: line
            .get("회차")
            .and_then(scalar)
            .map(line_round)
            .or_else(|| title.as_deref().and_then(canonical_round)),
        grade: line.get("등급").and_then(scalar),
        session: line.get("차수").and_then(scalar),
        category: line.get("구분").and_then(scalar),
        register_start: iso(line, "registerStart"),
        register_end: iso(line, "registerEnd"),
        exam_date: iso(line, "examDate"),
        result_date: iso(line, "resultDate"),
        ..ScheduleEntry::default()
    };

    let kind = title.as_deref().map_or(LineKind::Unknown, infer_kind);
    let registration = match kind {
        LineKind::Register | LineKind::ExtraRegister => span(&show_register).or_else(|| span(&show_exam)),
        LineKind::Unknown => span(&show_register),
        _ => None,
    };
    let exam = match kind {
        LineKind::Exam | LineKind::Unknown => span(&show_exam),
        _ => None,
    };
    let result = match kind {
        LineKind::Result => span(&show_result).or_else(|| span(&show_exam)),
        LineKind::Unknown => span(&show_result),
        _ => None,
    };

    if kind == LineKind::ExtraRegister {
        entry.extra_registration = registration;
    } else if let Some(reg) = registration {
        if entry.register_start.is_none() || entry.register_end.is_none() {
            entry.register_start = Some(reg.start());
            entry.register_end = reg.end();
        }
    }
    entry.exam_date = entry.exam_date.or(exam.map(|s| s.start()));
    entry.result_date = entry.result_date.or(result.map(|s| s.start()));

    entry.title = title;
    entry.register_display = show_register;
    entry.exam_display = show_exam;
    entry.result_display = show_result;
    entry
}

/// `3`, `3회`, `제3회` all become `제3회`; anything else is kept as written.
fn line_round(raw: String) -> String {
    let labelled = if raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{raw}회")
    } else {
        raw.clone()
    };
    canonical_round(&labelled).unwrap_or(raw)
}

fn has_date(entry: &ScheduleEntry) -> bool {
    entry.register_start.is_some()
        || entry.register_end.is_some()
        || entry.exam_date.is_some()
        || entry.result_date.is_some()
        || entry.extra_registration.is_some()
}

fn normalize_time_line(line: &Map<String, Value>) -> TimeSlotRecord {
    let display = first_of(line, &["시험시간표시", "시험시간"]);
    let (mut start, mut end) = (
        line.get("start").and_then(scalar),
        line.get("end").and_then(scalar),
    );
    if start.is_none() || end.is_none() {
        if let Some(d) = &display {
            (start, end) = split_time_range(d);
        }
    }
    let duration_min = line
        .get("durationMin")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| display.as_deref().and_then(minutes_ko))
        .or_else(|| line.get("소요시간").and_then(scalar).as_deref().and_then(minutes_ko))
        .or_else(|| display.as_deref().and_then(duration_minutes));

    TimeSlotRecord {
        period: line.get("교시").and_then(scalar),
        grade: first_of(line, &["등급", "급수"]),
        session: line.get("차수").and_then(scalar),
        admission: first_of(line, &["입실완료시간", "입실"]),
        display,
        start,
        end,
        duration_min,
        note: line.get("비고").and_then(scalar),
    }
}

/// Normalize a crawler-produced schedule tree. Unknown shapes yield an
/// empty output.
pub fn normalize_tree(raw: &Value, base_year: Option<i32>) -> ScheduleOutput {
    let Some(root) = schedule_root(raw) else {
        return ScheduleOutput::default();
    };

    let entries: Vec<ScheduleEntry> = root
        .get("정기검정일정")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|line| normalize_line(line, base_year))
        .filter(|entry| {
            let keep = has_date(entry);
            if !keep {
                debug!(title = ?entry.title, "schedule line without dates, dropping");
            }
            keep
        })
        .collect();

    let time_slots = TIME_ROOTS
        .iter()
        .find_map(|k| root.get(*k).and_then(Value::as_array))
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(normalize_time_line)
        .collect();

    ScheduleOutput {
        entries,
        time_slots,
    }
}
