//! Row-local repair passes over a draft record.
//!
//! Source tables regularly put the wrong thing in the registration column: an
//! announcement date that spilled over, two ranges packed together, or a
//! trailing `빈자리 추가접수` clause. Each pass is a function over the draft,
//! applied in sequence before the fields are coalesced into date spans.

use std::sync::LazyLock;

use certnorm_dates::{
    date_ranges, date_tokens, first_date_span, is_lone_date, span_from_text, strip_ranges,
};
use certnorm_shared::{Field, Phase, strip_ws};
use regex::Regex;

use crate::builder::Draft;

/// Facts about the row a draft came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RepairContext<'a> {
    pub phase: Option<Phase>,
    pub row_text: &'a str,
    pub base_year: Option<i32>,
}

/// Run every repair pass on `draft`.
pub(crate) fn run_repairs(draft: &mut Draft, ctx: &RepairContext) {
    split_extra_registration(draft);
    fix_spillover_in_registration(draft);
    rescue_lone_announcement(draft);
    fill_practical_from_row(draft, ctx);
}

// ---------------------------------------------------------------------------
// Pass 1: Split a trailing 빈자리 추가접수 clause
// ---------------------------------------------------------------------------

fn split_extra_registration(draft: &mut Draft) {
    static EXTRA_START: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[?\s*빈자리\s*(?:추가)?\s*접수(?:\s*기간)?\s*[:：]?\s*").expect("valid regex")
    });

    let Some(text) = draft.get(Field::Registration).map(str::to_owned) else {
        return;
    };
    let Some(m) = EXTRA_START.find(&text) else {
        return;
    };

    let main = text[..m.start()]
        .trim()
        .trim_matches(|c: char| "[] ,;/".contains(c))
        .to_string();
    let mut tail = &text[m.end()..];
    if let Some(close) = tail.find(']') {
        tail = &tail[..close];
    }
    let extra = match date_tokens(tail).as_slice() {
        [] => None,
        [one] => Some(one.to_string()),
        [first, .., last] => Some(format!("{first} ~ {last}")),
    };

    draft.set(Field::Registration, Some(main).filter(|s| !s.is_empty()));
    if draft.get(Field::ExtraRegistration).is_none() {
        draft.set(Field::ExtraRegistration, extra);
    }
}

// ---------------------------------------------------------------------------
// Pass 2: Announcement or exam dates spilled into registration
// ---------------------------------------------------------------------------

fn fix_spillover_in_registration(draft: &mut Draft) {
    let Some(mut text) = draft.get(Field::Registration).map(str::to_owned) else {
        return;
    };

    if strip_ws(&text).contains("발표") && draft.get(Field::Announcement).is_none() {
        if let Some(last) = date_tokens(&text).last() {
            draft.set(Field::Announcement, Some(last.to_string()));
        }
        if let Some(pos) = text.find("발표") {
            if let Some(span) = first_date_span(&text[pos..]) {
                text.replace_range(pos..pos + span.end, " ");
            }
        }
    }

    let ranges: Vec<String> = date_ranges(&text).into_iter().map(str::to_owned).collect();
    if ranges.len() >= 2 {
        draft.set(Field::Registration, Some(ranges[0].clone()));
        if draft.get(Field::ExamDate).is_none() {
            draft.set(Field::ExamDate, Some(ranges[1].clone()));
        }
        let rest = strip_ranges(&text);
        if draft.get(Field::Announcement).is_none() {
            let last = date_tokens(&rest).last().map(|s| s.to_string());
            draft.set(Field::Announcement, last);
        }
    } else {
        let text = text.trim().to_string();
        draft.set(Field::Registration, Some(text).filter(|s| !s.is_empty()));
    }
}

// ---------------------------------------------------------------------------
// Pass 3: A lone date in registration is the announcement
// ---------------------------------------------------------------------------

fn rescue_lone_announcement(draft: &mut Draft) {
    let Some(text) = draft.get(Field::Registration) else {
        return;
    };
    if is_lone_date(text)
        && draft.get(Field::ExamDate).is_none()
        && draft.get(Field::Announcement).is_none()
    {
        let text = text.to_string();
        draft.set(Field::Announcement, Some(text));
        draft.set(Field::Registration, None);
    }
}

// ---------------------------------------------------------------------------
// Pass 4: Practical bucket with only an announcement
// ---------------------------------------------------------------------------

/// Borrow the row's two distinct ranges: the later-ending one is the exam,
/// the other is registration.
fn fill_practical_from_row(draft: &mut Draft, ctx: &RepairContext) {
    if ctx.phase != Some(Phase::Practical)
        || draft.get(Field::Registration).is_some()
        || draft.get(Field::ExamDate).is_some()
        || draft.get(Field::Announcement).is_none()
    {
        return;
    }

    let mut unique: Vec<&str> = Vec::new();
    for range in date_ranges(ctx.row_text) {
        if !unique.contains(&range) {
            unique.push(range);
        }
    }
    let [a, b, ..] = unique.as_slice() else {
        return;
    };

    let end = |s: &str| span_from_text(s, ctx.base_year).and_then(|span| span.end());
    let (later, earlier) = if end(a) > end(b) { (a, b) } else { (b, a) };
    draft.set(Field::ExamDate, Some(later.to_string()));
    draft.set(Field::Registration, Some(earlier.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(phase: Option<Phase>, row_text: &str) -> RepairContext<'_> {
        RepairContext {
            phase,
            row_text,
            base_year: Some(2025),
        }
    }

    fn draft_with(field: Field, text: &str) -> Draft {
        let mut draft = Draft::default();
        draft.set(field, Some(text.to_string()));
        draft
    }

    #[test]
    fn extra_registration_clause_is_split() {
        let mut draft = draft_with(
            Field::Registration,
            "2025.01.13 ~ 2025.01.16 [빈자리 추가접수: 2025.01.25 ~ 2025.01.26]",
        );
        run_repairs(&mut draft, &ctx(None, ""));
        assert_eq!(draft.get(Field::Registration), Some("2025.01.13 ~ 2025.01.16"));
        assert_eq!(
            draft.get(Field::ExtraRegistration),
            Some("2025.01.25 ~ 2025.01.26")
        );
    }

    #[test]
    fn spilled_announcement_moves_out() {
        let mut draft = draft_with(Field::Registration, "01.13 ~ 01.16 합격자발표 02.07");
        run_repairs(&mut draft, &ctx(None, ""));
        assert_eq!(draft.get(Field::Announcement), Some("02.07"));
        assert_eq!(draft.get(Field::Registration), Some("01.13 ~ 01.16 합격자"));
    }

    #[test]
    fn packed_ranges_split_into_registration_and_exam() {
        let mut draft = draft_with(
            Field::Registration,
            "2025.01.13~2025.01.16 2025.02.08~2025.02.09 2025.03.01",
        );
        run_repairs(&mut draft, &ctx(None, ""));
        assert_eq!(draft.get(Field::Registration), Some("2025.01.13~2025.01.16"));
        assert_eq!(draft.get(Field::ExamDate), Some("2025.02.08~2025.02.09"));
        assert_eq!(draft.get(Field::Announcement), Some("2025.03.01"));
    }

    #[test]
    fn lone_date_becomes_announcement() {
        let mut draft = draft_with(Field::Registration, "2025.03.01(토)");
        run_repairs(&mut draft, &ctx(None, ""));
        assert_eq!(draft.get(Field::Registration), None);
        assert_eq!(draft.get(Field::Announcement), Some("2025.03.01(토)"));
    }

    #[test]
    fn lone_date_stays_when_exam_known() {
        let mut draft = draft_with(Field::Registration, "2025.03.01");
        draft.set(Field::ExamDate, Some("2025.03.15".into()));
        run_repairs(&mut draft, &ctx(None, ""));
        assert_eq!(draft.get(Field::Registration), Some("2025.03.01"));
    }

    #[test]
    fn practical_borrows_row_ranges() {
        let mut draft = draft_with(Field::Announcement, "06.13");
        let row = "제2회 04.14~04.17 05.24~06.05 06.13";
        run_repairs(&mut draft, &ctx(Some(Phase::Practical), row));
        assert_eq!(draft.get(Field::ExamDate), Some("05.24~06.05"));
        assert_eq!(draft.get(Field::Registration), Some("04.14~04.17"));
    }

    #[test]
    fn written_bucket_does_not_borrow() {
        let mut draft = draft_with(Field::Announcement, "06.13");
        run_repairs(&mut draft, &ctx(Some(Phase::Written), "04.14~04.17 05.24~06.05"));
        assert_eq!(draft.get(Field::ExamDate), None);
    }
}
