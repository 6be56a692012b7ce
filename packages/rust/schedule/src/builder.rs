//! Row-by-row assembly of schedule records from one table.
//!
//! Each data row is split into six phase buckets (no phase plus one per
//! [`Phase`]). Column values are routed to a bucket by the column's phase, the
//! row's phase, or neither; the buckets that end up holding dates become
//! records after the repair passes run and the text is coalesced into spans.

use certnorm_dates::{has_date_token, span_from_text, year_hint};
use certnorm_grid::{Grid, Table};
use certnorm_shared::{Field, Phase, ScheduleRecord, Tokens, strip_ws};
use tracing::{debug, instrument};

use crate::banner::is_banner_row;
use crate::classify::{ColumnMapping, is_answer_announcement, map_columns};
use crate::phase::{TableMode, detect_mode, detect_row_phase};
use crate::repair::{RepairContext, run_repairs};
use crate::rounds::{expand, has_round, parse_label};

const BUCKETS: usize = 6;

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Raw text collected for one phase bucket of one row.
#[derive(Debug, Clone, Default)]
pub(crate) struct Draft {
    pub round: Option<String>,
    fields: [Option<String>; 7],
}

impl Draft {
    pub fn get(&self, field: Field) -> Option<&str> {
        field.date_slot().and_then(|i| self.fields[i].as_deref())
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        if let Some(i) = field.date_slot() {
            self.fields[i] = value;
        }
    }

    /// Append `value` to the field, skipping text already present.
    pub fn merge(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let merged = match self.get(field) {
            Some(existing) if existing.split(' ').any(|part| part == value) || existing == value => {
                return;
            }
            Some(existing) => format!("{existing} {value}"),
            None => value.to_string(),
        };
        self.set(field, Some(merged));
    }

    pub fn has_payload(&self) -> bool {
        self.fields.iter().any(Option::is_some)
    }

    /// Record a round label. Text without a round or session is ignored; a
    /// session-only label (`2차`) is appended to the round already held.
    fn assign_round(&mut self, value: &str) {
        let parsed = parse_label(value);
        if parsed.is_empty() {
            return;
        }
        match &self.round {
            Some(existing) if parsed.rounds.is_empty() => {
                if !existing.contains(value) {
                    self.round = Some(format!("{existing} {value}"));
                }
            }
            _ => self.round = Some(value.trim().to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Header layout
// ---------------------------------------------------------------------------

pub(crate) struct Layout {
    pub headers: Vec<String>,
    pub body_start: usize,
    /// Texts of title rows above the header, kept for the year hint.
    pub titles: Vec<String>,
}

/// A single cell stretching across the whole table.
fn is_title_row(grid: &Grid, r: usize) -> bool {
    grid.width() > 1
        && grid
            .get(r, 0)
            .is_some_and(|cell| cell.origin_row == r && cell.col_span >= grid.width())
}

/// Locate the header row, skipping title rows and folding a grouped
/// two-row header into one label per column.
pub(crate) fn header_layout(grid: &Grid) -> Option<Layout> {
    let mut top = 0;
    let mut titles = Vec::new();
    while top < grid.height() && is_title_row(grid, top) {
        titles.extend(grid.get(top, 0).map(|cell| cell.text.clone()));
        top += 1;
    }
    if grid.height() < top + 2 {
        return None;
    }

    let mut headers = grid.row_texts(top);
    let mut body_start = top + 1;

    let spans_columns = (0..grid.width()).any(|c| {
        grid.get(top, c)
            .is_some_and(|cell| cell.origin_row == top && cell.col_span > 1)
    });
    if spans_columns && grid.height() > top + 2 {
        let below = grid.row_texts(top + 1);
        if !below.iter().any(|t| has_date_token(t)) {
            headers = headers
                .iter()
                .zip(&below)
                .map(|(upper, lower)| {
                    if lower.is_empty() || upper == lower {
                        upper.clone()
                    } else if upper.is_empty() {
                        lower.clone()
                    } else {
                        format!("{upper} {lower}")
                    }
                })
                .collect();
            body_start += 1;
        }
    }

    Some(Layout {
        headers,
        body_start,
        titles,
    })
}

// ---------------------------------------------------------------------------
// Table gates
// ---------------------------------------------------------------------------

fn names_phase(text: &str, tokens: &Tokens) -> bool {
    Phase::ALL
        .into_iter()
        .any(|p| tokens.row_phase_matcher(p).is_match(text))
}

/// A fee table: fee token up front, nothing but fees and phases after it, and
/// no schedule vocabulary anywhere.
fn is_fee_only(headers: &[String], tokens: &Tokens) -> bool {
    let first = headers.first().map(String::as_str).unwrap_or_default();
    tokens.fee.is_match(first)
        && headers
            .iter()
            .all(|h| tokens.fee.is_match(h) || names_phase(h, tokens))
        && !tokens.schedule_keywords.is_match(&headers.concat())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

struct TableContext {
    headers: Vec<String>,
    mapping: ColumnMapping,
    mode: TableMode,
    session_header: bool,
    base_year: Option<i32>,
}

/// Turns schedule tables into records, carrying the last seen round from one
/// table to the next within a document.
pub struct ScheduleBuilder<'t> {
    tokens: &'t Tokens,
    base_year: Option<i32>,
    last_round: Option<String>,
}

impl<'t> ScheduleBuilder<'t> {
    pub fn new(tokens: &'t Tokens, base_year: Option<i32>) -> Self {
        Self {
            tokens,
            base_year,
            last_round: None,
        }
    }

    /// Round carried into the next row that names none.
    pub fn last_round(&self) -> Option<&str> {
        self.last_round.as_deref()
    }

    /// Records for every data row of `table`. Tables that are not schedules
    /// yield nothing.
    #[instrument(skip_all, fields(rows = table.rows.len()))]
    pub fn push_table(&mut self, table: &Table) -> Vec<ScheduleRecord> {
        if table.rows.len() < 2 {
            debug!("table has fewer than two rows, skipping");
            return Vec::new();
        }
        let grid = table.grid();
        let Some(layout) = header_layout(&grid) else {
            debug!("no header and body rows, skipping");
            return Vec::new();
        };

        if is_fee_only(&layout.headers, self.tokens) {
            debug!(headers = ?layout.headers, "fee-only table, skipping");
            return Vec::new();
        }
        let joined = layout.headers.concat();
        if !self.tokens.schedule_keywords.is_match(&joined) && !names_phase(&joined, self.tokens) {
            debug!(headers = ?layout.headers, "no schedule headers, skipping");
            return Vec::new();
        }
        let mapping = map_columns(&layout.headers, self.tokens);
        if mapping.iter().all(Option::is_none) {
            debug!(headers = ?layout.headers, "no header maps to a field, skipping");
            return Vec::new();
        }

        let rows: Vec<Vec<String>> = (layout.body_start..grid.height())
            .map(|r| grid.row_texts(r))
            .collect();
        let row_phases: Vec<Option<Phase>> = rows
            .iter()
            .map(|cells| detect_row_phase(cells, self.tokens))
            .collect();

        let base_year = table
            .caption
            .iter()
            .chain(&layout.titles)
            .find_map(|t| year_hint(t))
            .or(self.base_year);

        let ctx = TableContext {
            session_header: layout.headers.iter().any(|h| strip_ws(h).contains("차수")),
            mode: detect_mode(&mapping, &row_phases),
            headers: layout.headers,
            mapping,
            base_year,
        };
        debug!(mode = ?ctx.mode, base_year, "table layout resolved");

        let mut out = Vec::new();
        for (cells, row_phase) in rows.iter().zip(row_phases) {
            out.extend(self.push_row(&ctx, cells, row_phase));
        }
        out
    }

    fn push_row(
        &mut self,
        ctx: &TableContext,
        cells: &[String],
        row_phase: Option<Phase>,
    ) -> Vec<ScheduleRecord> {
        if cells.iter().all(|c| c.trim().is_empty()) {
            return Vec::new();
        }
        if is_banner_row(cells, self.tokens) {
            debug!(first = %cells[0], "banner row, skipping");
            return Vec::new();
        }
        let row_text = cells.join(" ");
        if self.tokens.fee.is_match(&row_text) && !has_date_token(&row_text) {
            debug!(first = %cells[0], "fee row without dates, skipping");
            return Vec::new();
        }

        let compact = strip_ws(&row_text);
        let suppressed = (compact.contains("필기") && compact.contains("면제")).then_some(Phase::Written);

        let mut buckets: [Draft; BUCKETS] = Default::default();
        let mut touches = [0usize; BUCKETS];

        if has_round(&cells[0]) {
            buckets[0].assign_round(&cells[0]);
        }

        for (i, slot) in ctx.mapping.iter().enumerate() {
            let Some((col_phase, field)) = *slot else {
                continue;
            };
            let value = cells.get(i).map(|c| c.trim()).unwrap_or_default();
            if value.is_empty() {
                continue;
            }

            if field == Field::Round {
                buckets[0].assign_round(value);
                for phase in Phase::ALL {
                    if self.tokens.row_phase_matcher(phase).is_match(value) {
                        buckets[Phase::slot(Some(phase))].assign_round(value);
                    }
                }
                continue;
            }

            let header = &ctx.headers[i];
            let field = if is_answer_announcement(&strip_ws(&format!("{header}{value}"))) {
                Field::AnswerAnnouncement
            } else if strip_ws(header).contains("발표") {
                Field::Announcement
            } else {
                field
            };

            let column_phase = match ctx.mode {
                TableMode::ColumnPhase => col_phase,
                _ => None,
            };
            let target = Phase::slot(column_phase.or(row_phase));
            buckets[target].merge(field, value);
            if has_date_token(value) {
                touches[target] += 1;
            }
        }

        if let Some(dominant) = dominant_phase(&touches) {
            let base = buckets[0].clone();
            let bucket = &mut buckets[Phase::slot(Some(dominant))];
            for field in Field::DATES {
                if bucket.get(field).is_none() {
                    bucket.set(field, base.get(field).map(str::to_owned));
                }
            }
            if bucket.round.is_none() {
                bucket.round = base.round;
            }
        }

        let base_round = buckets[0].round.clone();
        let mut records = Vec::new();
        for (slot, mut draft) in buckets.into_iter().enumerate() {
            let phase = Phase::from_slot(slot);
            if !draft.has_payload() {
                continue;
            }
            if phase.is_some() && phase == suppressed {
                debug!(?phase, "phase exempted in this row");
                continue;
            }
            if ctx.mode == TableMode::ColumnPhase && phase.is_some() && touches[slot] == 0 {
                continue;
            }

            let label = draft
                .round
                .take()
                .or_else(|| base_round.clone())
                .or_else(|| self.last_round.clone());

            run_repairs(
                &mut draft,
                &RepairContext {
                    phase,
                    row_text: &row_text,
                    base_year: ctx.base_year,
                },
            );
            let record = coalesce(&draft, phase, ctx.base_year);
            if !record.has_any_date() {
                continue;
            }

            let keep_sessions = phase.is_none_or(|p| !p.is_session()) || ctx.session_header;
            for (round, session) in expand(label.as_deref(), keep_sessions) {
                records.push(ScheduleRecord {
                    round,
                    session,
                    ..record.clone()
                });
            }
        }

        if ctx.mode != TableMode::Neutral && records.iter().any(|r| r.phase.is_some()) {
            records.retain(|r| r.phase.is_some());
        }
        if let Some(round) = records.iter().find_map(|r| r.round.clone()) {
            self.last_round = Some(round);
        }
        records
    }
}

/// Real phase with the most dated cells; ties go to the earlier phase.
fn dominant_phase(touches: &[usize; BUCKETS]) -> Option<Phase> {
    Phase::ALL.into_iter().fold(None, |best, phase| {
        let count = touches[Phase::slot(Some(phase))];
        match best {
            Some(b) if touches[Phase::slot(Some(b))] >= count => Some(b),
            _ if count > 0 => Some(phase),
            _ => best,
        }
    })
}

/// Resolve every field of `draft` to a span, keeping the text it came from.
fn coalesce(draft: &Draft, phase: Option<Phase>, base_year: Option<i32>) -> ScheduleRecord {
    let mut record = ScheduleRecord {
        phase,
        ..ScheduleRecord::default()
    };
    for field in Field::DATES {
        let (Some(text), Some(i)) = (draft.get(field), field.date_slot()) else {
            continue;
        };
        let span = span_from_text(text, base_year);
        if span.is_some() {
            record.raw[i] = Some(text.to_string());
        }
        record.dates[i] = span;
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use certnorm_grid::Cell;
    use certnorm_shared::DateSpan;
    use chrono::NaiveDate;

    fn tokens() -> Tokens {
        Tokens::builtin().expect("builtin tokens")
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|c| Cell::new(*c)).collect()
    }

    fn table(rows: Vec<Vec<Cell>>) -> Table {
        Table {
            caption: None,
            rows,
        }
    }

    #[test]
    fn column_phase_table_yields_one_record_per_phase() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "필기원서접수", "필기시험", "필기합격발표", "실기원서접수", "실기시험", "실기합격발표"]),
            row(&["제1회", "01.13~01.16", "02.08", "03.12", "03.24~03.27", "04.19~05.09", "06.13"]),
        ]));

        assert_eq!(records.len(), 2, "records: {records:?}");
        let written = &records[0];
        assert_eq!(written.phase, Some(Phase::Written));
        assert_eq!(written.round.as_deref(), Some("제1회"));
        assert_eq!(
            written.date(Field::Registration),
            Some(&DateSpan::Range(d(2025, 1, 13), d(2025, 1, 16)))
        );
        assert_eq!(written.date(Field::ExamDate), Some(&DateSpan::Single(d(2025, 2, 8))));
        assert_eq!(written.raw_text(Field::Announcement), Some("03.12"));

        let practical = &records[1];
        assert_eq!(practical.phase, Some(Phase::Practical));
        assert_eq!(practical.round.as_deref(), Some("제1회"));
        assert_eq!(
            practical.date(Field::ExamDate),
            Some(&DateSpan::Range(d(2025, 4, 19), d(2025, 5, 9)))
        );
    }

    #[test]
    fn row_phase_table_threads_rowspanned_round() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "구분", "원서접수", "시험일", "합격자발표"]),
            vec![
                Cell::spanned("제2회", 2, 1),
                Cell::new("필기"),
                Cell::new("04.14~04.17"),
                Cell::new("05.10"),
                Cell::new("06.11"),
            ],
            row(&["실기", "06.23~06.26", "07.19~08.06", "09.05"]),
        ]));

        let phases: Vec<_> = records.iter().map(|r| r.phase).collect();
        assert_eq!(phases, vec![Some(Phase::Written), Some(Phase::Practical)]);
        assert!(records.iter().all(|r| r.round.as_deref() == Some("제2회")));
        assert_eq!(
            records[1].date(Field::Announcement),
            Some(&DateSpan::Single(d(2025, 9, 5)))
        );
    }

    #[test]
    fn round_carries_across_tables() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        builder.push_table(&table(vec![
            row(&["회차", "원서접수", "시험일"]),
            row(&["제3회", "2025.06.09~2025.06.12", "2025.07.05"]),
        ]));
        assert_eq!(builder.last_round(), Some("제3회"));

        let records = builder.push_table(&table(vec![
            row(&["구분", "원서접수", "시험일"]),
            row(&["실기", "08.04~08.07", "09.06"]),
        ]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].round.as_deref(), Some("제3회"));
        assert_eq!(records[0].phase, Some(Phase::Practical));
    }

    #[test]
    fn banner_and_fee_rows_are_skipped() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "원서접수", "시험일"]),
            row(&["※ 시험일정은 변경될 수 있음", "", ""]),
            row(&["검정수수료", "19,400원", ""]),
            row(&["제1회", "2025.01.13~2025.01.16", "2025.02.08"]),
        ]));
        assert_eq!(records.len(), 1, "records: {records:?}");
        assert_eq!(records[0].round.as_deref(), Some("제1회"));
    }

    #[test]
    fn fee_only_table_is_skipped() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["수수료", "필기", "실기"]),
            row(&["원", "19,400", "22,600"]),
        ]));
        assert!(records.is_empty());
    }

    #[test]
    fn exempted_written_phase_is_dropped() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "필기원서접수", "실기원서접수"]),
            row(&["제1회 (필기면제)", "01.13~01.16", "03.24~03.27"]),
        ]));
        assert_eq!(records.len(), 1, "records: {records:?}");
        assert_eq!(records[0].phase, Some(Phase::Practical));
    }

    #[test]
    fn compound_round_expands() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "원서접수", "시험일"]),
            row(&["1-2회", "2025.01.13~2025.01.16", "2025.02.08"]),
        ]));
        let rounds: Vec<_> = records.iter().map(|r| r.round.as_deref()).collect();
        assert_eq!(rounds, vec![Some("제1회"), Some("제2회")]);
        assert!(records.iter().all(|r| r.phase.is_none()));
    }

    #[test]
    fn round_range_records_share_dates() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "원서접수", "시험일", "합격자발표"]),
            row(&["1-3회", "01.13~01.16", "02.08", "03.12"]),
        ]));

        let rounds: Vec<_> = records.iter().map(|r| r.round.as_deref()).collect();
        assert_eq!(rounds, vec![Some("제1회"), Some("제2회"), Some("제3회")]);
        for record in &records[1..] {
            assert_eq!(record.dates, records[0].dates, "dates differ for {:?}", record.round);
        }
        assert_eq!(
            records[2].date(Field::Registration),
            Some(&DateSpan::Range(d(2025, 1, 13), d(2025, 1, 16)))
        );
    }

    #[test]
    fn phase_qualified_registration_header() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "원서접수(필기시험)", "필기시험일"]),
            row(&["제1회", "01.13~01.16", "02.08"]),
        ]));

        assert_eq!(records.len(), 1, "records: {records:?}");
        let written = &records[0];
        assert_eq!(written.phase, Some(Phase::Written));
        assert_eq!(
            written.date(Field::Registration),
            Some(&DateSpan::Range(d(2025, 1, 13), d(2025, 1, 16)))
        );
        assert_eq!(written.date(Field::ExamDate), Some(&DateSpan::Single(d(2025, 2, 8))));
        assert_eq!(written.raw_text(Field::ExamDate), Some("02.08"));
    }

    #[test]
    fn title_row_and_grouped_header() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2024));
        let records = builder.push_table(&table(vec![
            vec![Cell::spanned("2025년 국가기술자격 시험일정", 1, 5)],
            vec![
                Cell::spanned("회차", 2, 1),
                Cell::spanned("필기", 1, 2),
                Cell::spanned("실기", 1, 2),
            ],
            row(&["원서접수", "시험일", "원서접수", "시험일"]),
            row(&["제1회", "01.13~01.16", "02.08", "03.24~03.27", "04.19"]),
        ]));

        assert_eq!(records.len(), 2, "records: {records:?}");
        assert_eq!(records[0].phase, Some(Phase::Written));
        assert_eq!(
            records[0].date(Field::Registration),
            Some(&DateSpan::Range(d(2025, 1, 13), d(2025, 1, 16)))
        );
        assert_eq!(records[1].phase, Some(Phase::Practical));
        assert_eq!(records[1].date(Field::ExamDate), Some(&DateSpan::Single(d(2025, 4, 19))));
    }

    #[test]
    fn rows_without_dates_are_not_records() {
        let t = tokens();
        let mut builder = ScheduleBuilder::new(&t, Some(2025));
        let records = builder.push_table(&table(vec![
            row(&["회차", "원서접수", "시험일"]),
            row(&["제1회", "추후 공지", "미정"]),
        ]));
        assert!(records.is_empty());
    }

    #[test]
    fn session_only_label_joins_round() {
        let mut draft = Draft::default();
        draft.assign_round("제1회");
        draft.assign_round("2차");
        assert_eq!(draft.round.as_deref(), Some("제1회 2차"));
        draft.assign_round("일반");
        assert_eq!(draft.round.as_deref(), Some("제1회 2차"));
    }

    #[test]
    fn merge_skips_repeated_text() {
        let mut draft = Draft::default();
        draft.merge(Field::ExamDate, "02.08");
        draft.merge(Field::ExamDate, "02.08");
        draft.merge(Field::ExamDate, "02.09");
        assert_eq!(draft.get(Field::ExamDate), Some("02.08 02.09"));
    }

    #[test]
    fn dominant_phase_prefers_earlier_on_ties() {
        let mut touches = [0; BUCKETS];
        assert_eq!(dominant_phase(&touches), None);
        touches[Phase::slot(Some(Phase::Practical))] = 2;
        touches[Phase::slot(Some(Phase::Written))] = 2;
        assert_eq!(dominant_phase(&touches), Some(Phase::Written));
        touches[Phase::slot(Some(Phase::Interview))] = 3;
        assert_eq!(dominant_phase(&touches), Some(Phase::Interview));
    }
}
