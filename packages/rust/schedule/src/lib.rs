//! Schedule normalization: HTML-derived tables and crawler trees to
//! `정기검정일정` entries and `시험시간` slots.
//!
//! The table path runs, per table: grid reconstruction, header
//! classification ([`classify`]), phase detection ([`phase`]), banner
//! filtering ([`banner`]), bucket assembly and repairs ([`builder`]), then
//! round/session expansion ([`rounds`]). Time-slot tables are recognized by
//! their headers and parsed separately ([`timeslot`]); fee tables feed
//! [`fees`].

pub mod banner;
pub mod builder;
pub mod classify;
pub mod fees;
pub mod phase;
mod repair;
pub mod rounds;
pub mod timeslot;
pub mod tree;

pub use banner::is_banner_row;
pub use builder::ScheduleBuilder;
pub use classify::{ColumnMapping, classify_header, map_columns};
pub use fees::extract_fees;
pub use phase::{TableMode, detect_mode, detect_row_phase};
pub use rounds::{ParsedLabel, Round, canonical_round, expand, parse_label};
pub use timeslot::{is_time_slot_header, parse_time_slot_table};
pub use tree::normalize_tree;

use certnorm_dedupe::dedup_by_signature;
use certnorm_grid::Table;
use certnorm_shared::{ScheduleEntry, ScheduleOutput, Tokens};
use tracing::{info, instrument};

/// Normalize every table of one document.
///
/// The last seen round carries from table to table, so tables must be given
/// in document order.
#[instrument(skip_all, fields(tables = tables.len()))]
pub fn normalize_tables(tables: &[Table], tokens: &Tokens, base_year: Option<i32>) -> ScheduleOutput {
    let mut builder = ScheduleBuilder::new(tokens, base_year);
    let mut out = ScheduleOutput::default();

    for table in tables {
        if let Some(slots) = parse_time_slot_table(table, tokens) {
            out.time_slots.extend(slots);
            continue;
        }
        out.entries
            .extend(builder.push_table(table).iter().map(ScheduleEntry::from));
    }

    let out = dedup_output(out);
    info!(
        entries = out.entries.len(),
        time_slots = out.time_slots.len(),
        "schedule tables normalized"
    );
    out
}

/// Concatenate two outputs (tables first) and drop duplicates.
pub fn merge_outputs(first: ScheduleOutput, second: ScheduleOutput) -> ScheduleOutput {
    let mut out = first;
    out.entries.extend(second.entries);
    out.time_slots.extend(second.time_slots);
    dedup_output(out)
}

fn dedup_output(out: ScheduleOutput) -> ScheduleOutput {
    ScheduleOutput {
        entries: dedup_by_signature(out.entries),
        time_slots: dedup_by_signature(out.time_slots),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use certnorm_grid::input::RawTable;
    use certnorm_shared::Phase;
    use chrono::NaiveDate;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_tables(name: &str) -> Vec<Table> {
        let content = fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"));
        let raw: Vec<RawTable> =
            serde_json::from_str(&content).unwrap_or_else(|e| panic!("bad fixture {name}: {e}"));
        raw.into_iter().map(Table::from).collect()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    #[test]
    fn fixture_document_normalizes() {
        let tokens = Tokens::builtin().expect("builtin tokens");
        let tables = load_tables("schedule_tables.json");
        let out = normalize_tables(&tables, &tokens, Some(2025));

        let written: Vec<&ScheduleEntry> = out
            .entries
            .iter()
            .filter(|e| e.phase == Some(Phase::Written))
            .collect();
        assert_eq!(written.len(), 3, "entries: {:?}", out.entries);
        assert_eq!(written[0].round.as_deref(), Some("제1회"));
        assert_eq!(written[0].register_start, Some(d(2025, 1, 13)));

        // Registration running over New Year rolls into the next year.
        let last = written[2];
        assert_eq!(last.round.as_deref(), Some("제3회"));
        assert_eq!(last.register_start, Some(d(2025, 12, 22)));
        assert_eq!(last.register_end, Some(d(2026, 1, 2)));
        assert_eq!(last.exam_date, Some(d(2026, 1, 17)));

        assert_eq!(out.time_slots.len(), 2);
        assert_eq!(out.time_slots[1].period.as_deref(), Some("2교시"));
    }

    #[test]
    fn repeated_table_adds_nothing() {
        let tokens = Tokens::builtin().expect("builtin tokens");
        let tables = load_tables("schedule_tables.json");
        let once = normalize_tables(&tables[..1], &tokens, Some(2025));
        let twice = normalize_tables(&[tables[0].clone(), tables[0].clone()], &tokens, Some(2025));
        assert_eq!(once, twice);
    }

    #[test]
    fn html_table_with_empty_spanned_row() {
        let tokens = Tokens::builtin().expect("builtin tokens");
        let html = r#"
            <table>
              <tr><th>회차</th><th>원서접수</th><th>시험일</th></tr>
              <tr><td rowspan="2">제1회</td><td rowspan="2">01.13~01.16</td><td rowspan="2">02.08</td></tr>
              <tr></tr>
              <tr><td>제2회</td><td>04.01~04.03</td><td>05.01</td></tr>
            </table>"#;
        let tables = certnorm_grid::html::parse_tables(html);
        let out = normalize_tables(&tables, &tokens, Some(2025));

        let rounds: Vec<_> = out.entries.iter().map(|e| e.round.as_deref()).collect();
        assert_eq!(rounds, vec![Some("제1회"), Some("제2회")]);
        assert_eq!(out.entries[1].register_start, Some(d(2025, 4, 1)));
        assert_eq!(out.entries[1].exam_date, Some(d(2025, 5, 1)));
    }
}
