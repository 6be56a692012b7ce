//! `시험시간` tables: period, admission cut-off, and exam window per row.

use certnorm_dates::{duration_minutes, split_time_range};
use certnorm_grid::Table;
use certnorm_shared::{TimeSlotRecord, Tokens, strip_ws};
use tracing::debug;

use crate::builder::header_layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Period,
    Session,
    Grade,
    Admission,
    Time,
    Note,
}

fn role_of(header: &str, tokens: &Tokens) -> Option<Role> {
    let m = &tokens.time_slot;
    // `입실 및 시험시간` names the window, not the admission time.
    if m.time.is_match(header) {
        Some(Role::Time)
    } else if m.admission.is_match(header) {
        Some(Role::Admission)
    } else if m.note.is_match(header) {
        Some(Role::Note)
    } else if m.period.is_match(header) {
        if strip_ws(header).contains("차수") {
            Some(Role::Session)
        } else {
            Some(Role::Period)
        }
    } else if m.grade.is_match(header) {
        Some(Role::Grade)
    } else {
        None
    }
}

/// Whether the headers describe a time-slot table: a period column, a time
/// column, and an admission or grade column.
pub fn is_time_slot_header(headers: &[String], tokens: &Tokens) -> bool {
    let roles: Vec<Role> = headers.iter().filter_map(|h| role_of(h, tokens)).collect();
    let has = |r: Role| roles.contains(&r);
    (has(Role::Period) || has(Role::Session))
        && has(Role::Time)
        && (has(Role::Admission) || has(Role::Grade))
}

/// Parse a time-slot table, or `None` when `table` is not one.
pub fn parse_time_slot_table(table: &Table, tokens: &Tokens) -> Option<Vec<TimeSlotRecord>> {
    let grid = table.grid();
    let layout = header_layout(&grid)?;
    if !is_time_slot_header(&layout.headers, tokens) {
        return None;
    }
    let roles: Vec<Option<Role>> = layout.headers.iter().map(|h| role_of(h, tokens)).collect();

    let mut out = Vec::new();
    for r in layout.body_start..grid.height() {
        let cells = grid.row_texts(r);
        let mut slot = TimeSlotRecord::default();
        for (text, role) in cells.iter().zip(&roles) {
            let text = text.trim();
            let Some(role) = role else { continue };
            if text.is_empty() {
                continue;
            }
            let value = Some(text.to_string());
            match role {
                Role::Period => slot.period = value,
                Role::Session => slot.session = value,
                Role::Grade => slot.grade = value,
                Role::Admission => slot.admission = value,
                Role::Time => slot.display = value,
                Role::Note => slot.note = value,
            }
        }

        let Some(display) = slot.display.clone() else {
            debug!(row = r, "time-slot row without a time, skipping");
            continue;
        };
        (slot.start, slot.end) = split_time_range(&display);
        slot.duration_min = duration_minutes(&display);
        out.push(slot);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certnorm_grid::Cell;

    fn tokens() -> Tokens {
        Tokens::builtin().expect("builtin tokens")
    }

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|c| Cell::new(*c)).collect()
    }

    #[test]
    fn parses_rows_and_carries_rowspans() {
        let t = tokens();
        let table = Table {
            caption: Some("입실 및 시험시간".into()),
            rows: vec![
                row(&["교시", "등급", "입실완료시간", "시험시간"]),
                vec![
                    Cell::spanned("1교시", 2, 1),
                    Cell::new("1급"),
                    Cell::spanned("08:50", 2, 1),
                    Cell::new("09:00 ~ 10:40 (100분)"),
                ],
                row(&["2급", "09:00~10:00"]),
            ],
        };

        let slots = parse_time_slot_table(&table, &t).expect("time-slot table");
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].period.as_deref(), Some("1교시"));
        assert_eq!(slots[0].start.as_deref(), Some("09:00"));
        assert_eq!(slots[0].end.as_deref(), Some("10:40"));
        assert_eq!(slots[0].duration_min, Some(100));
        assert_eq!(slots[1].period.as_deref(), Some("1교시"));
        assert_eq!(slots[1].grade.as_deref(), Some("2급"));
        assert_eq!(slots[1].admission.as_deref(), Some("08:50"));
        assert_eq!(slots[1].duration_min, Some(60));
    }

    #[test]
    fn session_header_fills_session() {
        let t = tokens();
        let table = Table {
            caption: None,
            rows: vec![
                row(&["등급", "차수", "입실완료시간", "시험시간"]),
                row(&["2급", "1차", "09:20", "09:30 ~ 10:30"]),
            ],
        };
        let slots = parse_time_slot_table(&table, &t).expect("time-slot table");
        assert_eq!(slots[0].session.as_deref(), Some("1차"));
        assert_eq!(slots[0].period, None);
    }

    #[test]
    fn schedule_table_is_not_time_slots() {
        let t = tokens();
        let table = Table {
            caption: None,
            rows: vec![
                row(&["회차", "원서접수", "시험일"]),
                row(&["제1회", "01.13~01.16", "02.08"]),
            ],
        };
        assert!(parse_time_slot_table(&table, &t).is_none());
    }
}
