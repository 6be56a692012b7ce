//! Row-level phase detection and per-table mode.

use certnorm_shared::{Phase, Tokens};

use crate::classify::ColumnMapping;

/// How a table encodes phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Phase baked into column headers (`필기 접수 | 실기 접수`).
    ColumnPhase,
    /// Phase given by each row's leading label (`필기 | 01.13~01.16`).
    RowPhase,
    /// No phase anywhere; each row is one implicit record.
    Neutral,
}

fn phase_in(text: &str, tokens: &Tokens) -> Option<Phase> {
    Phase::ALL
        .into_iter()
        .find(|p| tokens.row_phase_matcher(*p).is_match(text))
}

/// Phase named by the row's first cell, falling back to the whole row.
pub fn detect_row_phase(cells: &[String], tokens: &Tokens) -> Option<Phase> {
    let first = cells.first().map(String::as_str).unwrap_or_default();
    phase_in(first, tokens).or_else(|| phase_in(&cells.join(" "), tokens))
}

/// Decide the mode once per table from its column mapping and the phases
/// detected on its data rows.
pub fn detect_mode(mapping: &ColumnMapping, row_phases: &[Option<Phase>]) -> TableMode {
    if mapping.iter().flatten().any(|(phase, _)| phase.is_some()) {
        TableMode::ColumnPhase
    } else if row_phases.iter().any(Option::is_some) {
        TableMode::RowPhase
    } else {
        TableMode::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certnorm_shared::Field;

    fn tokens() -> Tokens {
        Tokens::builtin().expect("builtin tokens")
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn first_cell_wins() {
        let t = tokens();
        assert_eq!(detect_row_phase(&row(&["실기", "필기 면제자"]), &t), Some(Phase::Practical));
        assert_eq!(detect_row_phase(&row(&["2차 시험", "x"]), &t), Some(Phase::Second));
    }

    #[test]
    fn falls_back_to_full_row() {
        let t = tokens();
        assert_eq!(detect_row_phase(&row(&["제1회", "면접 03.10"]), &t), Some(Phase::Interview));
        assert_eq!(detect_row_phase(&row(&["제1회", "03.10"]), &t), None);
        assert_eq!(detect_row_phase(&[], &t), None);
    }

    #[test]
    fn mode_detection() {
        let column_phase: ColumnMapping = vec![Some((Some(Phase::Written), Field::Registration))];
        let neutral: ColumnMapping = vec![Some((None, Field::Registration)), None];
        assert_eq!(detect_mode(&column_phase, &[None]), TableMode::ColumnPhase);
        assert_eq!(detect_mode(&neutral, &[None, Some(Phase::Practical)]), TableMode::RowPhase);
        assert_eq!(detect_mode(&neutral, &[None, None]), TableMode::Neutral);
    }
}
