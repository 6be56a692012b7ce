//! Header classification: which field (and phase) a column carries.

use certnorm_shared::{Field, Phase, Tokens, strip_ws};

/// `column → (phase, field)` for every column; `None` for unrecognized headers.
pub type ColumnMapping = Vec<Option<(Option<Phase>, Field)>>;

/// Classify one header.
///
/// Round tokens win outright. Otherwise fields are tried in
/// [`Field::CLASSIFY_ORDER`], and within each field the phase-specific tokens
/// come before the neutral ones, so `원서접수(필기시험)` is a registration
/// column even though `필기시험` names an exam date. A neutral hit takes its
/// phase from the row-phase tokens when exactly one phase is named. A header
/// naming both `정답` and `발표` is always `정답발표`.
pub fn classify_header(header: &str, tokens: &Tokens) -> (Option<Phase>, Option<Field>) {
    let text = strip_ws(header);
    if text.is_empty() {
        return (None, None);
    }
    if tokens.round.is_match(&text) {
        return (None, Some(Field::Round));
    }

    let matched = tokens.fields.iter().find_map(|fm| {
        Phase::ALL
            .into_iter()
            .find(|p| fm.by_phase[*p as usize].is_match(&text))
            .map(|p| (Some(p), fm.field))
            .or_else(|| {
                fm.neutral
                    .is_match(&text)
                    .then(|| (named_phase(&text, tokens), fm.field))
            })
    });

    match matched {
        Some((phase, _)) if is_answer_announcement(&text) => {
            (phase, Some(Field::AnswerAnnouncement))
        }
        Some((phase, field)) => (phase, Some(field)),
        None => (None, None),
    }
}

/// The single phase a header names, if any. `1·2차` names two and yields none.
fn named_phase(text: &str, tokens: &Tokens) -> Option<Phase> {
    let mut named = Phase::ALL
        .into_iter()
        .filter(|p| tokens.row_phase_matcher(*p).is_match(text));
    match (named.next(), named.next()) {
        (Some(phase), None) => Some(phase),
        _ => None,
    }
}

pub(crate) fn is_answer_announcement(text: &str) -> bool {
    text.contains("정답") && text.contains("발표")
}

/// Classify every header of a table.
pub fn map_columns(headers: &[String], tokens: &Tokens) -> ColumnMapping {
    headers
        .iter()
        .map(|h| match classify_header(h, tokens) {
            (phase, Some(field)) => Some((phase, field)),
            (_, None) => None,
        })
        .collect()
}
