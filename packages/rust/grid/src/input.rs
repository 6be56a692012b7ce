//! JSON table input.
//!
//! Accepted shape: `{ "caption"?: string, "rows": [[cell, ...], ...] }` where a
//! cell is either a plain string or `{ "text", "rowSpan"?, "colSpan"? }`.
//! Span values may be numbers or numeric strings; anything else counts as 1.

use serde::Deserialize;
use serde_json::Value;

use crate::{Cell, Table, collapse_ws};

/// A table as it appears in an input document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub rows: Vec<Vec<RawCell>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Text(String),
    Spanned {
        #[serde(default)]
        text: Value,
        #[serde(default, rename = "rowSpan", alias = "rowspan")]
        row_span: Value,
        #[serde(default, rename = "colSpan", alias = "colspan")]
        col_span: Value,
    },
    Other(Value),
}

/// Parse a span value leniently. Missing, non-numeric, or zero gives 1.
pub fn lenient_span(value: &Value) -> usize {
    let n = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    n.map_or(1, |n| usize::try_from(n).unwrap_or(usize::MAX).max(1))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => collapse_ws(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

impl From<&RawCell> for Cell {
    fn from(raw: &RawCell) -> Self {
        match raw {
            RawCell::Text(text) => Cell::new(collapse_ws(text)),
            RawCell::Spanned {
                text,
                row_span,
                col_span,
            } => Cell::spanned(scalar_text(text), lenient_span(row_span), lenient_span(col_span)),
            RawCell::Other(value) => Cell::new(scalar_text(value)),
        }
    }
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        Self {
            caption: raw.caption.map(|c| collapse_ws(&c)).filter(|c| !c.is_empty()),
            rows: raw
                .rows
                .iter()
                .map(|row| row.iter().map(Cell::from).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Table {
        serde_json::from_str::<RawTable>(json).expect("raw table").into()
    }

    #[test]
    fn mixed_plain_and_spanned_cells() {
        let table = parse(
            r#"{"caption":" 2025년 시험일정 ","rows":[["회차","접수"],[{"text":"제1회","rowSpan":2},"01.13~01.16"]]}"#,
        );
        assert_eq!(table.caption.as_deref(), Some("2025년 시험일정"));
        assert_eq!(table.rows[1][0], Cell::spanned("제1회", 2, 1));
        assert_eq!(table.rows[1][1].text, "01.13~01.16");
    }

    #[test]
    fn lenient_spans() {
        assert_eq!(lenient_span(&Value::from(3)), 3);
        assert_eq!(lenient_span(&Value::from(" 2 ")), 2);
        assert_eq!(lenient_span(&Value::from("two")), 1);
        assert_eq!(lenient_span(&Value::Null), 1);
        assert_eq!(lenient_span(&Value::from(0)), 1);
    }

    #[test]
    fn lowercase_span_aliases_and_non_string_text() {
        let table = parse(r#"{"rows":[[{"text":2025,"colspan":"2"}, null]]}"#);
        assert_eq!(table.rows[0][0], Cell::spanned("2025", 1, 2));
        assert_eq!(table.rows[0][1].text, "");
    }
}
