//! HTML table ingest.
//!
//! Turns an already isolated HTML fragment into [`Table`]s. Every `<table>` in
//! the fragment becomes one table; `<tr>` rows are read in document order and
//! `<th>`/`<td>` cells keep their `rowspan`/`colspan`. Repeated copies of the
//! same table (common when a page renders desktop and mobile variants) are
//! collapsed by a SHA-256 fingerprint of their cell text.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::input::lenient_span;
use crate::{Cell, Table, collapse_ws};

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("valid selector"));

/// Parse every table in `html`, dropping exact duplicates.
pub fn parse_tables(html: &str) -> Vec<Table> {
    let doc = Html::parse_fragment(html);
    let mut seen = HashSet::new();
    let mut tables = Vec::new();

    for table_el in doc.select(&TABLE) {
        let table = read_table(&table_el);
        if table.rows.iter().all(Vec::is_empty) {
            continue;
        }
        if !seen.insert(fingerprint(&table)) {
            debug!(rows = table.rows.len(), "skipping duplicate table");
            continue;
        }
        tables.push(table);
    }

    debug!(count = tables.len(), "parsed html tables");
    tables
}

/// SHA-256 over the table's cell text, row by row.
pub fn fingerprint(table: &Table) -> String {
    let mut hasher = Sha256::new();
    for row in &table.rows {
        for cell in row {
            hasher.update(cell.text.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}

fn read_table(table_el: &ElementRef) -> Table {
    let caption = table_el
        .select(&CAPTION)
        .find(|c| owning_table(c).is_some_and(|t| t.id() == table_el.id()))
        .map(|c| collapse_ws(&c.text().collect::<Vec<_>>().join(" ")))
        .filter(|c| !c.is_empty());

    let rows = table_el
        .select(&ROW)
        .filter(|tr| owning_table(tr).is_some_and(|t| t.id() == table_el.id()))
        .map(|tr| read_row(&tr))
        .collect();

    Table { caption, rows }
}

fn read_row(tr: &ElementRef) -> Vec<Cell> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "th" | "td"))
        .filter(|el| !is_hidden(el))
        .map(|el| {
            let text = collapse_ws(&el.text().collect::<Vec<_>>().join(" "));
            let span = |name: &str| {
                el.value()
                    .attr(name)
                    .map_or(1, |v| lenient_span(&Value::from(v)))
            };
            Cell::spanned(text, span("rowspan"), span("colspan"))
        })
        .collect()
}

/// Nearest enclosing `<table>` so nested tables do not leak rows upward.
fn owning_table<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

fn is_hidden(el: &ElementRef) -> bool {
    el.value().attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none")
    })
}
