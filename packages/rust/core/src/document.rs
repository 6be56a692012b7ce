//! Input documents and how files on disk map onto them.

use std::fs;
use std::path::Path;

use certnorm_grid::input::RawTable;
use certnorm_grid::{Table, html};
use certnorm_shared::{CertnormError, Result};
use serde::Deserialize;
use serde_json::Value;

/// Everything known about one certification page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    /// Tables already split into rows and cells.
    #[serde(default)]
    pub tables: Vec<RawTable>,
    /// An HTML fragment whose `<table>` elements are parsed as well.
    #[serde(default)]
    pub html: Option<String>,
    /// Text paragraphs of the page, searched for fees when no table has them.
    #[serde(default)]
    pub paragraphs: Vec<String>,
    /// A crawler-produced schedule tree.
    #[serde(default)]
    pub schedule: Option<Value>,
    /// A crawler-produced content tree.
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default, rename = "baseYear")]
    pub base_year: Option<i32>,
}

/// Shape of an input file, decided by extension and top-level JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Html,
    /// `{ "rows": [...] }`
    Table,
    /// `[ { "rows": [...] }, ... ]`
    TableList,
    Document,
}

impl InputKind {
    fn of_json(value: &Value) -> Self {
        match value {
            Value::Array(_) => InputKind::TableList,
            Value::Object(map) if map.contains_key("rows") => InputKind::Table,
            _ => InputKind::Document,
        }
    }
}

impl Document {
    /// Every table of the document in order: structured tables first, then
    /// those found in the HTML fragment.
    pub fn all_tables(&self) -> Vec<Table> {
        let mut tables: Vec<Table> = self.tables.iter().cloned().map(Table::from).collect();
        if let Some(fragment) = &self.html {
            tables.extend(html::parse_tables(fragment));
        }
        tables
    }

    /// Build a document from raw file content.
    pub fn from_content(content: &str, is_html: bool) -> Result<(Self, InputKind)> {
        if is_html {
            let doc = Document {
                html: Some(content.to_string()),
                ..Document::default()
            };
            return Ok((doc, InputKind::Html));
        }

        let value: Value = serde_json::from_str(content)
            .map_err(|e| CertnormError::parse(format!("invalid JSON: {e}")))?;
        let kind = InputKind::of_json(&value);
        let doc = match kind {
            InputKind::Table => Document {
                tables: vec![
                    serde_json::from_value(value)
                        .map_err(|e| CertnormError::parse(format!("invalid table: {e}")))?,
                ],
                ..Document::default()
            },
            InputKind::TableList => Document {
                tables: serde_json::from_value(value)
                    .map_err(|e| CertnormError::parse(format!("invalid table list: {e}")))?,
                ..Document::default()
            },
            _ => serde_json::from_value(value)
                .map_err(|e| CertnormError::parse(format!("invalid document: {e}")))?,
        };
        Ok((doc, kind))
    }

    /// Read a document from disk. `.html`/`.htm` files are HTML fragments;
    /// anything else is JSON.
    pub fn from_path(path: &Path) -> Result<(Self, InputKind)> {
        let content = fs::read_to_string(path).map_err(|e| CertnormError::io(path, e))?;
        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        Self::from_content(&content, is_html)
    }
}
