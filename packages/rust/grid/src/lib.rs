//! Logical grid reconstruction for spanned table cells.
//!
//! HTML tables describe a cell once and let `rowspan`/`colspan` stretch it
//! over neighbouring slots. [`Grid::build`] resolves that into a rectangular
//! coordinate space where every slot points back at the cell that owns it.
//!
//! Table input arrives either as JSON ([`input`]) or as an HTML fragment
//! ([`html`]); both produce a [`Table`].

pub mod html;
pub mod input;

use std::collections::BTreeMap;

use tracing::debug;

/// Upper bound for a single span. Larger values are treated as malformed markup.
pub const MAX_SPAN: usize = 1000;

// ---------------------------------------------------------------------------
// Cell / Table
// ---------------------------------------------------------------------------

/// An input cell before placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub row_span: usize,
    pub col_span: usize,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self::spanned(text, 1, 1)
    }

    /// Spans of zero are clamped to 1 and oversized spans to [`MAX_SPAN`].
    pub fn spanned(text: impl Into<String>, row_span: usize, col_span: usize) -> Self {
        Self {
            text: text.into(),
            row_span: row_span.clamp(1, MAX_SPAN),
            col_span: col_span.clamp(1, MAX_SPAN),
        }
    }
}

/// A table as handed to the normalizer: optional caption plus rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub caption: Option<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn grid(&self) -> Grid {
        Grid::build(&self.rows)
    }
}

/// Collapse runs of whitespace (including NBSP) into single spaces and trim.
pub fn collapse_ws(text: &str) -> String {
    text.replace('\u{200b}', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A cell after placement, remembering where its footprint starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCell {
    pub text: String,
    pub origin_row: usize,
    pub origin_col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

/// Rectangular logical grid. Slots hold indices into the cell arena.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    cells: Vec<PlacedCell>,
    slots: Vec<Vec<Option<usize>>>,
}

impl Grid {
    /// Place `rows` of spanned cells. Overlapping footprints resolve by last
    /// write; every overwrite is logged at debug level.
    pub fn build(rows: &[Vec<Cell>]) -> Self {
        let mut cells: Vec<PlacedCell> = Vec::new();
        let mut slots: Vec<Vec<Option<usize>>> = Vec::new();

        for (r, row) in rows.iter().enumerate() {
            if slots.len() <= r {
                slots.resize_with(r + 1, Vec::new);
            }
            let mut c = 0;
            for cell in row {
                while slots[r].get(c).is_some_and(Option::is_some) {
                    c += 1;
                }
                let row_span = cell.row_span.clamp(1, MAX_SPAN);
                let col_span = cell.col_span.clamp(1, MAX_SPAN);
                let idx = cells.len();
                cells.push(PlacedCell {
                    text: cell.text.clone(),
                    origin_row: r,
                    origin_col: c,
                    row_span,
                    col_span,
                });

                for rr in r..r + row_span {
                    if slots.len() <= rr {
                        slots.resize_with(rr + 1, Vec::new);
                    }
                    let slot_row = &mut slots[rr];
                    if slot_row.len() < c + col_span {
                        slot_row.resize(c + col_span, None);
                    }
                    for cc in c..c + col_span {
                        if let Some(prev) = slot_row[cc].replace(idx) {
                            debug!(
                                row = rr,
                                col = cc,
                                lost = %cells[prev].text,
                                "overlapping span overwrote cell"
                            );
                        }
                    }
                }
                c += col_span;
            }
        }

        let width = slots.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut slots {
            row.resize(width, None);
        }

        Self { cells, slots }
    }

    pub fn height(&self) -> usize {
        self.slots.len()
    }

    pub fn width(&self) -> usize {
        self.slots.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// The cell covering `(r, c)`, if any.
    pub fn get(&self, r: usize, c: usize) -> Option<&PlacedCell> {
        let idx = (*self.slots.get(r)?.get(c)?)?;
        self.cells.get(idx)
    }

    /// Every placed cell in document order.
    pub fn cells(&self) -> &[PlacedCell] {
        &self.cells
    }

    /// Coordinate → owning cell for every occupied slot.
    pub fn cell_index(&self) -> BTreeMap<(usize, usize), &PlacedCell> {
        let mut index = BTreeMap::new();
        for (r, row) in self.slots.iter().enumerate() {
            for (c, slot) in row.iter().enumerate() {
                if let Some(cell) = slot.and_then(|i| self.cells.get(i)) {
                    index.insert((r, c), cell);
                }
            }
        }
        index
    }

    /// Owning text for each column of row `r`. Row spans repeat their text in
    /// every covered row; unoccupied slots yield an empty string.
    pub fn row_texts(&self, r: usize) -> Vec<String> {
        (0..self.width())
            .map(|c| self.get(r, c).map(|cell| cell.text.clone()).unwrap_or_default())
            .collect()
    }

    /// Whether `(r, c)` is the top-left slot of its cell.
    pub fn is_origin(&self, r: usize, c: usize) -> bool {
        self.get(r, c)
            .is_some_and(|cell| cell.origin_row == r && cell.origin_col == c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(grid: &Grid) -> Vec<Vec<String>> {
        (0..grid.height()).map(|r| grid.row_texts(r)).collect()
    }

    #[test]
    fn rowspan_threads_text_through_covered_rows() {
        let rows = vec![
            vec![Cell::new("회차"), Cell::new("구분"), Cell::new("접수")],
            vec![Cell::spanned("제1회", 2, 1), Cell::new("필기"), Cell::new("01.13~01.16")],
            vec![Cell::new("실기"), Cell::new("03.24~03.27")],
        ];
        let grid = Grid::build(&rows);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(texts(&grid)[2], vec!["제1회", "실기", "03.24~03.27"]);
        assert!(grid.is_origin(1, 0));
        assert!(!grid.is_origin(2, 0));
    }

    #[test]
    fn colspan_fills_adjacent_columns() {
        let rows = vec![
            vec![Cell::new("회차"), Cell::spanned("필기", 1, 2)],
            vec![Cell::new("제1회"), Cell::new("a"), Cell::new("b")],
        ];
        let grid = Grid::build(&rows);
        assert_eq!(grid.row_texts(0), vec!["회차", "필기", "필기"]);
        assert_eq!(grid.get(0, 2).map(|c| c.origin_col), Some(1));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let rows = vec![vec![Cell::new("a")], vec![Cell::new("b"), Cell::new("c"), Cell::new("d")]];
        let grid = Grid::build(&rows);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.row_texts(0), vec!["a", "", ""]);
        assert!(grid.get(0, 2).is_none());
    }

    #[test]
    fn zero_span_is_clamped() {
        let cell = Cell::spanned("x", 0, 0);
        assert_eq!((cell.row_span, cell.col_span), (1, 1));
    }

    #[test]
    fn overlapping_spans_last_write_wins() {
        let rows = vec![
            vec![Cell::spanned("A", 2, 1), Cell::spanned("B", 2, 1)],
            vec![Cell::spanned("C", 1, 1)],
        ];
        let grid = Grid::build(&rows);
        // The cursor skips slots already claimed from above.
        assert_eq!(grid.row_texts(1), vec!["A", "B", "C"]);

        let clash = vec![
            vec![Cell::new("x"), Cell::spanned("tall", 2, 1)],
            vec![Cell::spanned("wide", 1, 3)],
        ];
        let grid = Grid::build(&clash);
        assert_eq!(grid.row_texts(1), vec!["wide", "wide", "wide"]);
    }

    #[test]
    fn rowspan_past_last_row_extends_grid() {
        let rows = vec![vec![Cell::spanned("상시", 3, 1), Cell::new("x")]];
        let grid = Grid::build(&rows);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.row_texts(2), vec!["상시", ""]);
    }

    #[test]
    fn cell_index_covers_every_occupied_slot() {
        let rows = vec![vec![Cell::spanned("a", 2, 2)], vec![]];
        let grid = Grid::build(&rows);
        let index = grid.cell_index();
        assert_eq!(index.len(), 4);
        assert!(index.values().all(|c| c.text == "a"));
    }

    #[test]
    fn empty_input_gives_empty_grid() {
        let grid = Grid::build(&[]);
        assert!(grid.is_empty());
        assert!(grid.row_texts(0).is_empty());
    }

    #[test]
    fn collapse_ws_normalizes_nbsp() {
        assert_eq!(collapse_ws("  01.13\u{00a0}~\n 01.16 "), "01.13 ~ 01.16");
    }

    fn arb_rows() -> impl Strategy<Value = Vec<Vec<Cell>>> {
        let cell = (0usize..4, 0usize..4).prop_map(|(r, c)| Cell::spanned("v", r, c));
        proptest::collection::vec(proptest::collection::vec(cell, 0..5), 0..6)
    }

    proptest! {
        #[test]
        fn grid_is_rectangular(rows in arb_rows()) {
            let grid = Grid::build(&rows);
            let width = grid.width();
            for r in 0..grid.height() {
                prop_assert_eq!(grid.row_texts(r).len(), width);
            }
        }

        #[test]
        fn footprints_point_at_their_origin(rows in arb_rows()) {
            let grid = Grid::build(&rows);
            for ((r, c), cell) in grid.cell_index() {
                prop_assert!(r >= cell.origin_row && r < cell.origin_row + cell.row_span);
                prop_assert!(c >= cell.origin_col && c < cell.origin_col + cell.col_span);
            }
        }

        #[test]
        fn every_input_row_is_kept(rows in arb_rows()) {
            let grid = Grid::build(&rows);
            prop_assert!(grid.height() >= rows.len());
        }
    }
}
