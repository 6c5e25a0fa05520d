//! Width-aware table rendering for terminals.
//!
//! Tables are laid out in two phases. First, every column is given its
//! natural width (the widest of its header and cells, measured with ANSI
//! escape sequences stripped) and then shrunk, one unit at a time from the
//! column with the most slack, until the whole table fits the width budget
//! or no column can give up another unit. Second, each cell is word-wrapped
//! to its final column width, so narrow terminals cost extra lines rather
//! than lost text.

use console::measure_text_width;
use itertools::Itertools;
use textwrap::Options;

/// Columns are never shrunk below this width unless their own content is
/// narrower to begin with.
const MIN_COL_FLOOR: usize = 4;

/// Two spaces between adjacent columns.
const GUTTER: usize = 2;

/// Layout options for [`Table::render`].
#[derive(Debug, Default)]
pub struct TableOptions {
    max_width: Option<usize>,
    min_col_width: Option<usize>,
    min_widths: Vec<usize>,
}

impl TableOptions {
    /// Caps the total rendered width, separators included.
    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Overrides the default minimum width applied to every column.
    pub fn min_col_width(mut self, width: usize) -> Self {
        self.min_col_width = Some(width);
        self
    }

    /// Declares per-column minimum width hints, in column order. Columns
    /// beyond the end of the slice fall back to the default floor.
    pub fn min_widths(mut self, widths: &[usize]) -> Self {
        self.min_widths = widths.to_vec();
        self
    }

    fn floor_for(&self, col: usize) -> usize {
        self.min_widths
            .get(col)
            .copied()
            .or(self.min_col_width)
            .unwrap_or(MIN_COL_FLOOR)
    }
}

/// A table of headers and rows awaiting layout.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given column headers.
    pub fn new(headers: &[&str]) -> Self {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: vec![],
        }
    }

    /// Appends a row. Rows shorter than the header list are padded with
    /// empty cells; longer rows are truncated to the header count.
    pub fn push_row(&mut self, cells: Vec<String>) {
        let mut cells = cells;
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    /// True if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lays the table out and returns its display lines: a header line, a
    /// dash separator, then one or more wrapped lines per row.
    pub fn render(&self, opts: &TableOptions) -> Vec<String> {
        let widths = self.column_widths(opts);
        let mut lines = Vec::with_capacity(self.rows.len() + 2);

        lines.push(emit_line(&self.headers, &widths));
        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        lines.push(emit_line(&dashes, &widths));

        for row in &self.rows {
            let cells: Vec<Vec<String>> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| wrap_cell(cell, *width))
                .collect();
            let height = cells.iter().map(Vec::len).max().unwrap_or(1);
            for line in 0..height {
                let slice: Vec<String> = cells
                    .iter()
                    .map(|wrapped| wrapped.get(line).cloned().unwrap_or_default())
                    .collect();
                lines.push(emit_line(&slice, &widths));
            }
        }

        lines
    }

    /// Final column widths: natural widths shrunk to the budget.
    fn column_widths(&self, opts: &TableOptions) -> Vec<usize> {
        let natural = self.natural_widths();
        let minimums: Vec<usize> = natural
            .iter()
            .enumerate()
            .map(|(col, nat)| {
                let header = measure_text_width(&self.headers[col]);
                (*nat).min(header.max(opts.floor_for(col)))
            })
            .collect();

        let mut widths = natural;
        if let Some(budget) = opts.max_width {
            shrink_to_fit(&mut widths, &minimums, budget);
        }
        widths
    }

    fn natural_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                self.rows
                    .iter()
                    .map(|row| measure_text_width(&row[col]))
                    .chain([measure_text_width(header)])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

/// Removes one unit at a time from the column with the most slack until
/// the table fits `budget`, or every column is at its minimum. Best
/// effort: an unsatisfiable budget leaves all columns at their minimums.
fn shrink_to_fit(widths: &mut [usize], minimums: &[usize], budget: usize) {
    let gutters = GUTTER * widths.len().saturating_sub(1);
    loop {
        let total: usize = widths.iter().sum::<usize>() + gutters;
        if total <= budget {
            return;
        }
        let slackest = (0..widths.len())
            .max_by_key(|col| widths[*col].saturating_sub(minimums[*col]));
        match slackest {
            Some(col) if widths[col] > minimums[col] => widths[col] -= 1,
            _ => return,
        }
    }
}

/// Word-wraps a cell to `width` columns. Words longer than the column are
/// hard-split at the width boundary; an empty cell still occupies one line.
fn wrap_cell(cell: &str, width: usize) -> Vec<String> {
    if cell.is_empty() {
        return vec![String::new()];
    }
    let opts = Options::new(width.max(1)).break_words(true);
    textwrap::wrap(cell, opts)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Pads each cell to its column width and joins with the gutter. Padding
/// is computed from stripped widths, so styling never eats into it.
fn emit_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(measure_text_width(cell));
            format!("{cell}{}", " ".repeat(pad))
        })
        .join("  ")
        .trim_end()
        .to_string()
}
