//! # CSV Codec
//!
//! Minimal comma-separated reader and writer used by bulk import and export.
//!
//! Reader rules:
//! - Cells are separated by `,`; rows by `\n` or `\r\n`.
//! - A cell starting with `"` is quoted: `""` inside it is a literal quote,
//!   and separators or line breaks inside quotes belong to the cell.
//! - Rows consisting of a single blank cell are skipped.
//!
//! The writer quotes every cell.

/// One parsed row and the 1-based line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub cells: Vec<String>,
}

impl CsvRow {
    /// Trimmed cell at `idx`, or `""` past the end of the row.
    #[must_use]
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|c| c.trim()).unwrap_or("")
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Split `text` into rows of cells.
#[must_use]
pub fn parse(text: &str) -> Vec<CsvRow> {
    let mut rows = Vec::new();
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut at_cell_start = true;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    cell.push('\n');
                }
                _ => cell.push(c),
            }
            continue;
        }

        match c {
            '"' if at_cell_start => {
                in_quotes = true;
                at_cell_start = false;
            }
            ',' => {
                cells.push(std::mem::take(&mut cell));
                at_cell_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                cells.push(std::mem::take(&mut cell));
                push_row(&mut rows, row_line, std::mem::take(&mut cells));
                line += 1;
                row_line = line;
                at_cell_start = true;
            }
            _ => {
                cell.push(c);
                at_cell_start = false;
            }
        }
    }

    if !cell.is_empty() || !cells.is_empty() {
        cells.push(cell);
        push_row(&mut rows, row_line, cells);
    }
    rows
}

fn push_row(rows: &mut Vec<CsvRow>, line: usize, cells: Vec<String>) {
    let row = CsvRow { line, cells };
    if !row.is_blank() {
        rows.push(row);
    }
}

/// Wrap `value` in double quotes, doubling embedded quotes.
#[must_use]
pub fn quote_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// One fully quoted row, newline-terminated.
#[must_use]
pub fn write_row<S: AsRef<str>>(cells: &[S]) -> String {
    let mut out = cells
        .iter()
        .map(|c| quote_cell(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    out
}
