use crate::model::{DetectedTable, PageText};
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};

/// A run of consecutive multi-cell lines must be at least this long to count
/// as a table.
const MIN_TABLE_ROWS: usize = 2;
const MAX_SOFT_TEXT_CELLS: usize = 6;

fn looks_like_sentence(line: &str) -> bool {
    ['.', '!', '?']
        .iter()
        .any(|punctuation| line.trim_end().ends_with(*punctuation))
}

/// Cells of one line, or `None` when the line cannot be part of a table.
fn table_cells(line: &str, min_cols: usize) -> Option<Vec<String>> {
    let cells = split_line_into_cells(line);
    if cells.len() >= min_cols {
        return Some(cells);
    }

    let soft_cells = soft_split_line_into_cells(line);
    let has_numeric = soft_cells
        .iter()
        .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()));
    let usable = soft_cells.len() >= min_cols
        && !looks_like_sentence(line)
        && (has_numeric || soft_cells.len() <= MAX_SOFT_TEXT_CELLS);
    usable.then_some(soft_cells)
}

/// Groups consecutive table-like lines of a page into tables, in reading
/// order.
pub(crate) fn detect_tables_in_page(page: &PageText, min_cols: usize) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();

    let flush_current = |rows: &mut Vec<Vec<String>>, tables: &mut Vec<DetectedTable>| {
        if rows.len() >= MIN_TABLE_ROWS {
            tables.push(DetectedTable {
                page: page.page_number,
                rows: std::mem::take(rows),
            });
        } else {
            rows.clear();
        }
    };

    for line in page.text.lines() {
        match table_cells(line, min_cols) {
            Some(cells) => current_rows.push(cells),
            None => flush_current(&mut current_rows, &mut tables),
        }
    }

    flush_current(&mut current_rows, &mut tables);
    tables
}
