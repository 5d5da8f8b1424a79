use tracing::debug;

use crate::grid::Grid;

/// Rows from `start_row` down whose `column` holds the zero sentinel.
#[must_use]
pub fn zero_rows(grid: &Grid, start_row: u32, column: u32) -> Vec<u32> {
    (start_row..=grid.max_row())
        .filter(|&row| grid.value(row, column).is_zero_sentinel())
        .collect()
}

/// Deletes `rows` from the bottom up so earlier deletions never shift a row
/// that is still waiting to be removed.
pub fn delete_rows_descending(grid: &mut Grid, rows: &[u32]) -> usize {
    let mut ordered = rows.to_vec();
    ordered.sort_unstable_by(|left, right| right.cmp(left));
    ordered.dedup();
    ordered
        .into_iter()
        .filter(|&row| grid.delete_row(row))
        .count()
}

/// Removes every row at or below `start_row` whose lookup-target column is
/// zero, returning how many were removed.
pub fn delete_zero_rows(grid: &mut Grid, start_row: u32, column: u32) -> usize {
    let marked = zero_rows(grid, start_row, column);
    let deleted = delete_rows_descending(grid, &marked);
    debug!(start_row, deleted, remaining = grid.max_row(), "deleted zero-code rows");
    deleted
}
