use tracing::debug;

use crate::cell::CellValue;
use crate::grid::Grid;
use crate::options::MergePolicy;

pub const ROW_HEIGHT: f64 = 15.0;
pub const WIDTH_PADDING: usize = 2;
pub const WIDTH_SCALE: f64 = 1.2;

/// Flattens the sheet layout: dissolves merges, turns wrapping off, and sets
/// uniform row heights and content-fitted column widths. Running it twice
/// leaves the grid unchanged.
pub fn normalize(grid: &mut Grid, policy: MergePolicy) {
    let dissolved = dissolve_merges(grid, policy);
    let unwrapped = clear_wrap_text(grid);
    autosize(grid);
    debug!(dissolved, unwrapped, ?policy, "normalized grid layout");
}

/// Row heights and column widths only; used again once the final column set
/// is known.
pub fn autosize(grid: &mut Grid) {
    for row in 1..=grid.max_row() {
        grid.set_row_height(row, ROW_HEIGHT);
    }
    for col in 1..=grid.max_column() {
        let width = fitted_width(grid, col);
        grid.set_column_width(col, width);
    }
}

#[must_use]
pub fn fitted_width(grid: &Grid, col: u32) -> f64 {
    let longest = grid
        .rows()
        .filter_map(|row| {
            let index = usize::try_from(col.checked_sub(1)?).ok()?;
            row.cells.get(index)
        })
        .map(|cell| cell.value.display_len())
        .max()
        .unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let padded = (longest + WIDTH_PADDING) as f64;
    padded * WIDTH_SCALE
}

fn dissolve_merges(grid: &mut Grid, policy: MergePolicy) -> usize {
    let regions = grid.take_merged_regions();
    for region in &regions {
        let anchor = grid.value(region.first_row, region.first_col).clone();
        for row in region.first_row..=region.last_row {
            for col in region.first_col..=region.last_col {
                if (row, col) == (region.first_row, region.first_col) {
                    continue;
                }
                match policy {
                    MergePolicy::Propagate => grid.set_value(row, col, anchor.clone()),
                    MergePolicy::Clear => {
                        if grid.cell(row, col).is_some() {
                            grid.set_value(row, col, CellValue::Empty);
                        }
                    }
                }
            }
        }
        debug!(region = %region, "dissolved merged region");
    }
    regions.len()
}

fn clear_wrap_text(grid: &mut Grid) -> usize {
    let mut cleared = 0;
    for row in grid.rows_mut() {
        for cell in &mut row.cells {
            if cell.wrap_text {
                cell.wrap_text = false;
                cleared += 1;
            }
        }
    }
    cleared
}
