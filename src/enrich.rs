use tracing::debug;

use crate::cell::CellValue;
use crate::conversion_table::ConversionTable;
use crate::grid::{ColumnRemap, Grid, column_letter};

const MULTIPLY_BY_4: [i64; 6] = [
    11_005_101, 11_005_102, 11_005_111, 11_005_112, 11_005_107, 11_005_113,
];
const MULTIPLY_BY_3: [i64; 2] = [11_005_382, 11_005_387];
const MULTIPLY_BY_2: [i64; 2] = [11_004_140, 11_004_141];

/// Fixed column roles of a vendor order sheet, addressed before the computed
/// column is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Article ref read by the lookup (`A`).
    pub key: u32,
    /// Column overwritten with the resolved code (`C`).
    pub lookup_target: u32,
    /// Quantity the multiplier scales (`E`).
    pub source_quantity: u32,
}

impl ColumnLayout {
    /// The computed column goes immediately after the lookup target.
    #[must_use]
    pub fn computed(self) -> u32 {
        self.lookup_target + 1
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            key: 1,
            lookup_target: 3,
            source_quantity: 5,
        }
    }
}

/// Pack-size multiplier for an internal code.
#[must_use]
pub fn multiplier_for(code: Option<i64>) -> u32 {
    let Some(code) = code else {
        return 1;
    };
    if MULTIPLY_BY_4.contains(&code) {
        4
    } else if MULTIPLY_BY_3.contains(&code) {
        3
    } else if MULTIPLY_BY_2.contains(&code) {
        2
    } else {
        1
    }
}

/// Stage A: overwrites the lookup-target column of every row from
/// `start_row` down with the code resolved from the row's key cell.
/// Returns how many rows resolved to a known code.
pub fn resolve_codes(
    grid: &mut Grid,
    table: &ConversionTable,
    start_row: u32,
    layout: ColumnLayout,
) -> usize {
    let last_row = grid.max_row();
    let mut resolved = 0;
    for row in start_row..=last_row {
        let code = table.resolve(grid.value(row, layout.key));
        if !code.is_zero_sentinel() {
            resolved += 1;
        }
        grid.set_value(row, layout.lookup_target, code);
    }

    debug!(
        start_row,
        last_row,
        resolved,
        target = %column_letter(layout.lookup_target),
        "resolved lookup codes"
    );
    resolved
}

/// Stage B: inserts the computed column after the lookup target and fills it
/// with `source quantity × multiplier(code)` from `start_row` down.
pub fn insert_computed_column(
    grid: &mut Grid,
    start_row: u32,
    layout: ColumnLayout,
) -> ColumnRemap {
    let remap = grid.insert_column(layout.computed());
    let source = remap.apply(layout.source_quantity);
    let code_column = remap.apply(layout.lookup_target);

    let last_row = grid.max_row();
    for row in start_row..=last_row {
        let quantity = grid.value(row, source).as_number().unwrap_or(0.0);
        let code = grid.value(row, code_column).as_integer();
        let scaled = quantity * f64::from(multiplier_for(code));
        grid.set_value(row, layout.computed(), CellValue::Number(scaled));
    }

    debug!(
        inserted = %column_letter(layout.computed()),
        source = %column_letter(source),
        start_row,
        last_row,
        "filled computed quantity column"
    );
    remap
}
