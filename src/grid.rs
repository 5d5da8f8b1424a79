use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::cell::CellValue;

static EMPTY: CellValue = CellValue::Empty;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub wrap_text: bool,
}

impl Cell {
    #[must_use]
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            wrap_text: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub height: Option<f64>,
}

/// Rectangular merged span, 1-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl MergedRegion {
    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

impl Display for MergedRegion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letter(self.first_col),
            self.first_row,
            column_letter(self.last_col),
            self.last_row
        )
    }
}

impl FromStr for MergedRegion {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (start, end) = spec
            .split_once(':')
            .ok_or_else(|| format!("invalid range '{spec}', expected A1:B2"))?;
        let (first_row, first_col) = parse_cell_ref(start)?;
        let (last_row, last_col) = parse_cell_ref(end)?;
        if last_row < first_row || last_col < first_col {
            return Err(format!("invalid range '{spec}': end precedes start"));
        }

        Ok(Self {
            first_row,
            first_col,
            last_row,
            last_col,
        })
    }
}

/// Converts a 1-based column index into its spreadsheet letters (1 → `A`).
#[must_use]
pub fn column_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Converts column letters into a 1-based column index (`A` → 1).
#[must_use]
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    letters.chars().try_fold(0_u32, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(ch.to_ascii_uppercase()) - u32::from('A') + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// Parses an `A1` style reference into `(row, col)`, both 1-based.
pub fn parse_cell_ref(reference: &str) -> Result<(u32, u32), String> {
    let reference = reference.trim().replace('$', "");
    let split = reference
        .find(|ch: char| ch.is_ascii_digit())
        .ok_or_else(|| format!("invalid cell reference '{reference}'"))?;
    let (letters, digits) = reference.split_at(split);
    let col = column_index(letters)
        .ok_or_else(|| format!("invalid column in cell reference '{reference}'"))?;
    let row: u32 = digits
        .parse()
        .map_err(|_| format!("invalid row in cell reference '{reference}'"))?;
    if row == 0 {
        return Err("rows are 1-based".to_string());
    }
    Ok((row, col))
}

/// Index translation produced by a single column insertion. Columns at or
/// after `inserted_at` move one position to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRemap {
    pub inserted_at: u32,
}

impl ColumnRemap {
    #[must_use]
    pub fn apply(self, col: u32) -> u32 {
        if col >= self.inserted_at { col + 1 } else { col }
    }
}

/// In-memory worksheet: rows of cells addressed 1-based, plus the layout
/// attributes the converter touches (wrap, row height, column width, merges).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    sheet_name: String,
    rows: Vec<Row>,
    column_widths: Vec<Option<f64>>,
    merged_regions: Vec<MergedRegion>,
}

impl Grid {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Self::default()
        }
    }

    pub fn from_values<I, R>(sheet_name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = CellValue>,
    {
        let mut grid = Self::new(sheet_name);
        grid.rows = rows
            .into_iter()
            .map(|values| Row {
                cells: values.into_iter().map(Cell::new).collect(),
                height: None,
            })
            .collect();
        grid
    }

    #[must_use]
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    #[must_use]
    pub fn max_row(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn max_column(&self) -> u32 {
        let widest = self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
        u32::try_from(widest).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.row(row)?.cells.get(index(col)?)
    }

    /// Value at `(row, col)`, `Empty` for anything outside the used area.
    #[must_use]
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        self.cell(row, col).map_or(&EMPTY, |cell| &cell.value)
    }

    #[must_use]
    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(index(row)?)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut()
    }

    /// Mutable access to a cell, growing the grid so the address exists.
    /// `None` for a zero row or column, which addresses nothing.
    pub fn cell_mut(&mut self, row: u32, col: u32) -> Option<&mut Cell> {
        let row_index = index(row)?;
        let col_index = index(col)?;
        if self.rows.len() <= row_index {
            self.rows.resize_with(row_index + 1, Row::default);
        }
        let cells = &mut self.rows.get_mut(row_index)?.cells;
        if cells.len() <= col_index {
            cells.resize_with(col_index + 1, Cell::default);
        }
        cells.get_mut(col_index)
    }

    /// Ignored for a zero row or column.
    pub fn set_value(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        if let Some(cell) = self.cell_mut(row, col) {
            cell.value = value.into();
        }
    }

    pub fn push_row(&mut self, values: impl IntoIterator<Item = CellValue>) {
        self.rows.push(Row {
            cells: values.into_iter().map(Cell::new).collect(),
            height: None,
        });
    }

    /// Inserts one empty column at `at`, shifting `at..` right by one.
    pub fn insert_column(&mut self, at: u32) -> ColumnRemap {
        let at_index = index(at).unwrap_or(0);
        for row in &mut self.rows {
            if row.cells.len() > at_index {
                row.cells.insert(at_index, Cell::default());
            }
        }
        if self.column_widths.len() > at_index {
            self.column_widths.insert(at_index, None);
        }

        let remap = ColumnRemap { inserted_at: at };
        for region in &mut self.merged_regions {
            region.first_col = remap.apply(region.first_col);
            region.last_col = remap.apply(region.last_col);
        }
        remap
    }

    /// Removes `row`, moving every row below it up by one.
    pub fn delete_row(&mut self, row: u32) -> bool {
        let Some(row_index) = index(row).filter(|&i| i < self.rows.len()) else {
            return false;
        };
        self.rows.remove(row_index);
        self.merged_regions.retain_mut(|region| {
            if region.first_row == row && region.last_row == row {
                return false;
            }
            if region.first_row > row {
                region.first_row -= 1;
            }
            if region.last_row >= row {
                region.last_row -= 1;
            }
            true
        });
        true
    }

    #[must_use]
    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row(row).and_then(|row| row.height)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        if let Some(row) = index(row).and_then(|i| self.rows.get_mut(i)) {
            row.height = Some(height);
        }
    }

    #[must_use]
    pub fn column_width(&self, col: u32) -> Option<f64> {
        index(col)
            .and_then(|i| self.column_widths.get(i).copied())
            .flatten()
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        let Some(col_index) = index(col) else {
            return;
        };
        if self.column_widths.len() <= col_index {
            self.column_widths.resize(col_index + 1, None);
        }
        self.column_widths[col_index] = Some(width);
    }

    #[must_use]
    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged_regions
    }

    pub fn add_merged_region(&mut self, region: MergedRegion) {
        self.merged_regions.push(region);
    }

    pub fn take_merged_regions(&mut self) -> Vec<MergedRegion> {
        std::mem::take(&mut self.merged_regions)
    }
}

fn index(one_based: u32) -> Option<usize> {
    one_based
        .checked_sub(1)
        .and_then(|value| usize::try_from(value).ok())
}
