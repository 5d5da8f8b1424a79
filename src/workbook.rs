use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Dimensions, Reader, Xlsx, open_workbook};
use chrono::{NaiveDate, TimeDelta};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, XlsxError};
use tracing::debug;

use crate::cell::CellValue;
use crate::error::ConvertError;
use crate::grid::{Grid, MergedRegion};

const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Which worksheet to read from a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSelector<'a> {
    First,
    Named(&'a str),
}

/// Reads one worksheet into a [`Grid`], merged regions included.
pub fn read_sheet(path: &Path, selector: SheetSelector<'_>) -> Result<Grid, ConvertError> {
    let load_error = |source| ConvertError::Load {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook: Xlsx<BufReader<File>> = open_workbook(path).map_err(load_error)?;
    let name = match selector {
        SheetSelector::Named(name) => name.to_string(),
        SheetSelector::First => workbook
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| ConvertError::EmptyWorkbook {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook.worksheet_range(&name).map_err(load_error)?;
    workbook.load_merged_regions().map_err(load_error)?;
    let merges = workbook
        .worksheet_merge_cells(&name)
        .unwrap_or(Ok(Vec::new()))
        .map_err(load_error)?;

    let mut grid = Grid::new(name);
    if let Some((start_row, start_col)) = range.start() {
        for (row, col, data) in range.cells() {
            let value = cell_value(data);
            if value.is_empty() {
                continue;
            }
            grid.set_value(offset(start_row, row) + 1, offset(start_col, col) + 1, value);
        }
    }
    for dimensions in &merges {
        grid.add_merged_region(merged_region(dimensions));
    }

    debug!(
        path = %path.display(),
        sheet = grid.sheet_name(),
        rows = grid.max_row(),
        columns = grid.max_column(),
        merged = grid.merged_regions().len(),
        "loaded worksheet"
    );

    Ok(grid)
}

fn offset(base: u32, relative: usize) -> u32 {
    base.saturating_add(u32::try_from(relative).unwrap_or(u32::MAX))
}

fn merged_region(dimensions: &Dimensions) -> MergedRegion {
    MergedRegion {
        first_row: dimensions.start.0 + 1,
        first_col: dimensions.start.1 + 1,
        last_row: dimensions.end.0 + 1,
        last_col: dimensions.end.1 + 1,
    }
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            CellValue::text(text.as_str())
        }
        #[allow(clippy::cast_precision_loss)]
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::Bool(value) => CellValue::text(if *value { "TRUE" } else { "FALSE" }),
        Data::DateTime(value) => {
            let serial = value.as_f64();
            if value.is_datetime() {
                excel_serial_to_text(serial).map_or(CellValue::Number(serial), CellValue::Text)
            } else {
                CellValue::Number(serial)
            }
        }
        Data::Error(error) => CellValue::text(error.to_string()),
    }
}

/// Renders an Excel 1900-system serial date the way a cell displays it.
fn excel_serial_to_text(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    #[allow(clippy::cast_possible_truncation)]
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    let moment = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    Some(moment.format(DATE_DISPLAY_FORMAT).to_string())
}

/// Writes `grid` as a single-sheet `.xlsx` workbook.
pub fn write_grid(grid: &Grid, path: &Path) -> Result<(), ConvertError> {
    let save_error = |source| ConvertError::Save {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    populate_worksheet(&mut workbook, grid).map_err(save_error)?;
    workbook.save(path).map_err(save_error)?;

    debug!(
        path = %path.display(),
        rows = grid.max_row(),
        columns = grid.max_column(),
        "saved workbook"
    );
    Ok(())
}

fn populate_worksheet(workbook: &mut Workbook, grid: &Grid) -> Result<(), XlsxError> {
    let worksheet = workbook.add_worksheet();
    if !grid.sheet_name().is_empty() {
        worksheet.set_name(grid.sheet_name())?;
    }

    let plain = Format::new();
    let wrapped = Format::new().set_text_wrap();

    for region in grid.merged_regions() {
        worksheet.merge_range(
            row_num(region.first_row)?,
            col_num(region.first_col)?,
            row_num(region.last_row)?,
            col_num(region.last_col)?,
            "",
            &plain,
        )?;
    }

    for (row, data) in (1_u32..).zip(grid.rows()) {
        let row_number = row_num(row)?;
        if let Some(height) = data.height {
            worksheet.set_row_height(row_number, height)?;
        }

        for (col, cell) in (1_u32..).zip(&data.cells) {
            if hidden_by_merge(grid, row, col) {
                continue;
            }
            let col_number = col_num(col)?;
            let format = if cell.wrap_text { &wrapped } else { &plain };
            match &cell.value {
                CellValue::Empty if cell.wrap_text => {
                    worksheet.write_blank(row_number, col_number, format)?;
                }
                CellValue::Empty => {}
                CellValue::Text(text) => {
                    worksheet.write_string_with_format(row_number, col_number, text, format)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number_with_format(row_number, col_number, *value, format)?;
                }
            }
        }
    }

    for col in 1..=grid.max_column() {
        if let Some(width) = grid.column_width(col) {
            worksheet.set_column_width(col_num(col)?, width)?;
        }
    }

    Ok(())
}

fn hidden_by_merge(grid: &Grid, row: u32, col: u32) -> bool {
    grid.merged_regions().iter().any(|region| {
        region.contains(row, col) && (row, col) != (region.first_row, region.first_col)
    })
}

fn row_num(row: u32) -> Result<RowNum, XlsxError> {
    row.checked_sub(1).ok_or(XlsxError::RowColumnLimitError)
}

fn col_num(col: u32) -> Result<ColNum, XlsxError> {
    col.checked_sub(1)
        .and_then(|col| ColNum::try_from(col).ok())
        .ok_or(XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::{SheetSelector, excel_serial_to_text, read_sheet, write_grid};
    use crate::cell::CellValue;
    use crate::grid::{Grid, MergedRegion};

    #[test]
    fn renders_excel_serial_dates() {
        assert_eq!(
            excel_serial_to_text(45_292.5).as_deref(),
            Some("2024-01-01 12:00:00")
        );
        assert_eq!(excel_serial_to_text(-1.0), None);
    }

    #[test]
    fn written_grid_reads_back_with_values_and_merges() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("round.xlsx");

        let mut grid = Grid::new("Orders");
        grid.set_value(1, 1, "Title");
        grid.set_value(2, 1, 101_i64);
        grid.set_value(2, 3, CellValue::text("12,5"));
        grid.add_merged_region(MergedRegion {
            first_row: 1,
            first_col: 1,
            last_row: 1,
            last_col: 3,
        });
        grid.set_column_width(1, 14.4);

        write_grid(&grid, &path).expect("workbook should be written");
        let loaded = read_sheet(&path, SheetSelector::First).expect("workbook should load");

        assert_eq!(loaded.sheet_name(), "Orders");
        assert_eq!(loaded.value(1, 1), &CellValue::text("Title"));
        assert_eq!(loaded.value(2, 1), &CellValue::Number(101.0));
        assert_eq!(loaded.value(2, 3), &CellValue::text("12,5"));
        assert_eq!(loaded.merged_regions(), grid.merged_regions());
    }

    #[test]
    fn missing_named_sheet_is_a_load_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("named.xlsx");
        write_grid(&Grid::new("Other"), &path).expect("workbook should be written");

        let err = read_sheet(&path, SheetSelector::Named("Sheet1"))
            .expect_err("missing sheet should fail");
        assert!(matches!(err, crate::ConvertError::Load { .. }));
    }
}
