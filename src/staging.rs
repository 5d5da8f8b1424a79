use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cell::CellValue;
use crate::error::ConvertError;
use crate::grid::Grid;
use crate::model::{ORDER_HEADERS, OrderRow};
use crate::workbook::write_grid;

pub const STAGING_PREFIX: &str = "spar_staging_";
pub const ORDERS_SHEET: &str = "Orders";
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Spreadsheet,
    Pdf,
}

impl InputKind {
    /// PDF when the extension says so or the file starts with the PDF magic.
    /// Anything unreadable is treated as a spreadsheet, so the workbook loader
    /// reports it.
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if by_extension || has_pdf_magic(path) {
            Self::Pdf
        } else {
            Self::Spreadsheet
        }
    }
}

fn has_pdf_magic(path: &Path) -> bool {
    let mut header = [0_u8; 5];
    File::open(path)
        .and_then(|mut file| file.read(&mut header))
        .is_ok_and(|read| header.get(..read) == Some(PDF_MAGIC))
}

/// Lays extracted order rows out as a sheet: the fixed header in row 1 and
/// one order per row from row 2.
#[must_use]
pub fn orders_to_grid(rows: &[OrderRow]) -> Grid {
    let mut grid = Grid::new(ORDERS_SHEET);
    grid.push_row(ORDER_HEADERS.map(CellValue::from));
    for row in rows {
        grid.push_row([
            CellValue::text(row.article_ref.as_str()),
            CellValue::Number(row.cases_ordered),
            CellValue::Number(row.unit_qty),
        ]);
    }
    grid
}

/// Writes the intermediate workbook for PDF input into `dir`, or the system
/// temp directory. The file is removed when the returned handle is dropped.
pub fn stage_orders(
    rows: &[OrderRow],
    dir: Option<&Path>,
) -> Result<NamedTempFile, ConvertError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX).suffix(".xlsx");
    let staged = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    write_grid(&orders_to_grid(rows), staged.path())?;
    debug!(path = %staged.path().display(), rows = rows.len(), "staged PDF orders");
    Ok(staged)
}

/// `<dir>/<stem><suffix>.xlsx`, with any staging prefix removed from the stem.
#[must_use]
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_prefix(STAGING_PREFIX).unwrap_or(&stem);
    input.with_file_name(format!("{stem}{suffix}.xlsx"))
}
