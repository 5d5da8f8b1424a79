mod cell;
mod conversion_table;
mod csv_out;
mod enrich;
mod error;
mod extract;
mod filter;
mod grid;
mod model;
mod normalize;
mod options;
mod pdf_reader;
mod pipeline;
mod staging;
mod table_detect;
mod table_parse;
mod warning;
mod workbook;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::pdf_reader::{read_pdf_pages, read_pdf_pages_from_bytes};
use crate::staging::stage_orders;

pub use cell::CellValue;
pub use conversion_table::ConversionTable;
pub use enrich::{ColumnLayout, multiplier_for};
pub use error::ConvertError;
pub use extract::{ExtractionReport, ExtractionTier, OrderRows};
pub use filter::{delete_rows_descending, delete_zero_rows, zero_rows};
pub use grid::{Cell, ColumnRemap, Grid, MergedRegion, Row, column_index, column_letter};
pub use model::{ORDER_HEADERS, OrderRow, PageText};
pub use normalize::{autosize, normalize};
pub use options::{
    ArticleRefRule, ConvertOptions, DEFAULT_OUTPUT_SUFFIX, DEFAULT_PDF_START_ROW,
    DEFAULT_SHEET_START_ROW, ExtractOptions, MergePolicy,
};
pub use pipeline::{
    ConversionPipeline, ConversionReport, InputSource, PipelineOutcome, PipelineStage,
};
pub use staging::{InputKind, STAGING_PREFIX, derive_output_path, orders_to_grid};
pub use warning::{ExtractWarning, WarningCode};
pub use workbook::{SheetSelector, read_sheet, write_grid};

fn output_path(input: &Path, options: &ConvertOptions) -> PathBuf {
    options
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(input, &options.output_suffix))
}

fn run_pipeline(
    grid: Grid,
    table: &ConversionTable,
    start_row: u32,
    options: &ConvertOptions,
    output: &Path,
) -> Result<PipelineOutcome, ConvertError> {
    ConversionPipeline::new(grid, table, start_row)
        .with_merge_policy(options.merge_policy)
        .run(|grid| write_grid(grid, output))
}

/// Loads the reference table and converts `input`, routing PDFs through
/// extraction first.
pub fn convert(
    table_path: &Path,
    input: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    let table = ConversionTable::load(table_path)?;
    match InputKind::detect(input) {
        InputKind::Spreadsheet => convert_workbook(&table, input, options),
        InputKind::Pdf => convert_pdf(&table, input, options),
    }
}

/// Converts the first sheet of a vendor spreadsheet.
pub fn convert_workbook(
    table: &ConversionTable,
    input: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    let grid = read_sheet(input, SheetSelector::First)?;
    let start_row = options.start_row.unwrap_or(DEFAULT_SHEET_START_ROW);
    let output = output_path(input, options);

    let outcome = run_pipeline(grid, table, start_row, options, &output)?;
    info!(input = %input.display(), output = %output.display(), "converted spreadsheet");
    Ok(ConversionReport::new(
        input.to_path_buf(),
        output,
        InputSource::Spreadsheet,
        &outcome,
    ))
}

/// Extracts order rows from a PDF, stages them as a spreadsheet and converts
/// that. The staged file is removed whether or not the conversion succeeds.
pub fn convert_pdf(
    table: &ConversionTable,
    input: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    let (rows, extraction) = extract_pdf_orders(input, &options.extract)?;
    let staged = stage_orders(&rows, options.staging_dir.as_deref())?;
    let grid = read_sheet(staged.path(), SheetSelector::First)?;
    let start_row = options.start_row.unwrap_or(DEFAULT_PDF_START_ROW);
    let output = output_path(input, options);

    let outcome = run_pipeline(grid, table, start_row, options, &output)?;
    staged.close()?;
    info!(
        input = %input.display(),
        output = %output.display(),
        extracted_rows = rows.len(),
        "converted PDF order"
    );
    Ok(ConversionReport::new(
        input.to_path_buf(),
        output,
        InputSource::Pdf {
            extracted_rows: rows.len(),
            extraction,
        },
        &outcome,
    ))
}

/// Lazy order-row stream over a PDF file. Page text is recovered up front;
/// rows are extracted as the stream is pulled.
pub fn open_order_rows(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<OrderRows, ConvertError> {
    let pages = read_pdf_pages(input_pdf)?;
    Ok(OrderRows::new(pages, options.clone()))
}

pub fn extract_pdf_orders(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<(Vec<OrderRow>, ExtractionReport), ConvertError> {
    open_order_rows(input_pdf, options)?.collect_rows()
}

pub fn extract_pdf_bytes_orders(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(Vec<OrderRow>, ExtractionReport), ConvertError> {
    let pages = read_pdf_pages_from_bytes(input_pdf)?;
    OrderRows::new(pages, options.clone()).collect_rows()
}

pub fn extract_pdf_to_csv(
    input_pdf: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
    delimiter: u8,
) -> Result<ExtractionReport, ConvertError> {
    let (rows, report) = extract_pdf_orders(input_pdf, options)?;
    write_csv(output_csv, &rows, delimiter)?;
    Ok(report)
}

pub fn extract_pdf_bytes_to_csv_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
    delimiter: u8,
) -> Result<(String, ExtractionReport), ConvertError> {
    let (rows, report) = extract_pdf_bytes_orders(input_pdf, options)?;
    let csv = write_csv_to_string(&rows, delimiter)?;
    Ok((csv, report))
}
