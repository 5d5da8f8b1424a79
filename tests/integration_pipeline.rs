mod common;

use std::process::Command;

use pretty_assertions::assert_eq;
use spar_order_convert::{
    CellValue, ConversionTable, ConvertError, ConvertOptions, ExtractOptions, InputSource,
    MergePolicy, OrderRow, PipelineStage, STAGING_PREFIX, SheetSelector, WarningCode, convert,
    convert_pdf, convert_workbook, extract_pdf_orders, extract_pdf_to_csv, read_sheet,
};
use tempfile::tempdir;

fn order_row(article_ref: &str, cases_ordered: f64, unit_qty: f64) -> OrderRow {
    OrderRow {
        article_ref: article_ref.to_string(),
        cases_ordered,
        unit_qty,
    }
}

#[test]
fn converts_vendor_spreadsheet_end_to_end() {
    let dir = tempdir().expect("tempdir should be created");
    let reference = dir.path().join("reference.xlsm");
    let input = dir.path().join("order.xlsx");
    common::create_reference_table(&reference, &[(101, 11_005_101.0), (102, 5.0)])
        .expect("reference fixture should be created");
    common::create_order_workbook(&input, &[(101, 10.0), (102, 10.0), (999, 10.0)])
        .expect("order fixture should be created");

    let report = convert(&reference, &input, &ConvertOptions::default())
        .expect("conversion should succeed");

    let expected_output = dir.path().join("order_converted.xlsx");
    assert_eq!(report.output, expected_output);
    assert_eq!(report.source, InputSource::Spreadsheet);
    assert_eq!(report.start_row, 6);
    assert_eq!(report.resolved_rows, 2);
    assert_eq!(report.deleted_rows, 1);
    assert_eq!(report.remaining_rows, 2);
    assert_eq!(report.columns_inserted, 1);
    assert_eq!(report.stages.last(), Some(&PipelineStage::Saved));

    let grid = read_sheet(&expected_output, SheetSelector::First)
        .expect("converted workbook should load");
    assert_eq!(grid.sheet_name(), "Ordine");
    assert_eq!(grid.max_row(), 7);
    assert!(grid.merged_regions().is_empty());
    assert_eq!(grid.value(1, 1), &CellValue::text(common::ORDER_TITLE));
    assert_eq!(grid.value(1, 2), &CellValue::Empty);
    assert_eq!(grid.value(5, 6), &CellValue::text("Qty"));

    assert_eq!(grid.value(6, 3), &CellValue::Number(11_005_101.0));
    assert_eq!(grid.value(6, 4), &CellValue::Number(40.0));
    assert_eq!(grid.value(6, 6), &CellValue::Number(10.0));
    assert_eq!(grid.value(7, 1), &CellValue::Number(102.0));
    assert_eq!(grid.value(7, 3), &CellValue::Number(5.0));
    assert_eq!(grid.value(7, 4), &CellValue::Number(10.0));
}

#[test]
fn propagate_policy_copies_title_into_dissolved_cells() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("order.xlsx");
    let output = dir.path().join("custom.xlsx");
    common::create_order_workbook(&input, &[(101, 2.0)]).expect("order fixture should be created");
    let table = [(101, CellValue::Number(11_004_140.0))]
        .into_iter()
        .collect::<ConversionTable>();

    let options = ConvertOptions {
        merge_policy: MergePolicy::Propagate,
        output: Some(output.clone()),
        ..ConvertOptions::default()
    };
    let report = convert_workbook(&table, &input, &options).expect("conversion should succeed");
    assert_eq!(report.output, output);

    let grid = read_sheet(&output, SheetSelector::First).expect("converted workbook should load");
    let title = CellValue::text(common::ORDER_TITLE);
    assert_eq!(grid.value(1, 3), &title);
    assert_eq!(grid.value(1, 4), &CellValue::Empty);
    assert_eq!(grid.value(1, 7), &title);
    assert_eq!(grid.value(6, 4), &CellValue::Number(4.0));
}

#[test]
fn start_row_beyond_sheet_writes_nothing() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("order.xlsx");
    common::create_order_workbook(&input, &[(101, 2.0), (102, 3.0)])
        .expect("order fixture should be created");
    let table = ConversionTable::default();

    let options = ConvertOptions {
        start_row: Some(50),
        ..ConvertOptions::default()
    };
    let err = convert_workbook(&table, &input, &options).expect_err("start row should be rejected");

    assert!(matches!(
        err,
        ConvertError::StartRowOutOfRange {
            start_row: 50,
            max_row: 7
        }
    ));
    assert!(!dir.path().join("order_converted.xlsx").exists());
}

#[test]
fn missing_reference_table_is_a_table_load_error() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("order.xlsx");
    common::create_order_workbook(&input, &[(101, 2.0)]).expect("order fixture should be created");

    let err = convert(
        &dir.path().join("missing.xlsm"),
        &input,
        &ConvertOptions::default(),
    )
    .expect_err("missing table should fail");
    assert!(matches!(err, ConvertError::TableLoad { .. }), "{err:?}");
}

#[test]
fn missing_order_spreadsheet_is_a_load_error() {
    let dir = tempdir().expect("tempdir should be created");
    let reference = dir.path().join("reference.xlsm");
    common::create_reference_table(&reference, &[(101, 5.0)])
        .expect("reference fixture should be created");

    let err = convert(
        &reference,
        &dir.path().join("missing.xlsx"),
        &ConvertOptions::default(),
    )
    .expect_err("missing order should fail");
    assert!(matches!(err, ConvertError::Load { .. }), "{err:?}");
}

#[test]
fn unwritable_output_is_a_save_error() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("order.xlsx");
    common::create_order_workbook(&input, &[(101, 2.0)]).expect("order fixture should be created");
    let table = [(101, CellValue::Number(5.0))]
        .into_iter()
        .collect::<ConversionTable>();

    let output = dir.path().join("no/such/dir/out.xlsx");
    let options = ConvertOptions {
        output: Some(output.clone()),
        ..ConvertOptions::default()
    };
    let err = convert_workbook(&table, &input, &options).expect_err("save should fail");

    assert!(matches!(err, ConvertError::Save { .. }), "{err:?}");
    assert!(!output.exists());
}

#[test]
fn failed_pdf_conversion_removes_staged_workbook() {
    let dir = tempdir().expect("tempdir should be created");
    let staging = tempdir().expect("tempdir should be created");
    let input = dir.path().join("order.pdf");
    common::create_test_pdf(&input, &[vec!["Article  Cases  Qty", "1234567  3  12.5"]])
        .expect("PDF fixture should be created");
    let table = [(1_234_567, CellValue::Number(5.0))]
        .into_iter()
        .collect::<ConversionTable>();

    let options = ConvertOptions {
        start_row: Some(99),
        staging_dir: Some(staging.path().to_path_buf()),
        ..ConvertOptions::default()
    };
    let err = convert_pdf(&table, &input, &options).expect_err("start row should be rejected");

    assert!(matches!(
        err,
        ConvertError::StartRowOutOfRange {
            start_row: 99,
            max_row: 2
        }
    ));
    let leftovers = std::fs::read_dir(staging.path())
        .expect("staging dir should be listable")
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(STAGING_PREFIX)
        })
        .count();
    assert_eq!(leftovers, 0);
    assert!(!dir.path().join("order_converted.xlsx").exists());
}

#[test]
fn converts_pdf_order_through_staged_workbook() {
    let dir = tempdir().expect("tempdir should be created");
    let reference = dir.path().join("reference.xlsm");
    let input = dir.path().join("order.pdf");
    common::create_reference_table(&reference, &[(1_234_567, 11_005_382.0)])
        .expect("reference fixture should be created");
    common::create_test_pdf(
        &input,
        &[vec![
            "Article  Cases  Qty",
            "1234567  3  12.5",
            "7654321  1  6",
        ]],
    )
    .expect("PDF fixture should be created");

    let report = convert(&reference, &input, &ConvertOptions::default())
        .expect("conversion should succeed");

    let output = dir.path().join("order_converted.xlsx");
    assert_eq!(report.output, output);
    assert_eq!(report.start_row, 2);
    assert_eq!(report.deleted_rows, 1);
    assert_eq!(report.remaining_rows, 1);
    match &report.source {
        InputSource::Pdf {
            extracted_rows,
            extraction,
        } => {
            assert_eq!(*extracted_rows, 2);
            assert_eq!(extraction.table_pages, 1);
        }
        InputSource::Spreadsheet => panic!("PDF input reported as spreadsheet"),
    }

    let grid = read_sheet(&output, SheetSelector::First).expect("converted workbook should load");
    assert_eq!(grid.max_row(), 2);
    assert_eq!(grid.value(1, 1), &CellValue::text("Article Ref"));
    assert_eq!(grid.value(2, 1), &CellValue::text("1234567"));
    assert_eq!(grid.value(2, 2), &CellValue::Number(3.0));
    assert_eq!(grid.value(2, 3), &CellValue::Number(11_005_382.0));
    assert_eq!(grid.value(2, 4), &CellValue::Number(0.0));
}

#[test]
fn extracts_pdf_table_rows_to_csv() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("order.pdf");
    let output = dir.path().join("order.csv");
    common::create_test_pdf(
        &input,
        &[
            vec!["Article  Cases  Qty", "1234567  3  12,5", "7654321  1  6"],
            vec!["Page two", "2222222  4  1", "3333333  2  0.5"],
        ],
    )
    .expect("PDF fixture should be created");

    let report = extract_pdf_to_csv(&input, &output, &ExtractOptions::default(), b',')
        .expect("extraction should succeed");

    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    assert!(
        csv.starts_with("Article Ref,Cases Ordered,Unit Qty\n"),
        "unexpected CSV output: {csv:?}"
    );
    assert!(
        csv.contains("1234567,3,12.5\n7654321,1,6\n2222222,4,1\n3333333,2,0.5"),
        "unexpected CSV output: {csv:?}, report: {report:?}"
    );
    assert_eq!(report.page_count, 2);
    assert_eq!(report.row_count, 4);
}

#[test]
fn falls_back_to_text_lines_when_no_table_is_found() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("loose.pdf");
    common::create_test_pdf(&input, &[vec!["Delivery note 1234567 3 12.5"]])
        .expect("PDF fixture should be created");

    let (rows, report) =
        extract_pdf_orders(&input, &ExtractOptions::default()).expect("extraction should succeed");

    assert_eq!(rows, vec![order_row("1234567", 3.0, 12.5)]);
    assert_eq!(report.fallback_pages, 1);
    assert!(
        report
            .warnings
            .iter()
            .any(|warning| warning.code == WarningCode::TextFallback)
    );
}

#[test]
fn pdf_without_order_rows_is_an_extraction_error() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("empty.pdf");
    common::create_test_pdf(&input, &[vec!["Thank you for your order."]])
        .expect("PDF fixture should be created");

    let err = extract_pdf_orders(&input, &ExtractOptions::default())
        .expect_err("extraction should fail");
    assert!(err.is_empty_extraction(), "{err:?}");
}

#[test]
fn cli_returns_exit_code_2_when_pdf_has_no_orders() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("empty.pdf");
    let output = dir.path().join("empty.csv");
    common::create_test_pdf(&input, &[vec!["Thank you for your order."]])
        .expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_spar-convert"))
        .arg("extract")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .expect("binary should run");

    assert_eq!(status.code(), Some(2));
    assert!(!output.exists());
}

#[test]
fn cli_prints_json_report_for_spreadsheet_conversion() {
    let dir = tempdir().expect("tempdir should be created");
    let reference = dir.path().join("reference.xlsm");
    let input = dir.path().join("order.xlsx");
    common::create_reference_table(&reference, &[(101, 11_005_101.0), (102, 5.0)])
        .expect("reference fixture should be created");
    common::create_order_workbook(&input, &[(101, 10.0), (999, 10.0)])
        .expect("order fixture should be created");

    let output = Command::new(env!("CARGO_BIN_EXE_spar-convert"))
        .arg("convert")
        .arg("--table")
        .arg(&reference)
        .arg("--input")
        .arg(&input)
        .args(["--suffix", "_CONVERTITO", "--json"])
        .output()
        .expect("binary should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["source"]["kind"], "spreadsheet");
    assert_eq!(report["deleted_rows"], 1);
    assert_eq!(report["remaining_rows"], 1);
    assert_eq!(report["stages"][7], "saved");
    assert!(dir.path().join("order_CONVERTITO.xlsx").exists());
}
