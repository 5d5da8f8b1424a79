#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use rust_xlsxwriter::{Format, Workbook};

pub const ORDER_TITLE: &str = "SPAR weekly order";

pub fn create_test_pdf(path: &Path, pages: &[Vec<&str>]) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();

    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
        ];

        for (index, line) in lines.iter().enumerate() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            if index + 1 < lines.len() {
                operations.push(Operation::new("T*", vec![]));
            }
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

/// Reference workbook: a cover sheet first, then `Sheet1` with keys in B and
/// codes in C from row 1.
pub fn create_reference_table(
    path: &Path,
    entries: &[(i64, f64)],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut workbook = Workbook::new();
    workbook
        .add_worksheet()
        .set_name("Cover")?
        .write_string(0, 0, "Conversion table")?;

    let sheet = workbook.add_worksheet().set_name("Sheet1")?;
    sheet.write_string(0, 0, "ignored")?;
    for (index, (key, code)) in entries.iter().enumerate() {
        let row = u32::try_from(index)?;
        sheet.write_number(row, 1, *key as f64)?;
        sheet.write_number(row, 2, *code)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Vendor order workbook: a title merged over A1:F1, a header on row 5 and
/// one `(article key, quantity)` pair per row from row 6, key in A and
/// quantity in E.
pub fn create_order_workbook(
    path: &Path,
    rows: &[(i64, f64)],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Ordine")?;
    let wrapped = Format::new().set_text_wrap();

    sheet.merge_range(0, 0, 0, 5, ORDER_TITLE, &wrapped)?;
    for (col, header) in ["Article", "Description", "Code", "Pack", "Qty"]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(4, u16::try_from(col)?, *header, &wrapped)?;
    }

    for (index, (key, quantity)) in rows.iter().enumerate() {
        let row = 5 + u32::try_from(index)?;
        sheet.write_number(row, 0, *key as f64)?;
        sheet.write_string(row, 1, "item")?;
        sheet.write_string(row, 2, "old code")?;
        sheet.write_number(row, 3, 6.0)?;
        sheet.write_number(row, 4, *quantity)?;
    }
    sheet.set_row_height(5, 40)?;

    workbook.save(path)?;
    Ok(())
}
