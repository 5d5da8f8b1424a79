use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::cell::CellValue;
use crate::error::ConvertError;
use crate::model::{ORDER_HEADERS, OrderRow};

fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    rows: &[OrderRow],
) -> Result<(), ConvertError> {
    writer.write_record(ORDER_HEADERS)?;
    for row in rows {
        writer.write_record([
            row.article_ref.clone(),
            CellValue::Number(row.cases_ordered).to_string(),
            CellValue::Number(row.unit_qty).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv(path: &Path, rows: &[OrderRow], delimiter: u8) -> Result<(), ConvertError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_rows(&mut writer, rows)
}

pub(crate) fn write_csv_to_string(rows: &[OrderRow], delimiter: u8) -> Result<String, ConvertError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_rows(&mut writer, rows)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ConvertError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ConvertError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
