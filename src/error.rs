use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load workbook '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("workbook '{}' has no worksheets", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("failed to load conversion table '{}': {reason}", path.display())]
    TableLoad { path: PathBuf, reason: String },

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("no order rows found on any of {pages} PDF page(s)")]
    Extraction { pages: usize },

    #[error("start row {start_row} is beyond the last row of the sheet ({max_row})")]
    StartRowOutOfRange { start_row: u32, max_row: u32 },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("failed to save workbook '{}': {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

impl ConvertError {
    /// Whether the error means the PDF simply had nothing to extract, as
    /// opposed to a broken input or environment.
    #[must_use]
    pub fn is_empty_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }
}
