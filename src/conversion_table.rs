use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::cell::CellValue;
use crate::error::ConvertError;
use crate::grid::Grid;
use crate::workbook::{SheetSelector, read_sheet};

pub const REFERENCE_SHEET: &str = "Sheet1";
pub const KEY_COLUMN: u32 = 2;
pub const VALUE_COLUMN: u32 = 3;
pub const FIRST_ROW: u32 = 1;
pub const LAST_ROW: u32 = 130;

/// Article-ref → internal-code mapping read from the reference workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionTable {
    entries: HashMap<i64, CellValue>,
}

impl ConversionTable {
    /// Loads `Sheet1!B1:C130` from the reference workbook at `path`.
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let grid = read_sheet(path, SheetSelector::Named(REFERENCE_SHEET)).map_err(|error| {
            ConvertError::TableLoad {
                path: path.to_path_buf(),
                reason: error.to_string(),
            }
        })?;
        let table = Self::from_grid(&grid);
        debug!(path = %path.display(), entries = table.len(), "loaded conversion table");
        Ok(table)
    }

    /// Scans the fixed key/value window of an already loaded reference grid.
    /// Rows with either side empty are skipped; a repeated key keeps the value
    /// of its last occurrence.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let mut entries = HashMap::new();
        for row in FIRST_ROW..=LAST_ROW {
            let key = grid.value(row, KEY_COLUMN);
            let value = grid.value(row, VALUE_COLUMN);
            if key.is_empty() || value.is_empty() {
                continue;
            }
            let Some(code) = key.as_integer() else {
                debug!(row, key = %key, "skipping non-integer conversion key");
                continue;
            };
            entries.insert(code, value.clone());
        }
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: i64) -> Option<&CellValue> {
        self.entries.get(&key)
    }

    /// Resolves a key cell, falling back to numeric zero for empty,
    /// non-integer, or unknown keys.
    #[must_use]
    pub fn resolve(&self, key: &CellValue) -> CellValue {
        key.as_integer()
            .and_then(|code| self.get(code))
            .cloned()
            .unwrap_or(CellValue::Number(0.0))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(i64, CellValue)> for ConversionTable {
    fn from_iter<T: IntoIterator<Item = (i64, CellValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
