use std::fmt::{Display, Formatter};

/// A single literal cell value. Formulas never reach this type; workbooks
/// are read through their cached values.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Integer view of the cell. Numbers are truncated toward zero, text must
    /// be a plain (optionally signed) integer after trimming.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Empty => None,
            Self::Number(value) => {
                if value.is_finite() && value.abs() < 9.0e18 {
                    #[allow(clippy::cast_possible_truncation)]
                    let truncated = value.trunc() as i64;
                    Some(truncated)
                } else {
                    None
                }
            }
            Self::Text(text) => text.trim().parse::<i64>().ok(),
        }
    }

    /// Numeric view of the cell. Text is accepted when it parses as a decimal
    /// once a comma decimal separator is replaced with a dot.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Number(value) => value.is_finite().then_some(*value),
            Self::Text(text) => text
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }

    /// The zero sentinel: numeric zero or the string "0".
    #[must_use]
    pub fn is_zero_sentinel(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Number(value) => *value == 0.0,
            Self::Text(text) => text.trim() == "0",
        }
    }

    /// Length of the displayed string, used for column autosizing.
    #[must_use]
    pub fn display_len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Text(text) => text.chars().count(),
            Self::Number(_) => self.to_string().chars().count(),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1.0e15 {
                    write!(f, "{value:.0}")
                } else {
                    write!(f, "{value}")
                }
            }
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let value = value as f64;
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}
