use std::path::PathBuf;
use std::str::FromStr;

/// First data row for PDF-derived input (row 1 is the synthesized header).
pub const DEFAULT_PDF_START_ROW: u32 = 2;
/// First data row for native vendor spreadsheets, below their title block.
pub const DEFAULT_SHEET_START_ROW: u32 = 6;
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_converted";
/// Minimum article-ref length for [`ArticleRefRule::strict`].
pub const STRICT_ARTICLE_REF_DIGITS: usize = 5;

/// What happens to the non-anchor cells of a merged region when it is
/// dissolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Only the top-left cell keeps the value.
    #[default]
    Clear,
    /// Every cell of the region receives the top-left value.
    Propagate,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "propagate" => Ok(Self::Propagate),
            other => Err(format!(
                "unknown merge policy '{other}', expected clear or propagate"
            )),
        }
    }
}

/// Acceptance rule for the first field of a PDF order row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArticleRefRule {
    #[default]
    AnyDigits,
    MinDigits(usize),
}

impl ArticleRefRule {
    #[must_use]
    pub const fn strict() -> Self {
        Self::MinDigits(STRICT_ARTICLE_REF_DIGITS)
    }

    #[must_use]
    pub fn accepts(self, field: &str) -> bool {
        let field = field.trim();
        let min_len = match self {
            Self::AnyDigits => 1,
            Self::MinDigits(min) => min.max(1),
        };
        field.len() >= min_len && field.chars().all(|ch| ch.is_ascii_digit())
    }
}

impl FromStr for ArticleRefRule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("any") {
            return Ok(Self::AnyDigits);
        }
        if value.eq_ignore_ascii_case("strict") {
            return Ok(Self::strict());
        }
        let min: usize = value.parse().map_err(|_| {
            format!("invalid article-ref rule '{value}', expected any, strict or a digit count")
        })?;
        if min == 0 {
            return Err("article-ref digit count must be at least 1".to_string());
        }
        Ok(Self::MinDigits(min))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub article_ref_rule: ArticleRefRule,
    pub min_fields: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            article_ref_rule: ArticleRefRule::AnyDigits,
            min_fields: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Explicit first data row; `None` picks the default for the input kind.
    pub start_row: Option<u32>,
    pub merge_policy: MergePolicy,
    pub output: Option<PathBuf>,
    pub output_suffix: String,
    /// Where PDF input is staged as a workbook; the system temp dir if unset.
    pub staging_dir: Option<PathBuf>,
    pub extract: ExtractOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            start_row: None,
            merge_policy: MergePolicy::Clear,
            output: None,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            staging_dir: None,
            extract: ExtractOptions::default(),
        }
    }
}
