use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ConvertError;
use crate::model::{OrderRow, PageText};
use crate::options::ExtractOptions;
use crate::table_detect::detect_tables_in_page;
use crate::table_parse::normalize_number_field;
use crate::warning::{ExtractWarning, WarningCode};

static ARTICLE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("hardcoded article ref regex is valid"));
static QUANTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d*\.?\d+$").expect("hardcoded quantity regex is valid"));
static TEXT_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(\d*[.,]?\d+)\s+(\d*[.,]?\d+)").expect("hardcoded text row regex is valid")
});

/// Which strategy produced a page's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Table,
    Text,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct TierOutput {
    pub rows: Vec<OrderRow>,
    pub discarded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ExtractionReport {
    pub row_count: usize,
    pub page_count: usize,
    pub table_pages: usize,
    pub fallback_pages: usize,
    pub discarded_rows: usize,
    pub warnings: Vec<ExtractWarning>,
}

fn is_candidate(fields: &[String], options: &ExtractOptions) -> bool {
    fields.len() >= options.min_fields.max(3)
        && options.article_ref_rule.accepts(&fields[0])
}

/// Builds an order row from the first three fields, or `None` when any of
/// them is empty or fails its numeric shape after normalization.
pub(crate) fn order_row_from_fields(fields: &[&str]) -> Option<OrderRow> {
    let [article, cases, unit, ..] = fields else {
        return None;
    };
    if [article, cases, unit].iter().any(|field| field.trim().is_empty()) {
        return None;
    }

    let article_ref = article.trim();
    let cases = normalize_number_field(cases);
    let unit = normalize_number_field(unit);
    if !ARTICLE_REF_RE.is_match(article_ref)
        || !QUANTITY_RE.is_match(&cases)
        || !QUANTITY_RE.is_match(&unit)
    {
        return None;
    }

    Some(OrderRow {
        article_ref: article_ref.to_string(),
        cases_ordered: cases.parse().ok()?,
        unit_qty: unit.parse().ok()?,
    })
}

/// First tier: rows of the tables detected on the page.
pub(crate) fn try_table_extraction(page: &PageText, options: &ExtractOptions) -> TierOutput {
    let mut output = TierOutput::default();
    for table in detect_tables_in_page(page, options.min_fields.max(3)) {
        for fields in table.rows.iter().filter(|fields| is_candidate(fields, options)) {
            let fields = fields.iter().map(String::as_str).collect::<Vec<_>>();
            match order_row_from_fields(&fields) {
                Some(row) => output.rows.push(row),
                None => {
                    debug!(page = page.page_number, ?fields, "discarding malformed table row");
                    output.discarded += 1;
                }
            }
        }
    }
    output
}

/// Second tier: the first `digits  number  number` run on each text line.
pub(crate) fn try_text_extraction(page: &PageText, options: &ExtractOptions) -> TierOutput {
    let mut output = TierOutput::default();
    for line in page.text.lines() {
        let Some(captures) = TEXT_ROW_RE.captures(line) else {
            continue;
        };
        let fields = (1..=3)
            .map(|group| captures.get(group).map_or("", |found| found.as_str()))
            .collect::<Vec<_>>();
        if !options.article_ref_rule.accepts(fields[0]) {
            continue;
        }
        match order_row_from_fields(&fields) {
            Some(row) => output.rows.push(row),
            None => output.discarded += 1,
        }
    }
    output
}

/// Runs the table tier and falls back to the text tier only when the table
/// tier accepted nothing on the page.
pub(crate) fn extract_page(
    page: &PageText,
    options: &ExtractOptions,
) -> (ExtractionTier, TierOutput) {
    let tables = try_table_extraction(page, options);
    if !tables.rows.is_empty() {
        return (ExtractionTier::Table, tables);
    }

    let mut text = try_text_extraction(page, options);
    text.discarded += tables.discarded;
    if text.rows.is_empty() {
        (ExtractionTier::Nothing, text)
    } else {
        (ExtractionTier::Text, text)
    }
}

/// Lazy, single-pass stream of order rows in page order. Pages are scanned
/// only as rows are pulled.
#[derive(Debug)]
pub struct OrderRows {
    pages: std::vec::IntoIter<PageText>,
    pending: VecDeque<OrderRow>,
    options: ExtractOptions,
    report: ExtractionReport,
}

impl OrderRows {
    #[must_use]
    pub fn new(pages: Vec<PageText>, options: ExtractOptions) -> Self {
        Self {
            pages: pages.into_iter(),
            pending: VecDeque::new(),
            options,
            report: ExtractionReport::default(),
        }
    }

    /// Counters for the pages scanned so far.
    #[must_use]
    pub fn report(&self) -> &ExtractionReport {
        &self.report
    }

    fn scan_page(&mut self, page: &PageText) {
        let (tier, output) = extract_page(page, &self.options);
        self.report.page_count += 1;
        self.report.discarded_rows += output.discarded;

        if output.discarded > 0 {
            warn!(
                page = page.page_number,
                discarded = output.discarded,
                "dropped order rows with malformed fields"
            );
            self.report.warnings.push(
                ExtractWarning::new(
                    WarningCode::RowDiscarded,
                    format!("{} candidate row(s) had malformed fields", output.discarded),
                )
                .with_page(page.page_number),
            );
        }

        match tier {
            ExtractionTier::Table => self.report.table_pages += 1,
            ExtractionTier::Text => {
                self.report.fallback_pages += 1;
                self.report.warnings.push(
                    ExtractWarning::new(
                        WarningCode::TextFallback,
                        "no table rows detected; rows recovered from plain text",
                    )
                    .with_page(page.page_number),
                );
            }
            ExtractionTier::Nothing => {
                self.report.warnings.push(
                    ExtractWarning::new(WarningCode::NoOrderRows, "page has no order rows")
                        .with_page(page.page_number),
                );
            }
        }

        debug!(
            page = page.page_number,
            ?tier,
            rows = output.rows.len(),
            "scanned PDF page"
        );
        self.pending.extend(output.rows);
    }

    /// Drains the stream, failing when no page produced a single row.
    pub fn collect_rows(mut self) -> Result<(Vec<OrderRow>, ExtractionReport), ConvertError> {
        let rows = self.by_ref().collect::<Vec<_>>();
        if rows.is_empty() {
            return Err(ConvertError::Extraction {
                pages: self.report.page_count,
            });
        }
        Ok((rows, self.report))
    }
}

impl Iterator for OrderRows {
    type Item = OrderRow;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                self.report.row_count += 1;
                return Some(row);
            }
            let page = self.pages.next()?;
            self.scan_page(&page);
        }
    }
}
