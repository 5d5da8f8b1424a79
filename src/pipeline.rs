use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::conversion_table::ConversionTable;
use crate::enrich::{ColumnLayout, insert_computed_column, resolve_codes};
use crate::error::ConvertError;
use crate::extract::ExtractionReport;
use crate::filter::delete_zero_rows;
use crate::grid::{ColumnRemap, Grid};
use crate::normalize::{autosize, normalize};
use crate::options::MergePolicy;

/// Conversion stages, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Loaded,
    Normalized,
    StartRowValidated,
    Enriched,
    ColumnInserted,
    Filtered,
    ReNormalized,
    Saved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub grid: Grid,
    pub start_row: u32,
    pub resolved_rows: usize,
    pub deleted_rows: usize,
    pub remaps: Vec<ColumnRemap>,
    pub stages: Vec<PipelineStage>,
}

/// Where the converted sheet came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSource {
    Spreadsheet,
    Pdf {
        extracted_rows: usize,
        extraction: ExtractionReport,
    },
}

/// Summary of one finished conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub source: InputSource,
    pub start_row: u32,
    pub resolved_rows: usize,
    pub deleted_rows: usize,
    pub remaining_rows: usize,
    pub columns_inserted: usize,
    pub stages: Vec<PipelineStage>,
}

impl ConversionReport {
    #[must_use]
    pub fn new(
        input: PathBuf,
        output: PathBuf,
        source: InputSource,
        outcome: &PipelineOutcome,
    ) -> Self {
        let data_rows = (outcome.grid.max_row() + 1).saturating_sub(outcome.start_row);
        Self {
            input,
            output,
            source,
            start_row: outcome.start_row,
            resolved_rows: outcome.resolved_rows,
            deleted_rows: outcome.deleted_rows,
            remaining_rows: data_rows as usize,
            columns_inserted: outcome.remaps.len(),
            stages: outcome.stages.clone(),
        }
    }
}

/// Single-pass conversion of one loaded sheet. The pipeline owns the grid
/// until it hands the finished sheet to the writer.
#[derive(Debug)]
pub struct ConversionPipeline<'a> {
    grid: Grid,
    table: &'a ConversionTable,
    start_row: u32,
    merge_policy: MergePolicy,
    layout: ColumnLayout,
    stages: Vec<PipelineStage>,
}

impl<'a> ConversionPipeline<'a> {
    #[must_use]
    pub fn new(grid: Grid, table: &'a ConversionTable, start_row: u32) -> Self {
        Self {
            grid,
            table,
            start_row,
            merge_policy: MergePolicy::default(),
            layout: ColumnLayout::default(),
            stages: vec![PipelineStage::Loaded],
        }
    }

    #[must_use]
    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    fn advance(&mut self, stage: PipelineStage) {
        debug!(
            ?stage,
            rows = self.grid.max_row(),
            columns = self.grid.max_column(),
            "pipeline stage reached"
        );
        self.stages.push(stage);
    }

    fn validate_start_row(&self) -> Result<(), ConvertError> {
        if self.start_row == 0 {
            return Err(ConvertError::InvalidOption(
                "start row must be at least 1".to_string(),
            ));
        }
        let max_row = self.grid.max_row();
        if self.start_row > max_row {
            return Err(ConvertError::StartRowOutOfRange {
                start_row: self.start_row,
                max_row,
            });
        }
        Ok(())
    }

    /// Runs every stage once, in order, then hands the finished grid to
    /// `write`. Any error aborts the run and drops the grid.
    pub fn run<W>(mut self, write: W) -> Result<PipelineOutcome, ConvertError>
    where
        W: FnOnce(&Grid) -> Result<(), ConvertError>,
    {
        normalize(&mut self.grid, self.merge_policy);
        self.advance(PipelineStage::Normalized);

        self.validate_start_row()?;
        self.advance(PipelineStage::StartRowValidated);

        let resolved_rows = resolve_codes(&mut self.grid, self.table, self.start_row, self.layout);
        self.advance(PipelineStage::Enriched);

        let remap = insert_computed_column(&mut self.grid, self.start_row, self.layout);
        self.advance(PipelineStage::ColumnInserted);

        let deleted_rows =
            delete_zero_rows(&mut self.grid, self.start_row, self.layout.lookup_target);
        self.advance(PipelineStage::Filtered);

        autosize(&mut self.grid);
        self.advance(PipelineStage::ReNormalized);

        write(&self.grid)?;
        self.advance(PipelineStage::Saved);

        info!(
            start_row = self.start_row,
            resolved_rows,
            deleted_rows,
            remaining_rows = self.grid.max_row(),
            "conversion finished"
        );

        Ok(PipelineOutcome {
            grid: self.grid,
            start_row: self.start_row,
            resolved_rows,
            deleted_rows,
            remaps: vec![remap],
            stages: self.stages,
        })
    }
}
