use std::path::PathBuf;

use polars::prelude::DataFrame;

use cfv_ingest::SkippedFile;
use cfv_model::PeriodSelector;
use cfv_output::ExportedFile;

/// Row counts for one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: &'static str,
    pub files: usize,
    pub skipped_files: usize,
    pub input_rows: usize,
    pub dropped_rows: usize,
    pub output_rows: usize,
}

impl StageSummary {
    pub fn empty(stage: &'static str) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }
}

/// Aggregated tables from one data kind.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub all: Option<DataFrame>,
    pub filtered: Option<DataFrame>,
    pub summary: StageSummary,
    pub skipped: Vec<SkippedFile>,
}

impl StageOutput {
    pub fn empty(stage: &'static str) -> Self {
        Self {
            all: None,
            filtered: None,
            summary: StageSummary::empty(stage),
            skipped: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct ProcessResult {
    pub period: PeriodSelector,
    pub scope: String,
    pub save_dir: PathBuf,
    pub stages: Vec<StageSummary>,
    pub exports: Vec<ExportedFile>,
    pub skipped: Vec<SkippedFile>,
    pub errors: Vec<String>,
    /// Month-over-month decreases found in cumulative case counts.
    pub decreases: usize,
    pub dry_run: bool,
}
