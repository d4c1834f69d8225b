//! Batch options, per-file stages and top-level error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use xlfill_io_fs::{EnumCopyFileConflictStrategy, ScanInputError, SpecScanOptions};
use xlfill_io_xlsx::conf::TUP_COLS_EDITABLE_DEFAULT;
use xlfill_io_xlsx::{MergeError, SpecTemplateSchema};

/// Default rayon pool size.
pub const N_WORKERS_DEFAULT: usize = 8;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Lifecycle stage of one input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRecordStage {
    /// Found by the input scan.
    Discovered,
    /// Template cloned to the output path.
    Copied,
    /// Output already existed and was kept.
    Skipped,
    /// Records read and cleaned.
    Loaded,
    /// Cells pasted into the workbook.
    Written,
    /// Column styles and dropdowns replayed.
    Restored,
    /// Workbook saved.
    Done,
    /// Gave up at an earlier stage.
    Failed,
    /// Partial output deleted after a failure.
    Removed,
}

impl EnumRecordStage {
    /// Lower-case stage label used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Copied => "copied",
            Self::Skipped => "skipped",
            Self::Loaded => "loaded",
            Self::Written => "written",
            Self::Restored => "restored",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for EnumRecordStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Options for [`crate::batch::run_batch`].
#[derive(Debug, Clone)]
pub struct SpecBatchOptions {
    /// Directory holding `.csv`/`.xlsx`/`.xlsb` records.
    pub dir_input: PathBuf,
    /// `.xlsx` template cloned per record.
    pub path_template: PathBuf,
    /// Output directory; created when missing.
    pub dir_output: PathBuf,
    /// Main sheet written in CSV mode and restored in both modes.
    pub sheet_name: String,
    /// Editable (unlocked) column indices of the main sheet.
    pub cols_editable: Vec<usize>,
    /// CSV columns truncated to integers.
    pub cols_integer: Vec<usize>,
    /// Policy for outputs that already exist.
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    /// Input discovery filters (kinds, include/exclude patterns).
    pub spec_scan_options: SpecScanOptions,
    /// Drop rows carrying a blacklisted indicator code.
    pub if_filter_indicator: bool,
    /// Worker pool size; `1` processes records serially in order.
    pub n_workers: usize,
    /// Template-coupled layout description.
    pub schema: SpecTemplateSchema,
}

impl SpecBatchOptions {
    /// Options with every optional knob at its default.
    pub fn new(dir_input: PathBuf, path_template: PathBuf, dir_output: PathBuf) -> Self {
        Self {
            dir_input,
            path_template,
            dir_output,
            sheet_name: "Template".to_string(),
            cols_editable: TUP_COLS_EDITABLE_DEFAULT.to_vec(),
            cols_integer: Vec::new(),
            rule_conflict_file: EnumCopyFileConflictStrategy::Overwrite,
            spec_scan_options: SpecScanOptions::default(),
            if_filter_indicator: false,
            n_workers: N_WORKERS_DEFAULT,
            schema: SpecTemplateSchema::default(),
        }
    }
}

/// Per-file failure entry collected into [`crate::report::ReportBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFileFailure {
    /// Input record path.
    pub path: PathBuf,
    /// Stage that failed.
    pub stage: EnumRecordStage,
    /// Diagnostic text.
    pub exception: String,
}

/// Configuration failures; per-file problems never surface here.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(
        "Template type must be in \"xlsx\" format, use Save As in Excel to convert it: {}",
        .0.display()
    )]
    TemplateExtension(PathBuf),
    #[error("No input files in {}. Please check your input dir.", .0.display())]
    EmptyInput(PathBuf),
    #[error(transparent)]
    Scan(#[from] ScanInputError),
    #[error("Failed to create output dir {}: {source}", path.display())]
    OutputDirInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Schema file failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read schema file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid schema file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to render schema: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Directory-level merge failures.
#[derive(Debug, Error)]
pub enum RunMergeError {
    #[error(transparent)]
    Scan(#[from] ScanInputError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
