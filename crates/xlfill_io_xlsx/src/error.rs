//! Error types for loading, writing and merging.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the per-file load/write/restore pipeline.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// CSV parsing failed.
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        /// Offending path.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// Workbook could not be opened or a sheet could not be read.
    #[error("Failed to read workbook {}: {message}", path.display())]
    WorkbookRead {
        /// Offending path.
        path: PathBuf,
        /// Reader diagnostic.
        message: String,
    },
    /// Workbook could not be saved.
    #[error("Failed to write workbook {}: {message}", path.display())]
    WorkbookWrite {
        /// Offending path.
        path: PathBuf,
        /// Writer diagnostic.
        message: String,
    },
    /// Target sheet is absent from the output workbook.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),
    /// Record workbook does not match any known layout.
    #[error("Structural mismatch in {}: {message}", path.display())]
    StructuralMismatch {
        /// Offending path.
        path: PathBuf,
        /// What was expected.
        message: String,
    },
    /// Row/column offset does not fit worksheet coordinates.
    #[error("{0}")]
    IndexOverflow(String),
    /// Workbook was already saved.
    #[error("Cannot write after save().")]
    Closed,
}

/// Failures of the sheet merger.
#[derive(Debug, Error)]
pub enum MergeError {
    /// No workbook was found in the merge directory.
    #[error("No Excel files in {}. Please check your input dir.", .0.display())]
    EmptyInput(PathBuf),
    /// A workbook could not be read.
    #[error(transparent)]
    Read(#[from] XlsxIoError),
    /// Output CSV could not be written.
    #[error("Failed to write merged CSV {}: {source}", path.display())]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
}
