//! Input/copy models and top-level error types.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing output workbook conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyFileConflictStrategy {
    /// Keep the existing output and report it as skipped.
    Skip,
    /// Replace the existing output with a fresh template copy.
    #[default]
    Overwrite,
    /// Fail the copy when the output already exists.
    Error,
}

impl EnumCopyFileConflictStrategy {
    /// Map the CLI-level `skip_existing` flag onto a conflict policy.
    pub fn from_skip_existing(if_skip_existing: bool) -> Self {
        if if_skip_existing {
            Self::Skip
        } else {
            Self::Overwrite
        }
    }
}

impl FromStr for EnumCopyFileConflictStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "Invalid file conflict strategy: `{value}`. Expected one of: ['skip', 'overwrite', 'error']"
            )),
        }
    }
}

/// Pattern matching mode for include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

impl FromStr for EnumPatternMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "glob" => Ok(Self::Glob),
            "regex" => Ok(Self::Regex),
            "literal" => Ok(Self::Literal),
            _ => Err(format!(
                "Invalid pattern strategy: `{value}`. Expected one of: ['glob', 'regex', 'literal']"
            )),
        }
    }
}

/// Record file kind, fixed once at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumInputKind {
    /// Comma separated text.
    Csv,
    /// Office Open XML workbook.
    Xlsx,
    /// Binary workbook.
    Xlsb,
}

impl EnumInputKind {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xlsb" => Some(Self::Xlsb),
            _ => None,
        }
    }

    /// Whether the record must go through the two-sheet workbook loader.
    pub fn is_workbook(&self) -> bool {
        matches!(self, Self::Xlsx | Self::Xlsb)
    }

    /// Lower-case extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xlsb => "xlsb",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::scan::scan_input_files`].
#[derive(Debug, Clone)]
pub struct SpecScanOptions {
    /// Kinds accepted as record files.
    pub kinds_accepted: Vec<EnumInputKind>,
    /// Include patterns applied to file basename.
    pub patterns_include_files: Option<Vec<String>>,
    /// Exclude patterns applied to file basename.
    pub patterns_exclude_files: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumPatternMode,
    /// Skip names starting with `~$` (Excel lock files) and `.`.
    pub if_skip_hidden: bool,
}

impl Default for SpecScanOptions {
    fn default() -> Self {
        Self {
            kinds_accepted: vec![EnumInputKind::Csv, EnumInputKind::Xlsx, EnumInputKind::Xlsb],
            patterns_include_files: None,
            patterns_exclude_files: None,
            rule_pattern: EnumPatternMode::Glob,
            if_skip_hidden: true,
        }
    }
}

impl SpecScanOptions {
    /// Options that only accept workbook kinds.
    pub fn workbooks_only() -> Self {
        Self::default().with_workbooks_only()
    }

    /// Same patterns, restricted to workbook kinds.
    pub fn with_workbooks_only(self) -> Self {
        Self {
            kinds_accepted: vec![EnumInputKind::Xlsx, EnumInputKind::Xlsb],
            ..self
        }
    }
}

/// One discovered record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecInputFile {
    /// Absolute or caller-relative path.
    pub path: PathBuf,
    /// File basename.
    pub name_file: String,
    /// Classified kind.
    pub kind: EnumInputKind,
}

/// Outcome of one template copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTemplateCopy {
    /// True when an existing output was kept untouched.
    pub if_skipped: bool,
    /// Output workbook path.
    pub path_file_out: PathBuf,
}

/// Input discovery failures.
#[derive(Debug, Error)]
pub enum ScanInputError {
    /// Input path is not a directory.
    #[error("Input is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Invalid include/exclude pattern.
    #[error("Invalid pattern in include/exclude: {0}")]
    InvalidPattern(String),
    /// Directory listing failed.
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDirFailed {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Template copy failures.
#[derive(Debug, Error)]
pub enum CopyTemplateError {
    /// Template file is missing or not a regular file.
    #[error("Template is not a file: {}", .0.display())]
    TemplateNotFile(PathBuf),
    /// Record path has no usable file stem.
    #[error("Cannot derive output name from {}", .0.display())]
    InvalidRecordName(PathBuf),
    /// Output path exists and is a directory.
    #[error("Destination is a directory: {}", .0.display())]
    DestinationIsDirectory(PathBuf),
    /// Output path exists under the `Error` conflict policy.
    #[error("Destination exists: {}", .0.display())]
    DestinationExists(PathBuf),
    /// Copy or metadata propagation failed.
    #[error("Failed to copy template to {}: {source}", path.display())]
    CopyFailed {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
