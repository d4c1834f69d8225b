//! `xlfill_io_fs` v1:
//! Filesystem side of the template-fill pipeline.
//!
//! Modules:
//! - `scan` : input record discovery and kind classification
//! - `copy` : per-input template cloning
//! - `spec` : enums/options/errors
//! - `util` : shared helper functions

pub mod copy;
pub mod scan;
pub mod spec;
mod util;

pub use copy::{copy_template, derive_output_file_name};
pub use scan::{ReportScan, scan_input_files};
pub use spec::{
    CopyTemplateError, EnumCopyFileConflictStrategy, EnumInputKind, EnumPatternMode,
    ScanInputError, SpecInputFile, SpecScanOptions, SpecTemplateCopy,
};
