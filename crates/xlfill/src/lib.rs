//! `xlfill` v1:
//! Batch filler for copies of a protected Excel template, plus a sheet merger.
//!
//! Modules:
//! - `batch`    : discovery, template copy and pooled fill orchestration
//! - `report`   : batch report and builder
//! - `spec`     : options, stages and top-level errors
//! - `conf`     : template-schema TOML loading
//! - `merge`    : directory-level sheet merge
//! - `max_rows` : largest-record scan
pub mod batch;
pub mod conf;
pub mod max_rows;
pub mod merge;
pub mod report;
pub mod spec;

pub use batch::run_batch;
pub use conf::{load_template_schema, render_template_schema, resolve_template_schema};
pub use max_rows::{ReportMaxRows, scan_max_row_count};
pub use merge::run_merge;
pub use report::{ReportBatch, ReportBatchBuilder};
pub use spec::{
    BatchError, ConfigError, EnumRecordStage, N_WORKERS_DEFAULT, RunMergeError, SpecBatchOptions,
    SpecFileFailure,
};
