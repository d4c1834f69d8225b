//! `xlfill_io_xlsx` v1:
//! Spreadsheet side of the template-fill pipeline.
//!
//! Modules:
//! - `conf`    : constants, default layouts and dropdown rules
//! - `spec`    : cell/grid/schema models and options
//! - `error`   : error types
//! - `util`    : pure cell helpers (sanitize, coerce, filter)
//! - `loader`  : CSV and two-sheet workbook record loading
//! - `writer`  : template workbook cell writer
//! - `restore` : column style replay and dropdown registration
//! - `merge`   : sheet-to-CSV consolidation kernel
pub mod conf;
pub mod error;
pub mod loader;
pub mod merge;
pub mod restore;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_LABEL_UNIT, C_LABEL_UUID, C_MERGE_TAG_COLUMN, N_ROW_RESTORE_MAX, N_ROW_STYLE,
    N_ROWS_RESERVED, TUP_INDICATOR_BLACKLIST,
};
pub use error::{MergeError, XlsxIoError};
pub use loader::{count_record_rows, load_csv_records, load_excel_records};
pub use merge::{ReportMerge, SpecMergeOptions, merge_sheets_to_csv};
pub use restore::{
    SpecColumnStyle, capture_column_styles, register_dropdown_rules, restore_column_styles,
    restore_formatting,
};
pub use spec::{
    EnumCellValue, EnumLoadedRecords, SpecCellBlock, SpecCsvLayout, SpecDropdownRule,
    SpecExcelInputSchema, SpecExcelLayout, SpecLoadedBlock, SpecLoadedWorkbook,
    SpecTemplateSchema, TypeGrid,
};
pub use util::{coerce_integer_value, is_row_blacklisted, strip_control_chars};
pub use writer::TemplateWorkbook;
