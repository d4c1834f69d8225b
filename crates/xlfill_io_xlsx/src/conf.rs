//! Constants and default template-schema presets.

use crate::spec::{SpecCellBlock, SpecDropdownRule, SpecExcelLayout};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;

/// Rows above the style row (title + metadata).
pub const N_ROWS_RESERVED: usize = 2;
/// Zero-based row whose cells define each column's fill/protection.
pub const N_ROW_STYLE: usize = N_ROWS_RESERVED;
/// Last zero-based row restyled by the formatting restorer.
pub const N_ROW_RESTORE_MAX: usize = 300;

/// Indicator codes whose rows are dropped when filtering is enabled.
pub const TUP_INDICATOR_BLACKLIST: [i64; 4] = [509, 510, 511, 512];

/// Probe-row label every workbook record must carry.
pub const C_LABEL_UUID: &str = "uuid";
/// Probe-row label that marks the newer workbook layout.
pub const C_LABEL_UNIT: &str = "Unit";
/// Column appended by the sheet merger.
pub const C_MERGE_TAG_COLUMN: &str = "file_name";

/// Default editable columns of the main sheet.
pub const TUP_COLS_EDITABLE_DEFAULT: [usize; 7] = [22, 23, 24, 26, 27, 28, 31];

const C_SHEET_MAIN: &str = "Template";
const C_SHEET_EXTRA: &str = "Add New Records";

fn block(
    col_start_inclusive: usize,
    col_end_exclusive: usize,
    row_dst: usize,
    col_dst: usize,
) -> SpecCellBlock {
    SpecCellBlock {
        col_start_inclusive,
        col_end_exclusive,
        row_dst,
        col_dst,
    }
}

/// Workbook record layouts of the `cgv_enrichment_v2` template.
///
/// `legacy` has no `Unit` column and only one block on the secondary sheet.
/// `unit` inserts `Unit` at column 18, which is not pasted, so the later
/// main-sheet slices shift by one.
pub fn derive_default_excel_layouts() -> Vec<SpecExcelLayout> {
    vec![
        SpecExcelLayout {
            name: "legacy".to_string(),
            if_has_unit: false,
            col_uuid: 0,
            col_unit: None,
            col_indicator: 1,
            cols_integer_main: vec![2, 19],
            cols_integer_extra: vec![],
            blocks_main: vec![block(0, 18, 2, 4), block(18, 21, 2, 22), block(21, 25, 2, 26)],
            blocks_extra: vec![block(0, 10, 2, 4)],
        },
        SpecExcelLayout {
            name: "unit".to_string(),
            if_has_unit: true,
            col_uuid: 0,
            col_unit: Some(18),
            col_indicator: 1,
            cols_integer_main: vec![2, 20],
            cols_integer_extra: vec![2],
            blocks_main: vec![block(0, 18, 2, 4), block(19, 22, 2, 22), block(22, 26, 2, 26)],
            blocks_extra: vec![block(0, 10, 2, 4), block(10, 13, 2, 14), block(13, 16, 2, 18)],
        },
    ]
}

/// Dropdown rules every output workbook must carry.
pub fn derive_default_dropdown_rules() -> Vec<SpecDropdownRule> {
    vec![
        SpecDropdownRule::new(C_SHEET_MAIN, "W3:W301", "Lists!$A$2:$A$200"),
        SpecDropdownRule::new(C_SHEET_MAIN, "X3:X301", "Lists!$B$2:$B$200"),
        SpecDropdownRule::new(C_SHEET_MAIN, "Y3:Y301", "Lists!$C$2:$C$200"),
        SpecDropdownRule::new(C_SHEET_MAIN, "AA3:AA301", "Lists!$D$2:$D$200"),
        SpecDropdownRule::new(C_SHEET_EXTRA, "E3:E301", "Lists!$A$2:$A$200"),
        SpecDropdownRule::new(C_SHEET_EXTRA, "F3:F301", "Lists!$E$2:$E$200"),
    ]
}
