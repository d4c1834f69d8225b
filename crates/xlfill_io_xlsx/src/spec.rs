//! Shared cell, grid and template-schema models.

use serde::{Deserialize, Serialize};

use crate::conf::{
    N_ROW_RESTORE_MAX, derive_default_dropdown_rules, derive_default_excel_layouts,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Normalized cell value during load/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Floating point value.
    Number(f64),
    /// Value produced by integer coercion.
    Integer(i64),
}

impl EnumCellValue {
    /// Text rendering used for comparisons and CSV output.
    ///
    /// Integral floats drop the trailing `.0`.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    /// Whether the cell carries no visible content.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Row-major grid of cell values, zero-based.
pub type TypeGrid = Vec<Vec<EnumCellValue>>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TemplateSchema

/// One rectangular paste: source columns `[col_start_inclusive, col_end_exclusive)`
/// land at zero-based `(row_dst, col_dst)` of the target sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecCellBlock {
    /// Inclusive source column start.
    pub col_start_inclusive: usize,
    /// Exclusive source column end.
    pub col_end_exclusive: usize,
    /// Destination row of the first data row.
    pub row_dst: usize,
    /// Destination column of the first sliced column.
    pub col_dst: usize,
}

/// Placement of CSV records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCsvLayout {
    /// Destination row of the first data row.
    pub row_dst: usize,
    /// Destination column of the first record column.
    pub col_dst: usize,
    /// Record column holding the indicator code.
    pub col_indicator: usize,
}

impl Default for SpecCsvLayout {
    fn default() -> Self {
        Self {
            row_dst: 2,
            col_dst: 4,
            col_indicator: 1,
        }
    }
}

/// One recognised version of the two-sheet workbook record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecExcelLayout {
    /// Version label used in logs.
    pub name: String,
    /// Whether this version carries the `Unit` header in its probe row.
    pub if_has_unit: bool,
    /// Column where the `uuid` label must sit.
    pub col_uuid: usize,
    /// Column where the `Unit` label must sit, when the version has one.
    #[serde(default)]
    pub col_unit: Option<usize>,
    /// Main-sheet column holding the indicator code.
    pub col_indicator: usize,
    /// Main-sheet columns coerced to integers.
    #[serde(default)]
    pub cols_integer_main: Vec<usize>,
    /// Secondary-sheet columns coerced to integers.
    #[serde(default)]
    pub cols_integer_extra: Vec<usize>,
    /// Main-sheet blocks.
    pub blocks_main: Vec<SpecCellBlock>,
    /// Secondary-sheet blocks.
    #[serde(default)]
    pub blocks_extra: Vec<SpecCellBlock>,
}

/// Two-sheet workbook input description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecExcelInputSchema {
    /// Secondary sheet name (read from the record, written into the output).
    pub sheet_extra: String,
    /// Main sheet name in the record workbook.
    pub sheet_main: String,
    /// Zero-based probe row; it and all rows above it are dropped.
    pub row_probe: usize,
    /// Known versions.
    pub layouts: Vec<SpecExcelLayout>,
}

impl Default for SpecExcelInputSchema {
    fn default() -> Self {
        Self {
            sheet_extra: "Add New Records".to_string(),
            sheet_main: "Template".to_string(),
            row_probe: 0,
            layouts: derive_default_excel_layouts(),
        }
    }
}

/// List-type data validation bound to a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecDropdownRule {
    /// Target sheet.
    pub sheet: String,
    /// Target range in A1 notation (`W3:W301`).
    pub range: String,
    /// Source list formula (`Lists!$A$2:$A$200`).
    pub formula: String,
}

impl SpecDropdownRule {
    /// Build a rule from string slices.
    pub fn new(sheet: &str, range: &str, formula: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            range: range.to_string(),
            formula: formula.to_string(),
        }
    }
}

/// Versioned descriptor of every template-coupled literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecTemplateSchema {
    /// Schema name/version.
    pub name: String,
    /// Last zero-based row restyled by the formatting restorer.
    pub n_row_restore_max: usize,
    /// Editable columns of the secondary sheet.
    pub cols_editable_extra: Vec<usize>,
    /// CSV placement.
    pub csv: SpecCsvLayout,
    /// Workbook input layouts.
    pub excel: SpecExcelInputSchema,
    /// Dropdown rules re-registered on every output workbook.
    pub dropdowns: Vec<SpecDropdownRule>,
}

impl Default for SpecTemplateSchema {
    fn default() -> Self {
        Self {
            name: "cgv_enrichment_v2".to_string(),
            n_row_restore_max: N_ROW_RESTORE_MAX,
            cols_editable_extra: Vec::new(),
            csv: SpecCsvLayout::default(),
            excel: SpecExcelInputSchema::default(),
            dropdowns: derive_default_dropdown_rules(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LoadedRecords

/// One sliced block ready for the cell writer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecLoadedBlock {
    /// Destination row.
    pub row_dst: usize,
    /// Destination column.
    pub col_dst: usize,
    /// Sliced rows.
    pub grid: TypeGrid,
}

/// Output of the two-sheet workbook loader.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecLoadedWorkbook {
    /// Name of the detected layout version.
    pub layout_name: String,
    /// Blocks for the main sheet.
    pub blocks_main: Vec<SpecLoadedBlock>,
    /// Blocks for the secondary sheet.
    pub blocks_extra: Vec<SpecLoadedBlock>,
    /// Data rows remaining on the main sheet after filtering.
    pub n_rows_main: usize,
}

/// Loaded record file, tagged by the loader that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumLoadedRecords {
    /// Single grid from a CSV file.
    Csv(TypeGrid),
    /// Blocks from a two-sheet workbook.
    Excel(SpecLoadedWorkbook),
}

impl EnumLoadedRecords {
    /// Number of main data rows.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Csv(grid) => grid.len(),
            Self::Excel(wb) => wb.n_rows_main,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{EnumCellValue, SpecTemplateSchema};

    #[test]
    fn cell_text_rendering_drops_integral_fraction() {
        assert_eq!(EnumCellValue::Number(12.0).to_text(), "12");
        assert_eq!(EnumCellValue::Number(12.5).to_text(), "12.5");
        assert_eq!(EnumCellValue::Integer(-3).to_text(), "-3");
        assert_eq!(EnumCellValue::None.to_text(), "");
        assert!(EnumCellValue::String(String::new()).is_blank());
        assert!(!EnumCellValue::Integer(0).is_blank());
    }

    #[test]
    fn default_schema_carries_six_dropdowns_and_two_layouts() {
        let schema = SpecTemplateSchema::default();
        assert_eq!(schema.dropdowns.len(), 6);
        assert_eq!(schema.excel.layouts.len(), 2);
        assert_eq!(schema.n_row_restore_max, 300);
        assert_eq!((schema.csv.row_dst, schema.csv.col_dst), (2, 4));
    }
}
