//! Stateless helper utilities used by the loader, writer and restorer.

use calamine::Data;

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_INDICATOR_BLACKLIST};
use crate::spec::{EnumCellValue, SpecCellBlock, TypeGrid};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Remove characters with codepoints 1..=31.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c as u32, 1..=31))
        .collect()
}

/// Truncate a decimal value to its integer part.
///
/// Strings are split on the first `.` and the leading part is parsed; text that
/// still does not parse is returned unchanged. Finite floats are truncated.
/// Never fails.
pub fn coerce_integer_value(value: &EnumCellValue) -> EnumCellValue {
    match value {
        EnumCellValue::Integer(n) => EnumCellValue::Integer(*n),
        EnumCellValue::Number(n) => {
            if n.is_finite() && n.abs() < i64::MAX as f64 {
                EnumCellValue::Integer(n.trunc() as i64)
            } else {
                EnumCellValue::Number(*n)
            }
        }
        EnumCellValue::String(s) => {
            let c_head = s.trim().split('.').next().unwrap_or_default();
            match c_head.parse::<i64>() {
                Ok(n) => EnumCellValue::Integer(n),
                Err(_) => EnumCellValue::String(s.clone()),
            }
        }
        EnumCellValue::None => EnumCellValue::None,
    }
}

/// Convert one calamine cell into the pipeline value model.
pub fn convert_calamine_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::None,
        Data::String(s) => EnumCellValue::String(s.clone()),
        Data::Float(n) => EnumCellValue::Number(*n),
        Data::Int(n) => EnumCellValue::Number(*n as f64),
        Data::Bool(b) => EnumCellValue::String(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => EnumCellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => EnumCellValue::String(s.clone()),
        Data::DurationIso(s) => EnumCellValue::String(s.clone()),
        Data::Error(e) => EnumCellValue::String(format!("#{e:?}")),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridTransforms

/// Pad rows to the widest row and turn missing values into empty text.
pub fn fill_missing(grid: &mut TypeGrid) {
    let n_width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in grid.iter_mut() {
        row.resize(n_width, EnumCellValue::None);
        for cell in row.iter_mut() {
            if matches!(cell, EnumCellValue::None) {
                *cell = EnumCellValue::String(String::new());
            }
        }
    }
}

/// Apply [`strip_control_chars`] to every text cell.
pub fn sanitize_grid(grid: &mut TypeGrid) {
    for cell in grid.iter_mut().flatten() {
        if let EnumCellValue::String(s) = cell {
            if s.chars().any(|c| matches!(c as u32, 1..=31)) {
                *s = strip_control_chars(s);
            }
        }
    }
}

/// Apply [`coerce_integer_value`] to the given columns; out-of-range indices are ignored.
pub fn coerce_grid_columns(grid: &mut TypeGrid, cols_integer: &[usize]) {
    for row in grid.iter_mut() {
        for &n_col in cols_integer {
            if let Some(cell) = row.get_mut(n_col) {
                *cell = coerce_integer_value(cell);
            }
        }
    }
}

/// Whether a row's indicator cell holds a blacklisted code.
pub fn is_row_blacklisted(row: &[EnumCellValue], col_indicator: usize) -> bool {
    let Some(cell) = row.get(col_indicator) else {
        return false;
    };
    match coerce_integer_value(cell) {
        EnumCellValue::Integer(n) => TUP_INDICATOR_BLACKLIST.contains(&n),
        _ => false,
    }
}

/// Drop blacklisted rows; returns the number of dropped rows.
pub fn filter_blacklisted_rows(grid: &mut TypeGrid, col_indicator: usize) -> usize {
    let n_before = grid.len();
    grid.retain(|row| !is_row_blacklisted(row, col_indicator));
    n_before - grid.len()
}

/// Slice `block`'s source columns out of every row; missing cells become `None`.
pub fn slice_block_columns(grid: &TypeGrid, block: &SpecCellBlock) -> TypeGrid {
    grid.iter()
        .map(|row| {
            (block.col_start_inclusive..block.col_end_exclusive)
                .map(|n_col| row.get(n_col).cloned().unwrap_or(EnumCellValue::None))
                .collect()
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Coordinates

/// Zero-based row index to umya's one-based row number.
pub fn cast_row_num(value: usize) -> Result<u32, String> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(format!("row index overflow: {value}"));
    }
    u32::try_from(value + 1).map_err(|_| format!("row index overflow: {value}"))
}

/// Zero-based column index to umya's one-based column number.
pub fn cast_col_num(value: usize) -> Result<u32, String> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(format!("column index overflow: {value}"));
    }
    u32::try_from(value + 1).map_err(|_| format!("column index overflow: {value}"))
}

/// Canonical sqref form used to compare validation ranges.
pub fn normalize_sqref(range: &str) -> String {
    range.replace(' ', "").replace('$', "").to_ascii_uppercase()
}

/// Validation formulas are stored without a leading `=`.
pub fn normalize_formula(formula: &str) -> String {
    let trimmed = formula.trim();
    trimmed.strip_prefix('=').unwrap_or(trimmed).to_string()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
