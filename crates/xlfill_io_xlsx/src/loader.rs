//! Record loading: CSV grids and two-sheet workbooks.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};

use crate::conf::{C_LABEL_UNIT, C_LABEL_UUID};
use crate::error::XlsxIoError;
use crate::spec::{
    EnumCellValue, SpecCellBlock, SpecExcelInputSchema, SpecExcelLayout, SpecLoadedBlock,
    SpecLoadedWorkbook, TypeGrid,
};
use crate::util::{
    coerce_grid_columns, convert_calamine_data, fill_missing, filter_blacklisted_rows,
    sanitize_grid, slice_block_columns,
};

type TypeWorkbook = Sheets<BufReader<File>>;

////////////////////////////////////////////////////////////////////////////////
// #region CsvLoading

/// Load a CSV record file.
///
/// The first row is a header/version marker and is dropped. Missing cells become
/// empty text, control characters are stripped, `cols_integer` are truncated to
/// integers and, when `if_filter` is set, rows with a blacklisted indicator code
/// in `col_indicator` are removed.
pub fn load_csv_records(
    path: &Path,
    cols_integer: &[usize],
    if_filter: bool,
    col_indicator: usize,
) -> Result<TypeGrid, XlsxIoError> {
    let mut grid = read_csv_grid(path)?;
    if !grid.is_empty() {
        grid.remove(0);
    }

    fill_missing(&mut grid);
    sanitize_grid(&mut grid);
    coerce_grid_columns(&mut grid, cols_integer);
    if if_filter {
        let n_dropped = filter_blacklisted_rows(&mut grid, col_indicator);
        if n_dropped > 0 {
            tracing::debug!(path = %path.display(), n_dropped, "indicator rows filtered");
        }
    }
    Ok(grid)
}

/// Read file and convert to UTF-8, falling back to Windows-1252.
fn read_file_as_utf8(path: &Path) -> Result<String, XlsxIoError> {
    let bytes = std::fs::read(path).map_err(|e| XlsxIoError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn read_csv_grid(path: &Path) -> Result<TypeGrid, XlsxIoError> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = TypeGrid::new();
    for result in reader.records() {
        let record = result.map_err(|e| XlsxIoError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        grid.push(
            record
                .iter()
                .map(|field| EnumCellValue::String(field.to_string()))
                .collect(),
        );
    }
    Ok(grid)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookLoading

/// Load a two-sheet workbook record (`.xlsx`/`.xlsb`).
///
/// The probe row of the main sheet decides the layout version: it must contain
/// the `uuid` label, and the presence of `Unit` selects between layouts. A layout
/// whose labels are not at their declared columns is rejected rather than sliced.
pub fn load_excel_records(
    path: &Path,
    schema: &SpecExcelInputSchema,
    if_filter: bool,
) -> Result<SpecLoadedWorkbook, XlsxIoError> {
    let mut workbook = open_record_workbook(path)?;
    let mut grid_main = read_sheet_grid(&mut workbook, path, &schema.sheet_main)?;
    let mut grid_extra = read_sheet_grid(&mut workbook, path, &schema.sheet_extra)?;

    let l_probe: Vec<String> = grid_main
        .get(schema.row_probe)
        .map(|row| row.iter().map(|v| v.to_text().trim().to_string()).collect())
        .unwrap_or_default();
    let layout = detect_layout(path, &l_probe, &schema.layouts)?;
    tracing::debug!(path = %path.display(), layout = %layout.name, "workbook layout detected");

    drop_leading_rows(&mut grid_main, schema.row_probe + 1);
    drop_leading_rows(&mut grid_extra, schema.row_probe + 1);

    fill_missing(&mut grid_main);
    fill_missing(&mut grid_extra);
    sanitize_grid(&mut grid_main);
    sanitize_grid(&mut grid_extra);
    coerce_grid_columns(&mut grid_main, &layout.cols_integer_main);
    coerce_grid_columns(&mut grid_extra, &layout.cols_integer_extra);
    if if_filter {
        filter_blacklisted_rows(&mut grid_main, layout.col_indicator);
    }

    let derive_blocks = |grid: &TypeGrid, blocks: &[SpecCellBlock]| {
        blocks
            .iter()
            .map(|block| SpecLoadedBlock {
                row_dst: block.row_dst,
                col_dst: block.col_dst,
                grid: slice_block_columns(grid, block),
            })
            .collect::<Vec<_>>()
    };

    Ok(SpecLoadedWorkbook {
        layout_name: layout.name.clone(),
        blocks_main: derive_blocks(&grid_main, &layout.blocks_main),
        blocks_extra: derive_blocks(&grid_extra, &layout.blocks_extra),
        n_rows_main: grid_main.len(),
    })
}

fn detect_layout<'a>(
    path: &Path,
    l_probe: &[String],
    layouts: &'a [SpecExcelLayout],
) -> Result<&'a SpecExcelLayout, XlsxIoError> {
    let mismatch = |message: String| XlsxIoError::StructuralMismatch {
        path: path.to_path_buf(),
        message,
    };

    if !l_probe.iter().any(|v| v == C_LABEL_UUID) {
        return Err(mismatch(format!(
            "probe row has no {C_LABEL_UUID:?} label; not a known template"
        )));
    }
    let if_has_unit = l_probe.iter().any(|v| v == C_LABEL_UNIT);
    let layout = layouts
        .iter()
        .find(|l| l.if_has_unit == if_has_unit)
        .ok_or_else(|| mismatch(format!("no layout registered for has_unit={if_has_unit}")))?;

    let label_at = |n_col: usize| l_probe.get(n_col).map(String::as_str).unwrap_or_default();
    if label_at(layout.col_uuid) != C_LABEL_UUID {
        return Err(mismatch(format!(
            "layout {:?} expects {C_LABEL_UUID:?} at column {}",
            layout.name, layout.col_uuid
        )));
    }
    if let Some(n_col_unit) = layout.col_unit
        && label_at(n_col_unit) != C_LABEL_UNIT
    {
        return Err(mismatch(format!(
            "layout {:?} expects {C_LABEL_UNIT:?} at column {n_col_unit}",
            layout.name
        )));
    }
    Ok(layout)
}

fn open_record_workbook(path: &Path) -> Result<TypeWorkbook, XlsxIoError> {
    open_workbook_auto(path).map_err(|e| XlsxIoError::WorkbookRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a sheet into an absolutely addressed grid.
///
/// A missing sheet is a structural mismatch, not a read failure.
pub(crate) fn read_sheet_grid(
    workbook: &mut TypeWorkbook,
    path: &Path,
    sheet_name: &str,
) -> Result<TypeGrid, XlsxIoError> {
    if !workbook.sheet_names().iter().any(|n| n == sheet_name) {
        return Err(XlsxIoError::StructuralMismatch {
            path: path.to_path_buf(),
            message: format!("missing sheet {sheet_name:?}"),
        });
    }
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| XlsxIoError::WorkbookRead {
            path: path.to_path_buf(),
            message: format!("sheet {sheet_name:?}: {e}"),
        })?;
    Ok(derive_grid_from_range(&range))
}

/// Open a workbook and read one sheet.
pub(crate) fn read_workbook_sheet(path: &Path, sheet_name: &str) -> Result<TypeGrid, XlsxIoError> {
    let mut workbook = open_record_workbook(path)?;
    read_sheet_grid(&mut workbook, path, sheet_name)
}

/// calamine ranges start at the first used cell; pad so indices stay absolute.
fn derive_grid_from_range(range: &Range<Data>) -> TypeGrid {
    let Some((n_row_start, n_col_start)) = range.start() else {
        return TypeGrid::new();
    };

    let mut grid: TypeGrid = vec![Vec::new(); n_row_start as usize];
    for row in range.rows() {
        let mut l_row = vec![EnumCellValue::None; n_col_start as usize];
        l_row.extend(row.iter().map(convert_calamine_data));
        grid.push(l_row);
    }
    grid
}

fn drop_leading_rows(grid: &mut TypeGrid, n_rows: usize) {
    if n_rows >= grid.len() {
        grid.clear();
    } else {
        grid.drain(..n_rows);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowCounting

/// Number of data rows in a record file (first/probe rows excluded, no filtering).
pub fn count_record_rows(
    path: &Path,
    if_workbook: bool,
    schema: &SpecExcelInputSchema,
) -> Result<usize, XlsxIoError> {
    if if_workbook {
        let grid = read_workbook_sheet(path, &schema.sheet_main)?;
        return Ok(grid.len().saturating_sub(schema.row_probe + 1));
    }
    Ok(read_csv_grid(path)?.len().saturating_sub(1))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
