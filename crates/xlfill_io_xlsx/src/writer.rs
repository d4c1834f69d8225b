//! Template workbook cell writer.
//!
//! The output workbook is a byte copy of the template; it is opened once,
//! mutated in memory and flushed by [`TemplateWorkbook::save`].

use std::path::{Path, PathBuf};

use umya_spreadsheet::{Cell, Spreadsheet, Worksheet};

use crate::error::XlsxIoError;
use crate::spec::{EnumCellValue, SpecLoadedBlock, TypeGrid};
use crate::util::{cast_col_num, cast_row_num};

/// Stateful editor over one copied template workbook.
pub struct TemplateWorkbook {
    path_file_out: PathBuf,
    book: Spreadsheet,
    if_closed: bool,
}

impl TemplateWorkbook {
    /// Open an existing `.xlsx` file for in-place editing.
    pub fn open(path_file_out: &Path) -> Result<Self, XlsxIoError> {
        let book = umya_spreadsheet::reader::xlsx::read(path_file_out).map_err(|e| {
            XlsxIoError::WorkbookRead {
                path: path_file_out.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            path_file_out: path_file_out.to_path_buf(),
            book,
            if_closed: false,
        })
    }

    /// Mutable access to the underlying workbook, for formatting passes.
    pub fn book_mut(&mut self) -> Result<&mut Spreadsheet, XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        Ok(&mut self.book)
    }

    /// Write `grid` with its first cell at zero-based `(row_dst, col_dst)`.
    ///
    /// Cells outside the grid keep their template content; `None` cells are
    /// written as empty text. Returns the number of cells written.
    pub fn write_grid(
        &mut self,
        sheet_name: &str,
        grid: &TypeGrid,
        row_dst: usize,
        col_dst: usize,
    ) -> Result<usize, XlsxIoError> {
        let sheet = self.sheet_mut(sheet_name)?;

        let mut n_cells = 0usize;
        for (idx_row, row) in grid.iter().enumerate() {
            let n_row = cast_row_num(row_dst + idx_row).map_err(XlsxIoError::IndexOverflow)?;
            for (idx_col, value) in row.iter().enumerate() {
                let n_col =
                    cast_col_num(col_dst + idx_col).map_err(XlsxIoError::IndexOverflow)?;
                write_cell_value(sheet.get_cell_mut((n_col, n_row)), value);
                n_cells += 1;
            }
        }
        Ok(n_cells)
    }

    /// Write every sliced block into one sheet.
    pub fn write_blocks(
        &mut self,
        sheet_name: &str,
        blocks: &[SpecLoadedBlock],
    ) -> Result<usize, XlsxIoError> {
        let mut n_cells = 0usize;
        for block in blocks {
            n_cells += self.write_grid(sheet_name, &block.grid, block.row_dst, block.col_dst)?;
        }
        Ok(n_cells)
    }

    /// Flush workbook to disk. Idempotent.
    pub fn save(&mut self) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Ok(());
        }
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path_file_out).map_err(|e| {
            XlsxIoError::WorkbookWrite {
                path: self.path_file_out.clone(),
                message: e.to_string(),
            }
        })?;
        self.if_closed = true;
        Ok(())
    }

    fn sheet_mut(&mut self, sheet_name: &str) -> Result<&mut Worksheet, XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        self.book
            .get_sheet_by_name_mut(sheet_name)
            .ok_or_else(|| XlsxIoError::SheetNotFound(sheet_name.to_string()))
    }
}

fn write_cell_value(cell: &mut Cell, value: &EnumCellValue) {
    match value {
        EnumCellValue::None => {
            cell.set_value_string("");
        }
        EnumCellValue::String(s) => {
            cell.set_value_string(s.as_str());
        }
        EnumCellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        EnumCellValue::Integer(n) => {
            cell.set_value_number(*n as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rust_xlsxwriter::Workbook;

    use super::TemplateWorkbook;
    use crate::error::XlsxIoError;
    use crate::loader::read_workbook_sheet;
    use crate::spec::{EnumCellValue, SpecLoadedBlock};

    fn s(v: &str) -> EnumCellValue {
        EnumCellValue::String(v.to_string())
    }

    fn write_template(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Template").expect("name");
        sheet.write_string(0, 0, "Title").expect("write");
        sheet.write_string(1, 4, "meta").expect("write");
        workbook.save(path).expect("save");
    }

    #[test]
    fn grid_lands_at_offset_and_header_rows_survive() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.xlsx");
        write_template(&path);

        let mut workbook = TemplateWorkbook::open(&path).expect("open");
        let grid = vec![
            vec![s("a"), EnumCellValue::Integer(12)],
            vec![EnumCellValue::None, EnumCellValue::Number(1.5)],
        ];
        assert_eq!(workbook.write_grid("Template", &grid, 2, 4).expect("write"), 4);
        workbook.save().expect("save");

        let grid_back = read_workbook_sheet(&path, "Template").expect("read");
        assert_eq!(grid_back[0][0], s("Title"));
        assert_eq!(grid_back[1][4], s("meta"));
        assert_eq!(grid_back[2][4], s("a"));
        assert_eq!(grid_back[2][5].to_text(), "12");
        assert_eq!(grid_back[3][5], EnumCellValue::Number(1.5));
        assert!(grid_back[3][4].is_blank());
    }

    #[test]
    fn blocks_are_written_in_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.xlsx");
        write_template(&path);

        let mut workbook = TemplateWorkbook::open(&path).expect("open");
        let blocks = vec![
            SpecLoadedBlock {
                row_dst: 2,
                col_dst: 4,
                grid: vec![vec![s("x")]],
            },
            SpecLoadedBlock {
                row_dst: 2,
                col_dst: 22,
                grid: vec![vec![s("y"), s("z")]],
            },
        ];
        assert_eq!(workbook.write_blocks("Template", &blocks).expect("write"), 3);
        workbook.save().expect("save");

        let grid_back = read_workbook_sheet(&path, "Template").expect("read");
        assert_eq!(grid_back[2][4], s("x"));
        assert_eq!(grid_back[2][23], s("z"));
    }

    #[test]
    fn missing_sheet_and_write_after_save_are_errors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.xlsx");
        write_template(&path);

        let mut workbook = TemplateWorkbook::open(&path).expect("open");
        let err = workbook
            .write_grid("Nope", &vec![vec![s("a")]], 0, 0)
            .expect_err("missing sheet");
        assert!(matches!(err, XlsxIoError::SheetNotFound(_)));

        workbook.save().expect("save");
        workbook.save().expect("idempotent save");
        let err = workbook
            .write_grid("Template", &vec![vec![s("a")]], 2, 4)
            .expect_err("closed");
        assert!(matches!(err, XlsxIoError::Closed));
    }

    #[test]
    fn opening_non_workbook_is_read_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.xlsx");
        std::fs::write(&path, b"not a zip").expect("write");
        assert!(matches!(
            TemplateWorkbook::open(&path),
            Err(XlsxIoError::WorkbookRead { .. })
        ));
    }
}
