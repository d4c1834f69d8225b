//! Sheet merger kernel: one named sheet of many workbooks into one CSV.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::conf::C_MERGE_TAG_COLUMN;
use crate::error::{MergeError, XlsxIoError};
use crate::loader::read_workbook_sheet;

/// Merge call options.
#[derive(Debug, Clone)]
pub struct SpecMergeOptions {
    /// Directory the workbooks came from (used in diagnostics).
    pub dir_excel: PathBuf,
    /// Sheet read from every workbook.
    pub sheet_name: String,
    /// Zero-based header row; earlier rows are skipped.
    pub header_row: usize,
    /// Optional zero-based column range `[start, end)` applied before alignment.
    pub col_range: Option<(usize, usize)>,
    /// Output CSV path.
    pub path_csv_out: PathBuf,
}

/// Merge outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMerge {
    /// Number of merged workbooks.
    pub cnt_files: usize,
    /// Number of data rows written.
    pub cnt_rows: usize,
    /// Output columns, tag column included.
    pub l_columns: Vec<String>,
    /// Written CSV path.
    pub path_csv_out: PathBuf,
}

impl fmt::Display for ReportMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Merged {} rows from {} files into {} ({} columns)",
            self.cnt_rows,
            self.cnt_files,
            self.path_csv_out.display(),
            self.l_columns.len()
        )
    }
}

/// Rows of one workbook, already mapped onto the shared column list.
struct SpecMergedPart {
    name_file: String,
    rows: Vec<Vec<(usize, String)>>,
}

/// Merge `sheet_name` of every workbook in `l_paths` into one CSV.
///
/// Files are processed in descending file-name order. Columns are aligned by
/// header text in first-seen order and a `file_name` column is appended last.
/// A workbook without the sheet fails the whole merge; nothing is written then.
pub fn merge_sheets_to_csv(
    l_paths: &[PathBuf],
    options: &SpecMergeOptions,
) -> Result<ReportMerge, MergeError> {
    if l_paths.is_empty() {
        return Err(MergeError::EmptyInput(options.dir_excel.clone()));
    }

    let mut l_paths_sorted: Vec<&PathBuf> = l_paths.iter().collect();
    l_paths_sorted.sort_by(|a, b| derive_file_name(b).cmp(&derive_file_name(a)));

    let mut l_columns: Vec<String> = Vec::new();
    let mut map_columns: HashMap<String, usize> = HashMap::new();
    let mut l_parts: Vec<SpecMergedPart> = Vec::with_capacity(l_paths_sorted.len());

    for path in l_paths_sorted {
        let (l_header, rows) = read_sheet_as_text(path, options)?;
        let l_idx_global: Vec<usize> = l_header
            .into_iter()
            .map(|name| {
                *map_columns.entry(name.clone()).or_insert_with(|| {
                    l_columns.push(name);
                    l_columns.len() - 1
                })
            })
            .collect();

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(idx_local, value)| (l_idx_global[idx_local], value))
                    .collect()
            })
            .collect::<Vec<_>>();
        tracing::debug!(path = %path.display(), n_rows = rows.len(), "sheet read for merge");
        l_parts.push(SpecMergedPart {
            name_file: derive_file_name(path),
            rows,
        });
    }

    let cnt_rows = write_merged_csv(&options.path_csv_out, &l_columns, &l_parts)?;
    l_columns.push(C_MERGE_TAG_COLUMN.to_string());

    let report = ReportMerge {
        cnt_files: l_parts.len(),
        cnt_rows,
        l_columns,
        path_csv_out: options.path_csv_out.clone(),
    };
    tracing::info!("{report}");
    Ok(report)
}

fn derive_file_name(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Header names and data rows of one sheet, rendered as text and column-restricted.
fn read_sheet_as_text(
    path: &Path,
    options: &SpecMergeOptions,
) -> Result<(Vec<String>, Vec<Vec<String>>), XlsxIoError> {
    let grid = read_workbook_sheet(path, &options.sheet_name)?;
    let n_width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let (idx_start, idx_end) = match options.col_range {
        Some((start, end)) => (start.min(n_width), end.min(n_width).max(start.min(n_width))),
        None => (0, n_width),
    };

    let derive_text_row = |n_row: usize| -> Vec<String> {
        (idx_start..idx_end)
            .map(|idx_col| {
                grid.get(n_row)
                    .and_then(|row| row.get(idx_col))
                    .map(|v| v.to_text())
                    .unwrap_or_default()
            })
            .collect()
    };

    let l_header = dedupe_header_names(derive_text_row(options.header_row), idx_start);
    let rows = ((options.header_row + 1)..grid.len())
        .map(derive_text_row)
        .collect();
    Ok((l_header, rows))
}

/// Blank names become `Unnamed: <col>`; repeats get a `.N` suffix.
fn dedupe_header_names(l_header: Vec<String>, idx_start: usize) -> Vec<String> {
    let mut map_seen: HashMap<String, usize> = HashMap::new();
    l_header
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = if name.trim().is_empty() {
                format!("Unnamed: {}", idx_start + idx)
            } else {
                name
            };
            let cnt = map_seen.entry(name.clone()).or_insert(0);
            let name_out = if *cnt == 0 {
                name
            } else {
                format!("{name}.{cnt}")
            };
            *cnt += 1;
            name_out
        })
        .collect()
}

fn write_merged_csv(
    path_csv_out: &Path,
    l_columns: &[String],
    l_parts: &[SpecMergedPart],
) -> Result<usize, MergeError> {
    let map_err = |e: csv::Error| MergeError::Write {
        path: path_csv_out.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path_csv_out).map_err(map_err)?;

    let mut l_header: Vec<&str> = l_columns.iter().map(String::as_str).collect();
    l_header.push(C_MERGE_TAG_COLUMN);
    writer.write_record(&l_header).map_err(map_err)?;

    let mut cnt_rows = 0usize;
    for part in l_parts {
        for row in &part.rows {
            let mut l_record = vec![String::new(); l_columns.len()];
            for (idx_global, value) in row {
                l_record[*idx_global] = value.clone();
            }
            l_record.push(part.name_file.clone());
            writer.write_record(&l_record).map_err(map_err)?;
            cnt_rows += 1;
        }
    }
    writer
        .flush()
        .map_err(|e| map_err(csv::Error::from(e)))?;
    Ok(cnt_rows)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use rust_xlsxwriter::Workbook;

    use super::{SpecMergeOptions, merge_sheets_to_csv};
    use crate::error::{MergeError, XlsxIoError};

    fn write_workbook(path: &Path, sheet_name: &str, rows: &[Vec<&str>]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name).expect("name");
        for (n_row, row) in rows.iter().enumerate() {
            for (n_col, value) in row.iter().enumerate() {
                if let Ok(num) = value.parse::<f64>() {
                    sheet
                        .write_number(n_row as u32, n_col as u16, num)
                        .expect("write");
                } else {
                    sheet
                        .write_string(n_row as u32, n_col as u16, *value)
                        .expect("write");
                }
            }
        }
        workbook.save(path).expect("save");
    }

    fn options(dir: &Path, header_row: usize) -> SpecMergeOptions {
        SpecMergeOptions {
            dir_excel: dir.to_path_buf(),
            sheet_name: "Data".to_string(),
            header_row,
            col_range: None,
            path_csv_out: dir.join("merged.csv"),
        }
    }

    fn read_csv(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .expect("open csv");
        reader
            .records()
            .map(|r| r.expect("record").iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn three_files_of_five_rows_merge_in_descending_order() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut l_paths: Vec<PathBuf> = Vec::new();
        for name in ["a.xlsx", "c.xlsx", "b.xlsx"] {
            let path = tmp.path().join(name);
            let mut rows = vec![vec!["id", "value"]];
            for _ in 0..5 {
                rows.push(vec![name, "3"]);
            }
            write_workbook(&path, "Data", &rows);
            l_paths.push(path);
        }

        let report = merge_sheets_to_csv(&l_paths, &options(tmp.path(), 0)).expect("merge");
        assert_eq!(report.cnt_files, 3);
        assert_eq!(report.cnt_rows, 15);
        assert_eq!(report.l_columns, vec!["id", "value", "file_name"]);

        let records = read_csv(&report.path_csv_out);
        assert_eq!(records.len(), 16);
        assert_eq!(records[0], vec!["id", "value", "file_name"]);
        assert_eq!(records[1], vec!["c.xlsx", "3", "c.xlsx"]);
        assert_eq!(records[6][2], "b.xlsx");
        assert_eq!(records[15][2], "a.xlsx");
    }

    #[test]
    fn columns_align_by_header_name_and_range_applies_first() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_b = tmp.path().join("b.xlsx");
        let path_a = tmp.path().join("a.xlsx");
        write_workbook(
            &path_b,
            "Data",
            &[vec!["title"], vec!["skip", "x", "y"], vec!["s", "1", "2"]],
        );
        write_workbook(
            &path_a,
            "Data",
            &[vec!["title"], vec!["skip", "y", "z"], vec!["s", "5", "6"]],
        );

        let mut opts = options(tmp.path(), 1);
        opts.col_range = Some((1, 3));
        let report = merge_sheets_to_csv(&[path_a, path_b], &opts).expect("merge");
        assert_eq!(report.l_columns, vec!["x", "y", "z", "file_name"]);

        let records = read_csv(&report.path_csv_out);
        assert_eq!(records[1], vec!["1", "2", "", "b.xlsx"]);
        assert_eq!(records[2], vec!["", "5", "6", "a.xlsx"]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let opts = options(tmp.path(), 0);
        let err = merge_sheets_to_csv(&[], &opts).expect_err("empty");
        assert!(matches!(err, MergeError::EmptyInput(_)));
        assert!(err.to_string().contains("No Excel files"));
        assert!(!opts.path_csv_out.exists());
    }

    #[test]
    fn workbook_without_sheet_fails_whole_merge() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_good = tmp.path().join("a.xlsx");
        let path_bad = tmp.path().join("b.xlsx");
        write_workbook(&path_good, "Data", &[vec!["id"], vec!["1"]]);
        write_workbook(&path_bad, "Other", &[vec!["id"], vec!["1"]]);

        let opts = options(tmp.path(), 0);
        let err = merge_sheets_to_csv(&[path_good, path_bad], &opts).expect_err("missing sheet");
        assert!(matches!(
            err,
            MergeError::Read(XlsxIoError::StructuralMismatch { .. })
        ));
        assert!(!opts.path_csv_out.exists());
    }

    #[test]
    fn blank_and_repeated_headers_are_renamed() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("a.xlsx");
        write_workbook(&path, "Data", &[vec!["k", "", "k"], vec!["1", "2", "3"]]);
        let report = merge_sheets_to_csv(&[path], &options(tmp.path(), 0)).expect("merge");
        assert_eq!(report.l_columns, vec!["k", "Unnamed: 1", "k.1", "file_name"]);
    }
}
