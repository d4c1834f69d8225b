//! Directory-level sheet merge.

use std::path::PathBuf;

use xlfill_io_fs::{SpecScanOptions, scan_input_files};
use xlfill_io_xlsx::{ReportMerge, SpecMergeOptions, merge_sheets_to_csv};

use crate::spec::RunMergeError;

/// Merge one sheet of every `.xlsx`/`.xlsb` file in `options.dir_excel`.
///
/// `spec_scan_options` supplies include/exclude patterns; record kinds are
/// always narrowed to workbooks.
pub fn run_merge(
    options: &SpecMergeOptions,
    spec_scan_options: &SpecScanOptions,
) -> Result<ReportMerge, RunMergeError> {
    let spec_scan_options = spec_scan_options.clone().with_workbooks_only();
    let report_scan = scan_input_files(&options.dir_excel, &spec_scan_options)?;
    let l_paths: Vec<PathBuf> = report_scan.files.into_iter().map(|f| f.path).collect();
    Ok(merge_sheets_to_csv(&l_paths, options)?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_xlsxwriter::Workbook;
    use xlfill_io_fs::SpecScanOptions;
    use xlfill_io_xlsx::{MergeError, SpecMergeOptions};

    use super::run_merge;
    use crate::spec::RunMergeError;

    #[test]
    fn csv_files_are_ignored_and_empty_dir_is_reported() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir_excel = tmp.path().join("excel");
        fs::create_dir(&dir_excel).expect("mkdir");
        fs::write(dir_excel.join("a.csv"), "id\n1\n").expect("write");

        let options = SpecMergeOptions {
            dir_excel: dir_excel.clone(),
            sheet_name: "Data".to_string(),
            header_row: 0,
            col_range: None,
            path_csv_out: tmp.path().join("merged.csv"),
        };
        assert!(matches!(
            run_merge(&options, &SpecScanOptions::default()),
            Err(RunMergeError::Merge(MergeError::EmptyInput(_)))
        ));

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Data").expect("name");
        sheet.write_string(0, 0, "id").expect("write");
        sheet.write_string(1, 0, "x").expect("write");
        workbook.save(dir_excel.join("a.xlsx")).expect("save");

        let report = run_merge(&options, &SpecScanOptions::default()).expect("merge");
        assert_eq!(report.cnt_files, 1);
        assert_eq!(report.cnt_rows, 1);
        assert!(options.path_csv_out.is_file());
    }

    #[test]
    fn exclude_pattern_drops_workbooks_from_merge() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for name in ["keep.xlsx", "old_keep.xlsx"] {
            let mut workbook = Workbook::new();
            let sheet = workbook.add_worksheet();
            sheet.set_name("Data").expect("name");
            sheet.write_string(0, 0, "id").expect("write");
            sheet.write_string(1, 0, name).expect("write");
            workbook.save(tmp.path().join(name)).expect("save");
        }

        let options = SpecMergeOptions {
            dir_excel: tmp.path().to_path_buf(),
            sheet_name: "Data".to_string(),
            header_row: 0,
            col_range: None,
            path_csv_out: tmp.path().join("merged.csv"),
        };
        let spec_scan_options = SpecScanOptions {
            patterns_exclude_files: Some(vec!["old_*".to_string()]),
            ..SpecScanOptions::default()
        };
        let report = run_merge(&options, &spec_scan_options).expect("merge");
        assert_eq!(report.cnt_files, 1);
        let c_csv = fs::read_to_string(&options.path_csv_out).expect("read");
        assert!(c_csv.contains("keep.xlsx"));
        assert!(!c_csv.contains("old_keep.xlsx"));
    }
}
