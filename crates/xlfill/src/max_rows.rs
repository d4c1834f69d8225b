//! Largest-record scan used to size templates before a batch.

use std::path::{Path, PathBuf};

use xlfill_io_fs::{ScanInputError, SpecScanOptions, scan_input_files};
use xlfill_io_xlsx::{SpecExcelInputSchema, count_record_rows};

/// Outcome of [`scan_max_row_count`].
#[derive(Debug, Default, Clone)]
pub struct ReportMaxRows {
    /// Number of record files inspected.
    pub cnt_files: usize,
    /// Largest data-row count seen.
    pub n_rows_max: usize,
    /// File holding `n_rows_max` rows; first in name order on ties.
    pub path_max: Option<PathBuf>,
    /// Files that could not be read.
    pub failures: Vec<(PathBuf, String)>,
}

/// Count data rows of every record in `dir_input`, sequentially.
pub fn scan_max_row_count(
    dir_input: &Path,
    spec_scan_options: &SpecScanOptions,
    schema: &SpecExcelInputSchema,
) -> Result<ReportMaxRows, ScanInputError> {
    let report_scan = scan_input_files(dir_input, spec_scan_options)?;

    let mut report = ReportMaxRows {
        cnt_files: report_scan.matched_count(),
        ..ReportMaxRows::default()
    };
    for spec_input in report_scan.files {
        match count_record_rows(&spec_input.path, spec_input.kind.is_workbook(), schema) {
            Ok(n_rows) => {
                tracing::debug!(path = %spec_input.path.display(), n_rows);
                if report.path_max.is_none() || n_rows > report.n_rows_max {
                    report.n_rows_max = n_rows;
                    report.path_max = Some(spec_input.path);
                }
            }
            Err(e) => {
                tracing::error!(path = %spec_input.path.display(), "Couldn't count rows: {e}");
                report.failures.push((spec_input.path, e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use xlfill_io_fs::{EnumPatternMode, SpecScanOptions};
    use xlfill_io_xlsx::SpecExcelInputSchema;

    use super::scan_max_row_count;

    #[test]
    fn largest_record_is_reported() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("a.csv"), "h\n1\n2\n").expect("write");
        fs::write(tmp.path().join("b.csv"), "h\n1\n2\n3\n4\n").expect("write");
        fs::write(tmp.path().join("c.csv"), "h\n1\n").expect("write");
        fs::write(tmp.path().join("broken.xlsx"), b"nope").expect("write");

        let schema = SpecExcelInputSchema::default();
        let report =
            scan_max_row_count(tmp.path(), &SpecScanOptions::default(), &schema).expect("scan");
        assert_eq!(report.cnt_files, 4);
        assert_eq!(report.n_rows_max, 4);
        assert!(report.path_max.expect("max").ends_with("b.csv"));
        assert_eq!(report.failures.len(), 1);

        let spec_scan_options = SpecScanOptions {
            patterns_include_files: Some(vec![r"^[ac]\.csv$".to_string()]),
            rule_pattern: EnumPatternMode::Regex,
            ..SpecScanOptions::default()
        };
        let report = scan_max_row_count(tmp.path(), &spec_scan_options, &schema).expect("scan");
        assert_eq!(report.cnt_files, 2);
        assert_eq!(report.n_rows_max, 2);
        assert!(report.path_max.expect("max").ends_with("a.csv"));
        assert!(report.failures.is_empty());
    }
}
