//! Record file discovery.

use std::fs;
use std::path::Path;

use crate::spec::{EnumInputKind, ScanInputError, SpecInputFile, SpecScanOptions};
use crate::util::{SpecScanPatterns, is_hidden_name};

/// Result of one directory scan.
#[derive(Debug, Default, Clone)]
pub struct ReportScan {
    /// Number of directory entries inspected.
    pub cnt_scanned: u64,
    /// Accepted record files, sorted by basename.
    pub files: Vec<SpecInputFile>,
    /// Non-fatal warnings collected during the scan.
    pub warnings: Vec<String>,
}

impl ReportScan {
    /// Number of accepted record files.
    pub fn matched_count(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing usable was found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// List record files directly under `dir_input` (no recursion).
///
/// A file is accepted when its extension maps to one of
/// [`SpecScanOptions::kinds_accepted`] and its basename passes the include/exclude
/// patterns. Unreadable entries are reported as warnings, not errors.
pub fn scan_input_files<P>(
    dir_input: P,
    spec_scan_options: &SpecScanOptions,
) -> Result<ReportScan, ScanInputError>
where
    P: AsRef<Path>,
{
    let path_dir_input = dir_input.as_ref().to_path_buf();
    if !path_dir_input.is_dir() {
        return Err(ScanInputError::SourceNotDirectory(path_dir_input));
    }

    let spec_scan_pats = SpecScanPatterns::from_raw(
        spec_scan_options.patterns_include_files.as_deref(),
        spec_scan_options.patterns_exclude_files.as_deref(),
        spec_scan_options.rule_pattern,
    )?;

    let iter_entries =
        fs::read_dir(&path_dir_input).map_err(|e| ScanInputError::ReadDirFailed {
            path: path_dir_input.clone(),
            source: e,
        })?;

    let mut report = ReportScan::default();
    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                report.warnings.push(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_dir_input.display()
                ));
                continue;
            }
        };
        report.cnt_scanned += 1;

        let path_entry = entry.path();
        if !path_entry.is_file() {
            continue;
        }
        let c_name = entry.file_name().to_string_lossy().to_string();
        if spec_scan_options.if_skip_hidden && is_hidden_name(&c_name) {
            continue;
        }
        let Some(kind) = EnumInputKind::from_path(&path_entry) else {
            continue;
        };
        if !spec_scan_options.kinds_accepted.contains(&kind) {
            continue;
        }
        if spec_scan_pats.should_exclude(&c_name) {
            continue;
        }

        report.files.push(SpecInputFile {
            path: path_entry,
            name_file: c_name,
            kind,
        });
    }

    report.files.sort_by(|a, b| a.name_file.cmp(&b.name_file));
    tracing::debug!(
        dir = %path_dir_input.display(),
        scanned = report.cnt_scanned,
        matched = report.matched_count(),
        "input scan finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::scan_input_files;
    use crate::spec::{EnumInputKind, ScanInputError, SpecScanOptions};

    #[test]
    fn scan_keeps_record_kinds_sorted_by_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for name in ["b.csv", "a.xlsx", "c.xlsb", "notes.txt", "~$a.xlsx"] {
            fs::write(tmp.path().join(name), b"x").expect("write");
        }
        fs::create_dir(tmp.path().join("nested.csv")).expect("mkdir");

        let report = scan_input_files(tmp.path(), &SpecScanOptions::default()).expect("scan");
        let l_names: Vec<&str> = report.files.iter().map(|f| f.name_file.as_str()).collect();
        assert_eq!(l_names, vec!["a.xlsx", "b.csv", "c.xlsb"]);
        assert_eq!(report.files[0].kind, EnumInputKind::Xlsx);
        assert_eq!(report.files[1].kind, EnumInputKind::Csv);
        assert_eq!(report.files[2].kind, EnumInputKind::Xlsb);
    }

    #[test]
    fn scan_workbooks_only_drops_csv() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("a.csv"), b"x").expect("write");
        fs::write(tmp.path().join("b.xlsx"), b"x").expect("write");

        let report =
            scan_input_files(tmp.path(), &SpecScanOptions::workbooks_only()).expect("scan");
        assert_eq!(report.matched_count(), 1);
        assert_eq!(report.files[0].name_file, "b.xlsx");
    }

    #[test]
    fn scan_applies_exclude_patterns() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("keep.csv"), b"x").expect("write");
        fs::write(tmp.path().join("drop_me.csv"), b"x").expect("write");

        let options = SpecScanOptions {
            patterns_exclude_files: Some(vec!["drop_*".to_string()]),
            ..SpecScanOptions::default()
        };
        let report = scan_input_files(tmp.path(), &options).expect("scan");
        assert_eq!(report.matched_count(), 1);
        assert_eq!(report.files[0].name_file, "keep.csv");
    }

    #[test]
    fn scan_of_empty_dir_is_empty_not_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let report = scan_input_files(tmp.path(), &SpecScanOptions::default()).expect("scan");
        assert!(report.is_empty());
    }

    #[test]
    fn scan_rejects_missing_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = scan_input_files(tmp.path().join("missing"), &SpecScanOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, ScanInputError::SourceNotDirectory(_)));
    }
}
