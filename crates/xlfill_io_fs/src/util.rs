use std::fs;
use std::io;
use std::path::Path;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumPatternMode, ScanInputError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecScanPatterns {
    pub(crate) patterns_include_files: Option<TypePatternSeq>,
    pub(crate) patterns_exclude_files: Option<TypePatternSeq>,
}

impl SpecScanPatterns {
    pub(crate) fn from_raw(
        patterns_include_files: Option<&[String]>,
        patterns_exclude_files: Option<&[String]>,
        rule_pattern: EnumPatternMode,
    ) -> Result<Self, ScanInputError> {
        Ok(Self {
            patterns_include_files: _compile(patterns_include_files, rule_pattern)?,
            patterns_exclude_files: _compile(patterns_exclude_files, rule_pattern)?,
        })
    }

    pub(crate) fn should_exclude(&self, name: &str) -> bool {
        !_should_include(name, self.patterns_include_files.as_ref())
            || _should_exclude(name, self.patterns_exclude_files.as_ref())
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumPatternMode,
) -> Result<Option<TypePatternSeq>, ScanInputError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumPatternMode::Literal => Ok(Some(TypePatternSeq::Literal(patterns.to_vec()))),
        EnumPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| ScanInputError::InvalidPattern(e.to_string()))?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypePatternSeq::Glob(l_glob)))
        }
        EnumPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex =
                    Regex::new(pattern).map_err(|e| ScanInputError::InvalidPattern(e.to_string()))?;
                l_regex.push(regex);
            }
            Ok(Some(TypePatternSeq::Regex(l_regex)))
        }
    }
}

fn _is_pattern_matching(value: &str, patterns: &TypePatternSeq) -> bool {
    match patterns {
        TypePatternSeq::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
        TypePatternSeq::Glob(v) => v.iter().any(|p| p.is_match(value)),
        TypePatternSeq::Regex(v) => v.iter().any(|p| p.is_match(value)),
    }
}

fn _should_include(value: &str, patterns: Option<&TypePatternSeq>) -> bool {
    match patterns {
        None => true,
        Some(p) => _is_pattern_matching(value, p),
    }
}

fn _should_exclude(value: &str, patterns: Option<&TypePatternSeq>) -> bool {
    match patterns {
        None => false,
        Some(p) => _is_pattern_matching(value, p),
    }
}

/// Office lock files (`~$book.xlsx`) and dotfiles are never records.
pub(crate) fn is_hidden_name(name: &str) -> bool {
    name.starts_with("~$") || name.starts_with('.')
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy bytes, then metadata. A destination left behind by a failed metadata
/// step is removed before the error is returned.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        discard_on_error(path_file_dst, apply_metadata_linux(path_file_src, path_file_dst))?;
    }
    Ok(())
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn discard_on_error(path_file_dst: &Path, res_step: io::Result<()>) -> io::Result<()> {
    let Err(e) = res_step else {
        return Ok(());
    };
    if let Err(err_rm) = fs::remove_file(path_file_dst)
        && err_rm.kind() != io::ErrorKind::NotFound
    {
        tracing::warn!(
            path = %path_file_dst.display(),
            "failed to remove partial copy: {err_rm}"
        );
    }
    Err(e)
}

#[cfg(target_os = "linux")]
fn apply_metadata_linux(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;

    use super::{SpecScanPatterns, discard_on_error, is_hidden_name};
    use crate::spec::{EnumPatternMode, ScanInputError};

    #[test]
    fn glob_include_and_exclude_combine() {
        let include = vec!["batch_*".to_string()];
        let exclude = vec!["*_old.csv".to_string()];
        let pats =
            SpecScanPatterns::from_raw(Some(&include), Some(&exclude), EnumPatternMode::Glob)
                .expect("compile");

        assert!(!pats.should_exclude("batch_01.csv"));
        assert!(pats.should_exclude("batch_01_old.csv"));
        assert!(pats.should_exclude("other.csv"));
    }

    #[test]
    fn regex_and_literal_modes_work() {
        let include = vec![r"^\d{4}_".to_string()];
        let pats = SpecScanPatterns::from_raw(Some(&include), None, EnumPatternMode::Regex)
            .expect("compile");
        assert!(!pats.should_exclude("2024_records.csv"));
        assert!(pats.should_exclude("records_2024.csv"));

        let include = vec!["cgv".to_string()];
        let pats = SpecScanPatterns::from_raw(Some(&include), None, EnumPatternMode::Literal)
            .expect("compile");
        assert!(!pats.should_exclude("site_cgv_part.csv"));
        assert!(pats.should_exclude("site.csv"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let include = vec!["(".to_string()];
        let err = SpecScanPatterns::from_raw(Some(&include), None, EnumPatternMode::Regex)
            .expect_err("must fail");
        assert!(matches!(err, ScanInputError::InvalidPattern(_)));
    }

    #[test]
    fn lock_files_are_hidden() {
        assert!(is_hidden_name("~$records.xlsx"));
        assert!(is_hidden_name(".DS_Store"));
        assert!(!is_hidden_name("records.xlsx"));
    }

    #[test]
    fn failed_metadata_step_removes_copied_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dst = tmp.path().join("site_template.xlsx");
        fs::write(&path_dst, b"copied").expect("write");

        let err = discard_on_error(&path_dst, Err(io::Error::other("set_file_times")))
            .expect_err("must fail");
        assert_eq!(err.to_string(), "set_file_times");
        assert!(!path_dst.exists());

        fs::write(&path_dst, b"copied").expect("write");
        discard_on_error(&path_dst, Ok(())).expect("ok");
        assert!(path_dst.is_file());
    }
}
