//! Template cloning for one record file.

use std::path::{Path, PathBuf};

use crate::spec::{CopyTemplateError, EnumCopyFileConflictStrategy, SpecTemplateCopy};
use crate::util::copy_file_with_metadata;

/// Derive `<record-stem>_<template-file-name>`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use xlfill_io_fs::derive_output_file_name;
///
/// let name = derive_output_file_name(
///     Path::new("in/site_a.csv"),
///     Path::new("tpl/CGV_enrichment_template_v2.xlsx"),
/// );
/// assert_eq!(name.as_deref(), Some("site_a_CGV_enrichment_template_v2.xlsx"));
/// ```
pub fn derive_output_file_name(path_record: &Path, path_template: &Path) -> Option<String> {
    let c_stem = path_record.file_stem()?.to_string_lossy();
    let c_name_template = path_template.file_name()?.to_string_lossy();
    Some(format!("{c_stem}_{c_name_template}"))
}

/// Clone `path_template` into `dir_output` under the name derived from `path_record`.
///
/// With [`EnumCopyFileConflictStrategy::Skip`] an existing output is left untouched
/// and reported with `if_skipped = true`. No locking is performed; callers must
/// guarantee a single writer per output path.
pub fn copy_template<P, Q, R>(
    path_record: P,
    path_template: Q,
    dir_output: R,
    rule_conflict_file: EnumCopyFileConflictStrategy,
) -> Result<SpecTemplateCopy, CopyTemplateError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let path_record = path_record.as_ref();
    let path_template = path_template.as_ref();

    if !path_template.is_file() {
        return Err(CopyTemplateError::TemplateNotFile(
            path_template.to_path_buf(),
        ));
    }
    let c_name_out = derive_output_file_name(path_record, path_template)
        .ok_or_else(|| CopyTemplateError::InvalidRecordName(path_record.to_path_buf()))?;
    let path_file_out: PathBuf = dir_output.as_ref().join(c_name_out);

    if should_skip_file_conflict(&path_file_out, rule_conflict_file)? {
        return Ok(SpecTemplateCopy {
            if_skipped: true,
            path_file_out,
        });
    }

    copy_file_with_metadata(path_template, &path_file_out).map_err(|e| {
        CopyTemplateError::CopyFailed {
            path: path_file_out.clone(),
            source: e,
        }
    })?;

    Ok(SpecTemplateCopy {
        if_skipped: false,
        path_file_out,
    })
}

fn should_skip_file_conflict(
    path_dst: &Path,
    rule_conflict: EnumCopyFileConflictStrategy,
) -> Result<bool, CopyTemplateError> {
    if !path_dst.exists() {
        return Ok(false);
    }
    if path_dst.is_dir() {
        return Err(CopyTemplateError::DestinationIsDirectory(
            path_dst.to_path_buf(),
        ));
    }

    match rule_conflict {
        EnumCopyFileConflictStrategy::Skip => Ok(true),
        EnumCopyFileConflictStrategy::Error => Err(CopyTemplateError::DestinationExists(
            path_dst.to_path_buf(),
        )),
        EnumCopyFileConflictStrategy::Overwrite => Ok(false),
    }
}
