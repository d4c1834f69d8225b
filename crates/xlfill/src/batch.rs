//! Batch orchestrator: discovery, sequential template copy, pooled fill.
//!
//! Execution pipeline:
//! 1. Template/input/output validation (configuration errors abort the call).
//! 2. Sequential template copy per discovered record.
//! 3. Load/write/restore/save per record (serial or rayon thread pool).
//!
//! Per-record failures never abort the batch; they remove the partial output
//! and are collected into [`ReportBatch::failures`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use xlfill_io_fs::{
    EnumInputKind, SpecInputFile, copy_template, scan_input_files,
};
use xlfill_io_xlsx::{
    EnumLoadedRecords, TemplateWorkbook, XlsxIoError, load_csv_records, load_excel_records,
    restore_column_styles, restore_formatting,
};

use crate::report::{ReportBatch, ReportBatchBuilder};
use crate::spec::{BatchError, EnumRecordStage, SpecBatchOptions};

/// One copied template waiting to be filled.
#[derive(Debug, Clone)]
struct SpecRecordTask {
    spec_input: SpecInputFile,
    path_file_out: PathBuf,
}

/// Failure of one record, tagged with the stage it could not reach.
#[derive(Debug)]
struct SpecStageError {
    stage: EnumRecordStage,
    exception: String,
}

impl SpecStageError {
    fn new(stage: EnumRecordStage, err: XlsxIoError) -> Self {
        Self {
            stage,
            exception: err.to_string(),
        }
    }
}

type TypeRecordResult = (SpecRecordTask, Result<Vec<String>, SpecStageError>);

/// Fill one template copy per record found in `options.dir_input`.
///
/// Returns `Err` only for configuration problems (template extension, empty
/// input, output directory creation). Failed records are listed in the report.
pub fn run_batch(options: &SpecBatchOptions) -> Result<ReportBatch, BatchError> {
    validate_template_extension(&options.path_template)?;

    let report_scan = scan_input_files(&options.dir_input, &options.spec_scan_options)?;
    if report_scan.is_empty() {
        return Err(BatchError::EmptyInput(options.dir_input.clone()));
    }
    fs::create_dir_all(&options.dir_output).map_err(|e| BatchError::OutputDirInit {
        path: options.dir_output.clone(),
        source: e,
    })?;

    let mut builder_report = ReportBatchBuilder::default();
    builder_report.add_discovered(report_scan.matched_count() as u64);
    for warning in report_scan.warnings {
        builder_report.add_warning(warning);
    }

    let l_tasks = copy_templates(report_scan.files, options, &mut builder_report);
    let l_results = execute_tasks(l_tasks, options, &mut builder_report);
    apply_results(l_results, &mut builder_report);

    let report = builder_report.build();
    tracing::info!("{report}");
    Ok(report)
}

fn validate_template_extension(path_template: &Path) -> Result<(), BatchError> {
    let if_xlsx = path_template
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if if_xlsx {
        Ok(())
    } else {
        Err(BatchError::TemplateExtension(path_template.to_path_buf()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region CopyPhase

fn copy_templates(
    l_inputs: Vec<SpecInputFile>,
    options: &SpecBatchOptions,
    builder_report: &mut ReportBatchBuilder,
) -> Vec<SpecRecordTask> {
    let mut l_tasks = Vec::with_capacity(l_inputs.len());
    for spec_input in l_inputs {
        tracing::debug!(path = %spec_input.path.display(), stage = %EnumRecordStage::Discovered);
        match copy_template(
            &spec_input.path,
            &options.path_template,
            &options.dir_output,
            options.rule_conflict_file,
        ) {
            Ok(spec_copy) if spec_copy.if_skipped => {
                tracing::info!(
                    "{} already exists. Skipping...",
                    spec_copy.path_file_out.display()
                );
                builder_report.add_skipped();
            }
            Ok(spec_copy) => {
                tracing::debug!(
                    path = %spec_input.path.display(),
                    stage = %EnumRecordStage::Copied,
                    path_out = %spec_copy.path_file_out.display()
                );
                builder_report.add_copied();
                l_tasks.push(SpecRecordTask {
                    spec_input,
                    path_file_out: spec_copy.path_file_out,
                });
            }
            Err(e) => {
                tracing::error!(
                    path = %spec_input.path.display(),
                    stage = %EnumRecordStage::Copied,
                    "Couldn't process file: {e}"
                );
                builder_report.add_failure(spec_input.path, EnumRecordStage::Copied, e.to_string());
            }
        }
    }
    l_tasks
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FillPhase

fn execute_tasks(
    l_tasks: Vec<SpecRecordTask>,
    options: &SpecBatchOptions,
    builder_report: &mut ReportBatchBuilder,
) -> Vec<TypeRecordResult> {
    if l_tasks.is_empty() {
        return Vec::new();
    }
    if options.n_workers <= 1 {
        return l_tasks
            .into_iter()
            .map(|task| run_task(task, options))
            .collect();
    }

    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(options.n_workers)
        .build();
    let Ok(thread_pool) = thread_pool else {
        let warning = format!(
            "Failed to initialize thread pool (workers={}); fallback to serial processing.",
            options.n_workers
        );
        tracing::warn!("{warning}");
        builder_report.add_warning(warning);
        return l_tasks
            .into_iter()
            .map(|task| run_task(task, options))
            .collect();
    };

    thread_pool.install(|| {
        l_tasks
            .into_par_iter()
            .map(|task| run_task(task, options))
            .collect::<Vec<_>>()
    })
}

fn run_task(task: SpecRecordTask, options: &SpecBatchOptions) -> TypeRecordResult {
    let res_process = process_record(&task, options);
    match &res_process {
        Ok(_) => {
            tracing::info!(
                path = %task.spec_input.path.display(),
                stage = %EnumRecordStage::Done,
                "processed {}",
                task.spec_input.name_file
            );
        }
        Err(e) => {
            tracing::error!(
                path = %task.spec_input.path.display(),
                stage = %e.stage,
                "Couldn't process file: {}",
                e.exception
            );
            match remove_output(&task.path_file_out) {
                Ok(()) => tracing::debug!(
                    path_out = %task.path_file_out.display(),
                    stage = %EnumRecordStage::Removed
                ),
                Err(err_rm) => tracing::warn!(
                    path_out = %task.path_file_out.display(),
                    "failed to remove partial output: {err_rm}"
                ),
            }
        }
    }
    (task, res_process)
}

/// Load, write, restore and save one record. Returns non-fatal warnings.
fn process_record(
    task: &SpecRecordTask,
    options: &SpecBatchOptions,
) -> Result<Vec<String>, SpecStageError> {
    let schema = &options.schema;
    let path_input = &task.spec_input.path;
    let mut l_warnings = Vec::new();

    let records = load_records(task.spec_input.kind, path_input, options)
        .map_err(|e| SpecStageError::new(EnumRecordStage::Loaded, e))?;
    tracing::debug!(
        path = %path_input.display(),
        stage = %EnumRecordStage::Loaded,
        n_rows = records.row_count()
    );

    let row_dst = match &records {
        EnumLoadedRecords::Csv(_) => schema.csv.row_dst,
        EnumLoadedRecords::Excel(wb) => wb.blocks_main.first().map_or(0, |b| b.row_dst),
    };
    let n_rows = records.row_count();
    if n_rows > 0 && row_dst + n_rows - 1 > schema.n_row_restore_max {
        let warning = format!(
            "{}: {} rows extend past restore cap (row {}); later rows keep pasted formatting",
            path_input.display(),
            n_rows,
            schema.n_row_restore_max
        );
        tracing::warn!("{warning}");
        l_warnings.push(warning);
    }

    let mut workbook = TemplateWorkbook::open(&task.path_file_out)
        .map_err(|e| SpecStageError::new(EnumRecordStage::Written, e))?;
    write_records(&mut workbook, &records, options)
        .map_err(|e| SpecStageError::new(EnumRecordStage::Written, e))?;
    tracing::debug!(path = %path_input.display(), stage = %EnumRecordStage::Written);

    restore_records(&mut workbook, &records, options)
        .map_err(|e| SpecStageError::new(EnumRecordStage::Restored, e))?;
    tracing::debug!(path = %path_input.display(), stage = %EnumRecordStage::Restored);

    workbook
        .save()
        .map_err(|e| SpecStageError::new(EnumRecordStage::Done, e))?;
    Ok(l_warnings)
}

fn load_records(
    kind: EnumInputKind,
    path_input: &Path,
    options: &SpecBatchOptions,
) -> Result<EnumLoadedRecords, XlsxIoError> {
    let schema = &options.schema;
    match kind {
        EnumInputKind::Csv => load_csv_records(
            path_input,
            &options.cols_integer,
            options.if_filter_indicator,
            schema.csv.col_indicator,
        )
        .map(EnumLoadedRecords::Csv),
        EnumInputKind::Xlsx | EnumInputKind::Xlsb => {
            load_excel_records(path_input, &schema.excel, options.if_filter_indicator)
                .map(EnumLoadedRecords::Excel)
        }
    }
}

fn write_records(
    workbook: &mut TemplateWorkbook,
    records: &EnumLoadedRecords,
    options: &SpecBatchOptions,
) -> Result<(), XlsxIoError> {
    let schema = &options.schema;
    match records {
        EnumLoadedRecords::Csv(grid) => {
            workbook.write_grid(
                &options.sheet_name,
                grid,
                schema.csv.row_dst,
                schema.csv.col_dst,
            )?;
        }
        EnumLoadedRecords::Excel(wb) => {
            workbook.write_blocks(&options.sheet_name, &wb.blocks_main)?;
            workbook.write_blocks(&schema.excel.sheet_extra, &wb.blocks_extra)?;
        }
    }
    Ok(())
}

fn restore_records(
    workbook: &mut TemplateWorkbook,
    records: &EnumLoadedRecords,
    options: &SpecBatchOptions,
) -> Result<(), XlsxIoError> {
    let schema = &options.schema;
    let book = workbook.book_mut()?;
    if matches!(records, EnumLoadedRecords::Excel(_)) {
        let sheet_extra = book
            .get_sheet_by_name_mut(&schema.excel.sheet_extra)
            .ok_or_else(|| XlsxIoError::SheetNotFound(schema.excel.sheet_extra.clone()))?;
        restore_column_styles(sheet_extra, &schema.cols_editable_extra, schema.n_row_restore_max)?;
    }
    restore_formatting(book, &options.sheet_name, &options.cols_editable, schema)
}

fn remove_output(path_file_out: &Path) -> io::Result<()> {
    match fs::remove_file(path_file_out) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn apply_results(l_results: Vec<TypeRecordResult>, builder_report: &mut ReportBatchBuilder) {
    for (task, res_process) in l_results {
        match res_process {
            Ok(l_warnings) => {
                builder_report.add_done();
                for warning in l_warnings {
                    builder_report.add_warning(warning);
                }
            }
            Err(e) => {
                builder_report.add_failure(task.spec_input.path, e.stage, e.exception);
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
