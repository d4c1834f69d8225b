use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xlfill::{
    N_WORKERS_DEFAULT, SpecBatchOptions, render_template_schema, resolve_template_schema,
    run_batch, run_merge, scan_max_row_count,
};
use xlfill_io_fs::{EnumCopyFileConflictStrategy, EnumPatternMode, SpecScanOptions};
use xlfill_io_xlsx::SpecMergeOptions;
use xlfill_io_xlsx::conf::TUP_COLS_EDITABLE_DEFAULT;

#[derive(Parser, Debug)]
#[command(name = "xlfill")]
#[command(about = "Fill copies of a protected Excel template from CSV/Excel records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input file filters shared by every subcommand that scans a directory.
#[derive(Args, Debug)]
struct ScanArgs {
    /// Only keep file names matching one of these patterns
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    include: Option<Vec<String>>,
    /// Drop file names matching one of these patterns
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    exclude: Option<Vec<String>>,
    /// Pattern interpretation: glob, regex or literal
    #[arg(long, default_value = "glob")]
    pattern_mode: EnumPatternMode,
}

impl ScanArgs {
    fn into_scan_options(self) -> SpecScanOptions {
        SpecScanOptions {
            patterns_include_files: self.include,
            patterns_exclude_files: self.exclude,
            rule_pattern: self.pattern_mode,
            ..SpecScanOptions::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill one template copy per record file
    Fill {
        /// Directory with .csv/.xlsx/.xlsb records
        #[arg(long)]
        input_dir: PathBuf,
        /// Template workbook (.xlsx)
        #[arg(long)]
        template: PathBuf,
        /// Output directory (created when missing)
        #[arg(long)]
        output_dir: PathBuf,
        /// Target sheet of the template
        #[arg(long, default_value = "Template")]
        sheet: String,
        /// Editable column indices (zero-based)
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        unprotected: Option<Vec<usize>>,
        /// CSV columns truncated to integers (zero-based)
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        int_columns: Vec<usize>,
        /// Keep existing outputs untouched (same as --on-existing skip)
        #[arg(long, conflicts_with = "on_existing")]
        skip_existing: bool,
        /// Existing output policy: overwrite, skip or error
        #[arg(long)]
        on_existing: Option<EnumCopyFileConflictStrategy>,
        /// Drop rows whose indicator code is 509..=512
        #[arg(long)]
        filter_indicator: bool,
        /// Worker pool size (1 = serial)
        #[arg(long, default_value_t = N_WORKERS_DEFAULT)]
        workers: usize,
        /// TOML template-schema override
        #[arg(long)]
        schema: Option<PathBuf>,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Merge one sheet of many workbooks into a CSV
    Merge {
        /// Directory with .xlsx/.xlsb files
        #[arg(long)]
        excel_dir: PathBuf,
        /// Sheet read from every workbook
        #[arg(long)]
        sheet: String,
        /// Zero-based header row
        #[arg(long, default_value_t = 0)]
        header_row: usize,
        /// Column range START:END (zero-based, end exclusive)
        #[arg(long, value_parser = parse_col_range)]
        columns: Option<(usize, usize)>,
        /// Output CSV path
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Report the record file with the most data rows
    MaxRows {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        schema: Option<PathBuf>,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Print the built-in template schema as TOML
    Schema,
}

fn parse_col_range(value: &str) -> Result<(usize, usize), String> {
    let (c_start, c_end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got {value:?}"))?;
    let idx_start = c_start
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid start {c_start:?}: {e}"))?;
    let idx_end = c_end
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid end {c_end:?}: {e}"))?;
    if idx_end < idx_start {
        return Err(format!("end {idx_end} is before start {idx_start}"));
    }
    Ok((idx_start, idx_end))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Fill {
            input_dir,
            template,
            output_dir,
            sheet,
            unprotected,
            int_columns,
            skip_existing,
            on_existing,
            filter_indicator,
            workers,
            schema,
            scan,
        } => {
            let schema = match resolve_template_schema(schema.as_deref()) {
                Ok(schema) => schema,
                Err(e) => {
                    tracing::error!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            let mut options = SpecBatchOptions::new(input_dir, template, output_dir);
            options.sheet_name = sheet;
            options.cols_editable =
                unprotected.unwrap_or_else(|| TUP_COLS_EDITABLE_DEFAULT.to_vec());
            options.cols_integer = int_columns;
            options.rule_conflict_file = on_existing
                .unwrap_or_else(|| EnumCopyFileConflictStrategy::from_skip_existing(skip_existing));
            options.spec_scan_options = scan.into_scan_options();
            options.if_filter_indicator = filter_indicator;
            options.n_workers = workers;
            options.schema = schema;

            match run_batch(&options) {
                Ok(report) => {
                    if report.failure_count() > 0 {
                        tracing::warn!("Processing done. Failed to process these files:");
                        for failure in &report.failures {
                            tracing::warn!(
                                stage = %failure.stage,
                                "{}: {}",
                                failure.path.display(),
                                failure.exception
                            );
                        }
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Merge {
            excel_dir,
            sheet,
            header_row,
            columns,
            output,
            scan,
        } => {
            let options = SpecMergeOptions {
                dir_excel: excel_dir,
                sheet_name: sheet,
                header_row,
                col_range: columns,
                path_csv_out: output,
            };
            match run_merge(&options, &scan.into_scan_options()) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::MaxRows {
            input_dir,
            schema,
            scan,
        } => {
            let schema = match resolve_template_schema(schema.as_deref()) {
                Ok(schema) => schema,
                Err(e) => {
                    tracing::error!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            match scan_max_row_count(&input_dir, &scan.into_scan_options(), &schema.excel) {
                Ok(report) => {
                    match &report.path_max {
                        Some(path) => println!("{}\t{}", report.n_rows_max, path.display()),
                        None => println!("0\t-"),
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Schema => match render_template_schema(&Default::default()) {
            Ok(c_toml) => {
                print!("{c_toml}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("{e}");
                ExitCode::FAILURE
            }
        },
    }
}
