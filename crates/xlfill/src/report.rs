//! Batch report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::{EnumRecordStage, SpecFileFailure};

/// Aggregate counters and diagnostics for one `run_batch` call.
#[derive(Debug, Default, Clone)]
pub struct ReportBatch {
    /// Number of discovered record files.
    pub cnt_discovered: u64,
    /// Number of template copies created.
    pub cnt_copied: u64,
    /// Number of records skipped because the output already existed.
    pub cnt_skipped: u64,
    /// Number of records fully processed.
    pub cnt_done: u64,
    /// Number of records that failed at any stage.
    pub cnt_failed: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Per-record failures, in input order.
    pub failures: Vec<SpecFileFailure>,
}

impl ReportBatch {
    /// Number of collected failures.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_discovered".to_string(), self.cnt_discovered);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_done".to_string(), self.cnt_done);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} discovered={} copied={} skipped={} done={} failed={} warnings={}",
            dict_counts["cnt_discovered"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_done"],
            dict_counts["cnt_failed"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FILL]"))
    }
}

/// Mutable accumulator for batch statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportBatchBuilder {
    cnt_discovered: u64,
    cnt_copied: u64,
    cnt_skipped: u64,
    cnt_done: u64,
    warnings: Vec<String>,
    failures: Vec<SpecFileFailure>,
}

impl ReportBatchBuilder {
    pub fn add_discovered(&mut self, value: u64) {
        self.cnt_discovered += value;
    }

    pub fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    pub fn add_done(&mut self) {
        self.cnt_done += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped failure.
    pub fn add_failure(&mut self, path: PathBuf, stage: EnumRecordStage, exception: String) {
        self.failures.push(SpecFileFailure {
            path,
            stage,
            exception,
        });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportBatch {
        ReportBatch {
            cnt_discovered: self.cnt_discovered,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            cnt_done: self.cnt_done,
            cnt_failed: self.failures.len() as u64,
            warnings: self.warnings,
            failures: self.failures,
        }
    }
}
