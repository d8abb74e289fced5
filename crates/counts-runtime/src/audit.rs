//! Completeness check between a raw log directory and its counts output.

use std::collections::BTreeSet;
use std::path::Path;

use counts_core::error::{CountsError, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::discovery::{file_stem_string, find_log_files, is_output_in, raw_stem_of_output};

/// Result of comparing raw inputs to transformed outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub raw_files: usize,
    pub transformed_files: usize,
    /// Raw stems with no `counts_<stem>.csv`, sorted.
    pub missing: Vec<String>,
    /// Counts files whose raw stem no longer exists, sorted.
    pub orphaned: Vec<String>,
}

impl AuditReport {
    /// Raw minus transformed; negative when outputs outnumber inputs.
    pub fn difference(&self) -> i64 {
        self.raw_files as i64 - self.transformed_files as i64
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Compare stems under `raw_dir` with counts files under `transformed_dir`.
///
/// Raw files are matched by stem. Counts files are not treated as raw
/// inputs when both directories are the same.
pub fn audit(
    raw_dir: &Path,
    transformed_dir: &Path,
    extension: Option<&str>,
) -> Result<AuditReport> {
    if !raw_dir.is_dir() {
        return Err(CountsError::InputPathNotFound(raw_dir.to_path_buf()));
    }

    let output_dir = transformed_dir.canonicalize().ok();
    let raw: BTreeSet<String> = find_log_files(raw_dir, extension)
        .iter()
        .filter(|p| !is_output_in(p, output_dir.as_deref()))
        .map(|p| file_stem_string(p))
        .collect();

    let transformed: BTreeSet<String> = find_log_files(transformed_dir, Some("csv"))
        .iter()
        .filter_map(|p| raw_stem_of_output(p))
        .collect();

    let report = AuditReport {
        raw_files: raw.len(),
        transformed_files: transformed.len(),
        missing: raw.difference(&transformed).cloned().collect(),
        orphaned: transformed.difference(&raw).cloned().collect(),
    };

    info!(
        "Audit: {} raw, {} transformed, difference {}",
        report.raw_files,
        report.transformed_files,
        report.difference()
    );
    for stem in &report.missing {
        warn!("Missing counts file for {}", stem);
    }
    Ok(report)
}
