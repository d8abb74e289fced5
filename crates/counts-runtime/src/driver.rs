//! Parallel per-file driver.
//!
//! Discovers log files, derives each file's reference date from its name,
//! runs the transformation pipeline on a bounded `rayon` pool and writes one
//! counts CSV per file. Files share no state; a failure in one file is
//! logged and recorded, never propagated to its siblings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use counts_core::error::{CountsError, Result};
use counts_core::models::TransformOptions;
use counts_core::settings::Settings;
use counts_core::time_utils::reference_date_from_file_name;
use counts_data::pipeline::{transform_file, FileTransform};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::discovery::{find_log_files, is_output_in, output_path_for};
use crate::writer::write_counts_csv;

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    /// Path of the written CSV, `None` on failure.
    pub output: Option<PathBuf>,
    pub records: usize,
    pub events_parsed: u64,
    pub kept_events: usize,
    pub flagged_devices: usize,
    pub skipped_lines: u64,
    /// Display form of the error that stopped this file.
    pub error: Option<String>,
}

impl FileReport {
    fn written(input: &Path, output: PathBuf, transform: &FileTransform) -> Self {
        Self {
            input: input.to_path_buf(),
            output: Some(output),
            records: transform.records.len(),
            events_parsed: transform.stats.events_parsed,
            kept_events: transform.kept_events,
            flagged_devices: transform.flagged.len(),
            skipped_lines: transform.stats.skipped_total(),
            error: None,
        }
    }

    fn failed(input: &Path, err: &CountsError) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            records: 0,
            events_parsed: 0,
            kept_events: 0,
            flagged_devices: 0,
            skipped_lines: 0,
            error: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals for one driver run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// RFC 3339 timestamp when the run started.
    pub started_at: String,
    pub files_total: usize,
    pub files_written: usize,
    pub files_failed: usize,
    pub elapsed_seconds: f64,
    /// One report per input file, in discovery order.
    pub files: Vec<FileReport>,
}

impl RunSummary {
    /// `Ok` when every file was written, otherwise a
    /// [`CountsError::FilesFailed`] carrying the totals.
    pub fn ensure_success(&self) -> Result<()> {
        if self.files_failed > 0 {
            return Err(CountsError::FilesFailed {
                failed: self.files_failed,
                total: self.files_total,
            });
        }
        Ok(())
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Fans the per-file pipeline out over a worker pool.
#[derive(Debug, Clone)]
pub struct Driver {
    input_dir: PathBuf,
    output_dir: PathBuf,
    extension: Option<String>,
    /// Pool size; `None` uses rayon's default (one per CPU).
    workers: Option<usize>,
    options: TransformOptions,
}

impl Driver {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, options: TransformOptions) -> Self {
        Self {
            input_dir,
            output_dir,
            extension: None,
            workers: None,
            options,
        }
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    /// Build a driver from validated settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let input_dir = settings
            .input_dir
            .clone()
            .ok_or_else(|| CountsError::Config("input directory is not set".into()))?;
        let output_dir = settings
            .output_dir
            .clone()
            .ok_or_else(|| CountsError::Config("output directory is not set".into()))?;

        Ok(Self::new(input_dir, output_dir, settings.transform_options())
            .with_workers(settings.workers)
            .with_extension(settings.extension.clone()))
    }

    /// Transform every discovered file.
    ///
    /// Only a missing input directory or a pool that cannot be built fail the
    /// run; per-file failures are reported in the summary.
    pub fn run(&self) -> Result<RunSummary> {
        if !self.input_dir.is_dir() {
            return Err(CountsError::InputPathNotFound(self.input_dir.clone()));
        }

        let started_at = Utc::now().to_rfc3339();
        let start = std::time::Instant::now();

        let files = self.discover();
        if files.is_empty() {
            warn!("No log files found in {}", self.input_dir.display());
        }
        info!(
            "Beginning transformation of {} files from {}",
            files.len(),
            self.input_dir.display()
        );

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = self.workers {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| CountsError::Config(format!("failed to build worker pool: {e}")))?;

        let mut claims: HashMap<PathBuf, usize> = HashMap::new();
        for file in &files {
            *claims
                .entry(output_path_for(file, &self.output_dir))
                .or_insert(0) += 1;
        }

        let reports: Vec<FileReport> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let output = output_path_for(file, &self.output_dir);
                    match claims.get(&output).copied().unwrap_or(0) {
                        inputs if inputs > 1 => {
                            let err = CountsError::OutputCollision {
                                path: output,
                                inputs,
                            };
                            error!("FAILED transformation of file: {}: {}", file.display(), err);
                            FileReport::failed(file, &err)
                        }
                        _ => self.process_file(file),
                    }
                })
                .collect()
        });

        let files_written = reports.iter().filter(|r| r.is_success()).count();
        let summary = RunSummary {
            started_at,
            files_total: reports.len(),
            files_written,
            files_failed: reports.len() - files_written,
            elapsed_seconds: start.elapsed().as_secs_f64(),
            files: reports,
        };

        info!(
            "Finished transformation: {} written, {} failed in {:.1}s",
            summary.files_written, summary.files_failed, summary.elapsed_seconds
        );
        Ok(summary)
    }

    /// Input files for this run, minus counts files this driver wrote
    /// earlier when the output directory is the input directory.
    fn discover(&self) -> Vec<PathBuf> {
        let output_dir = self.output_dir.canonicalize().ok();
        find_log_files(&self.input_dir, self.extension.as_deref())
            .into_iter()
            .filter(|file| !is_output_in(file, output_dir.as_deref()))
            .collect()
    }

    /// Run one file end to end, converting any failure into a report.
    pub fn process_file(&self, path: &Path) -> FileReport {
        info!("BEGINNING transformation of file: {}", path.display());
        match self.transform_and_write(path) {
            Ok((output, transform)) => {
                info!(
                    "FINISHED transformation of file: {} ({} rows, {} devices dropped)",
                    path.display(),
                    transform.records.len(),
                    transform.flagged.len()
                );
                FileReport::written(path, output, &transform)
            }
            Err(err) => {
                error!("FAILED transformation of file: {}: {}", path.display(), err);
                FileReport::failed(path, &err)
            }
        }
    }

    fn transform_and_write(&self, path: &Path) -> Result<(PathBuf, FileTransform)> {
        let reference = reference_date_from_file_name(path)
            .ok_or_else(|| CountsError::InvalidFileName(path.display().to_string()))?;

        let transform = transform_file(path, reference, &self.options)?;

        let output = output_path_for(path, &self.output_dir);
        write_counts_csv(&output, &transform.records)?;
        Ok((output, transform))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
