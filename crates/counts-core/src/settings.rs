use clap::{CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CountsError, Result};
use crate::models::{EventClass, TimestampFormat, TransformOptions, DEFAULT_Z_THRESHOLD};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Aggregate wireless authentication logs into hourly per-building counts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wifi-counts",
    about = "Aggregate wireless authentication logs into hourly per-building counts",
    version
)]
pub struct Settings {
    /// Directory holding decompressed daily log files
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory receiving one counts CSV per log file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Timestamp layout of the log generation being processed
    #[arg(long, value_enum, default_value_t = TimestampFormat::NumericPrefix)]
    pub format: TimestampFormat,

    /// Event class to count (repeatable)
    #[arg(long = "event", value_enum)]
    pub events: Vec<EventClass>,

    /// Literal marker substring selecting lines (repeatable, overrides --event)
    #[arg(long = "marker")]
    pub markers: Vec<String>,

    /// z-score magnitude above which all of a device's events are dropped
    #[arg(long, default_value_t = DEFAULT_Z_THRESHOLD)]
    pub z_threshold: f64,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Only process input files with this extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Compare raw and transformed directories instead of transforming
    #[arg(long)]
    pub audit: bool,

    /// JSON config file supplying values for flags not given on the command line
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(
        long,
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path (stderr when absent)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Optional JSON configuration, by default `~/.wifi-counts/config.json`.
///
/// Every field is optional; command-line flags always win.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TimestampFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventClass>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Default location of the config file, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| Self::path_in(&home))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".wifi-counts").join("config.json")
    }

    /// Read and parse a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CountsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments, merge the config file and validate.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect(), ConfigFile::default_path())
    }

    /// Same as [`Settings::load`] but with an explicit argument list and
    /// default config location, so tests never touch the real home directory.
    pub fn load_from_args(
        args: Vec<std::ffi::OsString>,
        default_config: Option<PathBuf>,
    ) -> Result<Self> {
        let matches = Settings::command().get_matches_from(args);
        let mut settings = Settings::from_arg_matches(&matches)
            .map_err(|e| CountsError::Config(e.to_string()))?;

        let file = match (&settings.config, default_config) {
            (Some(explicit), _) => ConfigFile::load_from(explicit)?,
            (None, Some(default)) if default.exists() => ConfigFile::load_from(&default)?,
            _ => ConfigFile::default(),
        };
        settings.merge_config(file, &matches);

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Fill every field not set on the command line from `file`.
    fn merge_config(&mut self, file: ConfigFile, matches: &clap::ArgMatches) {
        if !is_arg_explicitly_set(matches, "input_dir") && file.input_dir.is_some() {
            self.input_dir = file.input_dir;
        }
        if !is_arg_explicitly_set(matches, "output_dir") && file.output_dir.is_some() {
            self.output_dir = file.output_dir;
        }
        if !is_arg_explicitly_set(matches, "format") {
            if let Some(v) = file.format {
                self.format = v;
            }
        }
        if !is_arg_explicitly_set(matches, "events") {
            if let Some(v) = file.events {
                self.events = v;
            }
        }
        if !is_arg_explicitly_set(matches, "markers") {
            if let Some(v) = file.markers {
                self.markers = v;
            }
        }
        if !is_arg_explicitly_set(matches, "z_threshold") {
            if let Some(v) = file.z_threshold {
                self.z_threshold = v;
            }
        }
        if !is_arg_explicitly_set(matches, "workers") && file.workers.is_some() {
            self.workers = file.workers;
        }
        if !is_arg_explicitly_set(matches, "extension") && file.extension.is_some() {
            self.extension = file.extension;
        }
        if !is_arg_explicitly_set(matches, "log_level") {
            if let Some(v) = file.log_level {
                self.log_level = v;
            }
        }
        if !is_arg_explicitly_set(matches, "log_file") && file.log_file.is_some() {
            self.log_file = file.log_file;
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.input_dir.is_none() {
            return Err(CountsError::Config("input directory is not set".into()));
        }
        if self.output_dir.is_none() {
            return Err(CountsError::Config("output directory is not set".into()));
        }
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(CountsError::Config(format!(
                "z threshold must be a positive number, got {}",
                self.z_threshold
            )));
        }
        if self.workers == Some(0) {
            return Err(CountsError::Config("worker count must be at least 1".into()));
        }
        if self.markers.iter().any(|m| m.is_empty()) {
            return Err(CountsError::Config("markers must not be empty".into()));
        }
        Ok(())
    }

    /// Marker list in configured order: raw markers when given, otherwise the
    /// markers of the selected event classes, otherwise association success.
    pub fn resolved_markers(&self) -> Vec<String> {
        let mut markers: Vec<String> = if !self.markers.is_empty() {
            self.markers.clone()
        } else if !self.events.is_empty() {
            self.events.iter().map(|e| e.marker().to_string()).collect()
        } else {
            vec![EventClass::AssociationSuccess.marker().to_string()]
        };

        let mut seen = std::collections::HashSet::new();
        markers.retain(|m| seen.insert(m.clone()));
        markers
    }

    /// Options handed to the per-file pipeline.
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            markers: self.resolved_markers(),
            format: self.format,
            z_threshold: self.z_threshold,
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
