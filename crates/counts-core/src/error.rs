use std::path::PathBuf;
use thiserror::Error;

/// All file-level errors produced by the counts pipeline.
#[derive(Error, Debug)]
pub enum CountsError {
    /// An input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file yielded no events, so there is no device population to filter.
    #[error("No events parsed from {0}")]
    EmptyPopulation(String),

    /// The reference date could not be derived from a file name.
    #[error("Invalid file name {0}: expected a MM-DD-YYYY suffix")]
    InvalidFileName(String),

    /// The expected input directory does not exist.
    #[error("Input path not found: {0}")]
    InputPathNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON config document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Two or more inputs in one run map to the same counts file.
    #[error("Output collision: {inputs} input files map to {path}")]
    OutputCollision { path: PathBuf, inputs: usize },

    /// A run finished with at least one failed file.
    #[error("{failed} of {total} files failed to transform")]
    FilesFailed { failed: usize, total: usize },
}

/// Reasons a single selected log line is excluded from the event sequence.
///
/// These never abort a file; the pipeline counts them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineParseError {
    /// The line is shorter than the fixed-width timestamp prefix.
    #[error("line too short for timestamp prefix")]
    Truncated,

    /// The syslog month abbreviation is not one of the twelve known names.
    #[error("unknown month name: {0}")]
    UnknownMonth(String),

    /// The time-of-day segment is not a valid `HH:MM:SS`.
    #[error("invalid time of day: {0}")]
    InvalidTime(String),

    /// Day and month do not form a real calendar date.
    #[error("invalid calendar date: {0}")]
    InvalidDate(String),

    /// No MAC address was found in the payload.
    #[error("no device id in payload")]
    MissingDeviceId,
}

impl LineParseError {
    /// Short stable label used as a counter key in parse statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Truncated => "truncated",
            Self::UnknownMonth(_) => "unknown_month",
            Self::InvalidTime(_) => "invalid_time",
            Self::InvalidDate(_) => "invalid_date",
            Self::MissingDeviceId => "missing_device_id",
        }
    }
}

/// Convenience alias used throughout the counts crates.
pub type Result<T> = std::result::Result<T, CountsError>;
