use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default z-score magnitude above which a device is treated as an outlier.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.5;

/// Width of the timestamp region at the start of every log line.
pub const TIMESTAMP_PREFIX_CHARS: usize = 15;

/// Character index at which the payload starts (prefix plus one separator).
pub const PAYLOAD_START_CHARS: usize = 16;

/// Which of the two historical log generations a file belongs to.
///
/// Selected by configuration, never sniffed from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampFormat {
    /// `<ignored> <ignored> HH:MM:SS`; the calendar day comes from the caller.
    #[default]
    NumericPrefix,
    /// `Mon D HH:MM:SS`; only the year comes from the caller.
    Syslog,
}

impl std::fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NumericPrefix => write!(f, "numeric-prefix"),
            Self::Syslog => write!(f, "syslog"),
        }
    }
}

/// Named event-code classes found in the controller logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EventClass {
    AssociationRequest,
    AssociationSuccess,
    AuthSuccess,
    #[value(name = "deauth-1")]
    #[serde(rename = "deauth-1")]
    Deauth1,
    #[value(name = "deauth-2")]
    #[serde(rename = "deauth-2")]
    Deauth2,
    #[value(name = "deauth-3")]
    #[serde(rename = "deauth-3")]
    Deauth3,
}

impl EventClass {
    /// The literal marker substring identifying this class in a log line.
    pub fn marker(self) -> &'static str {
        match self {
            Self::AssociationRequest => "<501095>",
            Self::AssociationSuccess => "<501100>",
            Self::AuthSuccess => "<501093>",
            Self::Deauth1 => "<501080>",
            Self::Deauth2 => "<501105>",
            Self::Deauth3 => "<501106>",
        }
    }
}

/// One selected and parsed log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Local wall-clock time of the line; no timezone is attached.
    pub timestamp: NaiveDateTime,
    /// Lower-cased MAC address, the first one found in the payload.
    pub device_id: String,
    /// Line content after the timestamp prefix, newline stripped.
    pub payload: String,
}

/// One `(location, hour)` bucket of the per-file output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    /// Reference day at the bucket's hour, minutes and seconds zeroed.
    pub timestamp: NaiveDateTime,
    pub count: u64,
    /// Four-character building code, `None` when no pattern matched.
    pub location: Option<String>,
}

/// Options for one run of the per-file transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    /// Marker substrings; a line is selected when it contains any of them.
    pub markers: Vec<String>,
    pub format: TimestampFormat,
    pub z_threshold: f64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            markers: vec![EventClass::AssociationSuccess.marker().to_string()],
            format: TimestampFormat::default(),
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}
