//! Conversion of selected log lines into [`Event`]s.
//!
//! Each line is split into its fixed-width timestamp prefix and payload, the
//! timestamp is built against the caller's reference date, and the first MAC
//! address in the payload becomes the device id. Lines that fail any step are
//! skipped and counted; they never abort the file.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use counts_core::error::LineParseError;
use counts_core::models::{Event, TimestampFormat};
use counts_core::time_utils::{parse_timestamp, split_prefix};
use regex::Regex;
use tracing::debug;

/// Six colon-separated hex byte pairs.
pub(crate) const MAC_PATTERN: &str = r"[0-9a-f]{2}(?::[0-9a-f]{2}){5}";

fn mac_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("(?i){MAC_PATTERN}")).expect("regex is valid"))
}

/// First MAC address in `payload`, left to right, as written.
pub fn extract_device_id(payload: &str) -> Option<&str> {
    mac_regex().find(payload).map(|m| m.as_str())
}

// ── ParseStats ────────────────────────────────────────────────────────────────

/// Per-file line counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Every line seen in the input.
    pub lines_read: u64,
    /// Lines containing at least one marker.
    pub lines_selected: u64,
    /// Selected lines that became events.
    pub events_parsed: u64,
    /// Selected lines dropped, keyed by [`LineParseError::kind`].
    pub skipped: BTreeMap<&'static str, u64>,
}

impl ParseStats {
    pub fn record_skip(&mut self, err: &LineParseError) {
        *self.skipped.entry(err.kind()).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }
}

// ── RecordParser ──────────────────────────────────────────────────────────────

/// Parses selected lines for one file.
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    format: TimestampFormat,
    reference: NaiveDate,
}

impl RecordParser {
    pub fn new(format: TimestampFormat, reference: NaiveDate) -> Self {
        Self { format, reference }
    }

    /// Parse one selected line.
    pub fn parse_line(&self, line: &str) -> Result<Event, LineParseError> {
        let (prefix, payload) = split_prefix(line)?;
        let timestamp = parse_timestamp(prefix, self.format, self.reference)?;
        let device_id = extract_device_id(payload)
            .ok_or(LineParseError::MissingDeviceId)?
            .to_ascii_lowercase();

        Ok(Event {
            timestamp,
            device_id,
            payload: payload.to_string(),
        })
    }

    /// Parse every line of `selected` in order, recording outcomes in `stats`.
    pub fn parse_selected<I, S>(&self, selected: I, stats: &mut ParseStats) -> Vec<Event>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut events = Vec::new();
        for line in selected {
            stats.lines_selected += 1;
            match self.parse_line(line.as_ref()) {
                Ok(event) => {
                    stats.events_parsed += 1;
                    events.push(event);
                }
                Err(err) => {
                    debug!("Skipping line: {}", err);
                    stats.record_skip(&err);
                }
            }
        }
        events
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
