use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::LineParseError;
use crate::models::{TimestampFormat, PAYLOAD_START_CHARS, TIMESTAMP_PREFIX_CHARS};

// ── Month table ───────────────────────────────────────────────────────────────

/// Syslog month abbreviations in calendar order.
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Map a three-letter month abbreviation to `1..=12`.
///
/// Matching is exact (`"Mar"`, not `"MAR"` or `"March"`).
pub fn month_from_abbrev(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|idx| idx as u32 + 1)
}

// ── Line splitting ────────────────────────────────────────────────────────────

/// Split a raw line into its fixed-width timestamp prefix and its payload.
///
/// Widths are counted in characters, not bytes. The payload starts one
/// character after the prefix and has any trailing `\n` / `\r` removed.
pub fn split_prefix(line: &str) -> Result<(&str, &str), LineParseError> {
    let prefix_end = byte_offset_of_char(line, TIMESTAMP_PREFIX_CHARS)
        .ok_or(LineParseError::Truncated)?;
    let payload_start = byte_offset_of_char(line, PAYLOAD_START_CHARS).unwrap_or(line.len());

    let prefix = &line[..prefix_end];
    let payload = line[payload_start..].trim_end_matches(['\n', '\r']);
    Ok((prefix, payload))
}

/// Byte offset of the `n`-th character, or `None` if the line is shorter.
fn byte_offset_of_char(line: &str, n: usize) -> Option<usize> {
    if n == 0 {
        return Some(0);
    }
    line.char_indices()
        .map(|(idx, ch)| idx + ch.len_utf8())
        .nth(n - 1)
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse an `HH:MM:SS` time-of-day token.
pub fn parse_time_of_day(token: &str) -> Result<NaiveTime, LineParseError> {
    NaiveTime::parse_from_str(token, "%H:%M:%S")
        .map_err(|_| LineParseError::InvalidTime(token.to_string()))
}

/// Build a full timestamp from a line's 15-character prefix.
///
/// * [`TimestampFormat::NumericPrefix`] uses only the trailing time of day;
///   the calendar day is `reference`.
/// * [`TimestampFormat::Syslog`] takes month, day and time from the prefix and
///   the year from `reference`. The day may be space-padded.
pub fn parse_timestamp(
    prefix: &str,
    format: TimestampFormat,
    reference: NaiveDate,
) -> Result<NaiveDateTime, LineParseError> {
    let mut tokens = prefix.split_whitespace();

    match format {
        TimestampFormat::NumericPrefix => {
            let time_token = tokens.last().unwrap_or("");
            let time = parse_time_of_day(time_token)?;
            Ok(reference.and_time(time))
        }
        TimestampFormat::Syslog => {
            let month_name = tokens.next().unwrap_or("");
            let day_token = tokens.next().unwrap_or("");
            let time_token = tokens.next().unwrap_or("");

            let month = month_from_abbrev(month_name)
                .ok_or_else(|| LineParseError::UnknownMonth(month_name.to_string()))?;
            let date = day_token
                .parse::<u32>()
                .ok()
                .and_then(|day| NaiveDate::from_ymd_opt(reference.year(), month, day))
                .ok_or_else(|| {
                    LineParseError::InvalidDate(format!("{} {}", month_name, day_token))
                })?;
            let time = parse_time_of_day(time_token)?;
            Ok(date.and_time(time))
        }
    }
}

// ── Reference dates ───────────────────────────────────────────────────────────

/// Derive the reference date from a log file name ending in `MM-DD-YYYY`.
///
/// The date is read from the last ten characters of the file stem, so
/// `wlan-03-15-2022.log` yields 2022-03-15.
pub fn reference_date_from_file_name(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let start = stem.len().checked_sub(10)?;
    let suffix = stem.get(start..)?;
    NaiveDate::parse_from_str(suffix, "%m-%d-%Y").ok()
}

/// The reference day at `hour:00:00`.
pub fn hour_bucket(reference: NaiveDate, hour: u32) -> Option<NaiveDateTime> {
    reference.and_hms_opt(hour, 0, 0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
