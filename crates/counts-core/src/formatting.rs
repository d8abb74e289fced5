use chrono::NaiveDateTime;

use crate::models::AggregateRecord;

/// Column header of every emitted counts table.
pub const CSV_HEADER: &str = "timestamp,count,building";

/// Render a bucket timestamp as `YYYY-MM-DD HH:MM:SS`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use counts_core::formatting::format_bucket_timestamp;
///
/// let ts = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// assert_eq!(format_bucket_timestamp(ts), "2022-03-15 09:00:00");
/// ```
pub fn format_bucket_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One CSV data row (no trailing newline). An absent building is an empty
/// field.
pub fn format_csv_row(record: &AggregateRecord) -> String {
    format!(
        "{},{},{}",
        format_bucket_timestamp(record.timestamp),
        record.count,
        escape_csv_field(record.location.as_deref().unwrap_or("")),
    )
}

/// Render a full table: header line followed by one line per record, each
/// terminated by `\n`.
pub fn render_csv(records: &[AggregateRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&format_csv_row(record));
        out.push('\n');
    }
    out
}
